use serde::{Deserialize, Serialize};

use crate::lookup::{NewsArticle, WeatherReport};

// ---------- Request/Response types ----------

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub season: String,
    pub driver: String,
    pub constructor: String,
    pub circuit: String,
    pub quali_pos: i32,
}

#[derive(Debug, Serialize)]
pub struct SweepPoint {
    pub quali_pos: i32,
    pub predicted_position: i32,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predicted_position: i32,
    pub sweep: Vec<SweepPoint>,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub drivers: Vec<String>,
    pub constructors: Vec<String>,
    pub circuits: Vec<String>,
    pub qualifying_positions: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub circuit: String,
}

#[derive(Debug, Serialize)]
pub struct WeatherEnrichment {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<WeatherReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub constructor: String,
}

#[derive(Debug, Serialize)]
pub struct NewsEnrichment {
    pub available: bool,
    pub articles: Vec<NewsArticle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
