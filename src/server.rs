use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use crate::artifact::Artifact;
use crate::error::PredictError;
use crate::features::FeatureRecord;
use crate::lookup::{self, LookupProvider};
use crate::model::{self, QUALI_POSITIONS};
use crate::types::{
    NewsEnrichment, NewsQuery, OptionsResponse, PredictRequest, PredictResponse, SweepPoint,
    WeatherEnrichment, WeatherQuery,
};

// User-visible degradation strings. Kept literal; the page shows them as-is.
pub const MSG_MISSING_FIELDS: &str = "Please fill out all required fields.";
pub const MSG_SEASON_NOT_NUMERIC: &str = "Season must be a number.";
pub const MSG_WEATHER_UNAVAILABLE: &str = "Weather data not available.";
pub const MSG_WEATHER_NO_CITY: &str = "Weather data is unavailable for this Grand Prix.";
pub const MSG_NO_NEWS: &str = "No recent news articles found for this constructor.";

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub artifact: Arc<Artifact>,
    pub lookups: Arc<dyn LookupProvider>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/options", get(options))
        .route("/api/predict", post(predict))
        .route("/api/weather", get(weather))
        .route("/api/news", get(news))
        .with_state(state)
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn unprocessable(message: &str) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": message })),
    )
}

// ---------- Handlers ----------

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

pub async fn options(State(state): State<AppState>) -> Json<OptionsResponse> {
    let artifact = &state.artifact;
    Json(OptionsResponse {
        drivers: artifact.driver_options(),
        constructors: artifact.constructor_options(),
        circuits: artifact.circuit_options(),
        qualifying_positions: QUALI_POSITIONS.collect(),
    })
}

pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let season = request.season.trim();
    if season.is_empty()
        || request.driver.trim().is_empty()
        || request.constructor.trim().is_empty()
        || request.circuit.trim().is_empty()
    {
        return Err(unprocessable(MSG_MISSING_FIELDS));
    }
    let season: f64 = season
        .parse()
        .map_err(|_| unprocessable(MSG_SEASON_NOT_NUMERIC))?;
    if !QUALI_POSITIONS.contains(&request.quali_pos) {
        return Err(unprocessable(
            &PredictError::QualifyingRange(request.quali_pos).to_string(),
        ));
    }

    let record = resolve_record(&state.artifact, &request, season)
        .map_err(|err| unprocessable(&err.to_string()))?;

    let artifact = &state.artifact;
    let features = record
        .ordered(&artifact.feature_names)
        .map_err(|err| unprocessable(&err.to_string()))?;
    let predicted_position = artifact
        .predictor
        .predict_position(&features)
        .map_err(|err| unprocessable(&err.to_string()))?;
    let sweep = model::sweep(&artifact.predictor, &artifact.feature_names, record)
        .map_err(|err| unprocessable(&err.to_string()))?;

    info!(
        "predict driver={:?} constructor={:?} circuit={:?} quali={} season={} -> {}",
        request.driver, request.constructor, request.circuit, request.quali_pos, season,
        predicted_position
    );

    Ok(Json(PredictResponse {
        predicted_position,
        sweep: sweep
            .into_iter()
            .map(|(quali_pos, predicted_position)| SweepPoint {
                quali_pos,
                predicted_position,
            })
            .collect(),
    }))
}

pub async fn weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Json<WeatherEnrichment> {
    let Some(city) = lookup::host_city(&query.circuit) else {
        return Json(WeatherEnrichment {
            available: false,
            city: None,
            report: None,
            message: Some(MSG_WEATHER_NO_CITY.to_string()),
        });
    };

    let lookups = state.lookups.clone();
    let city_owned = city.to_string();
    let report = tokio::task::spawn_blocking(move || lookups.fetch_weather(&city_owned))
        .await
        .unwrap_or(None);

    Json(match report {
        Some(report) => WeatherEnrichment {
            available: true,
            city: Some(city.to_string()),
            report: Some(report),
            message: None,
        },
        None => WeatherEnrichment {
            available: false,
            city: Some(city.to_string()),
            report: None,
            message: Some(MSG_WEATHER_UNAVAILABLE.to_string()),
        },
    })
}

pub async fn news(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Json<NewsEnrichment> {
    let lookups = state.lookups.clone();
    let constructor = query.constructor.clone();
    let articles = tokio::task::spawn_blocking(move || lookups.fetch_news(&constructor))
        .await
        .unwrap_or(None);

    Json(match articles {
        Some(articles) if !articles.is_empty() => NewsEnrichment {
            available: true,
            articles,
            message: None,
        },
        _ => NewsEnrichment {
            available: false,
            articles: Vec::new(),
            message: Some(MSG_NO_NEWS.to_string()),
        },
    })
}

// ---------- Request resolution ----------

/// Encode labels and look up statistics; the resolved record is what the
/// model consumes. Every dropdown label round-trips here by construction,
/// so failures mean the request did not come from the served form.
fn resolve_record(
    artifact: &Artifact,
    request: &PredictRequest,
    season: f64,
) -> Result<FeatureRecord, PredictError> {
    let driver = artifact
        .drivers
        .encode(request.driver.trim())
        .ok_or_else(|| PredictError::UnknownLabel {
            kind: "driver",
            label: request.driver.trim().to_string(),
        })?;
    let constructor = artifact
        .constructors
        .encode(request.constructor.trim())
        .ok_or_else(|| PredictError::UnknownLabel {
            kind: "constructor",
            label: request.constructor.trim().to_string(),
        })?;
    let circuit = artifact
        .circuits
        .encode(request.circuit.trim())
        .ok_or_else(|| PredictError::UnknownLabel {
            kind: "circuit",
            label: request.circuit.trim().to_string(),
        })?;

    // Drivers/constructors outside the statistics tables are not offered by
    // the form; an API caller naming one gets the unknown-label outcome.
    let driver_confidence = artifact
        .driver_confidence
        .get(&driver)
        .copied()
        .ok_or_else(|| PredictError::UnknownLabel {
            kind: "driver",
            label: request.driver.trim().to_string(),
        })?;
    let constructor_reliability = artifact
        .constructor_reliability
        .get(&constructor)
        .copied()
        .ok_or_else(|| PredictError::UnknownLabel {
            kind: "constructor",
            label: request.constructor.trim().to_string(),
        })?;

    Ok(FeatureRecord {
        circuit: f64::from(circuit),
        quali_pos: f64::from(request.quali_pos),
        constructor: f64::from(constructor),
        driver: f64::from(driver),
        driver_confidence,
        constructor_reliability,
        season,
    })
}
