//! Read-only enrichment lookups against third-party APIs. Both are a single
//! GET with no retry; every failure mode degrades to `None` ("unavailable")
//! and never reaches the caller as an error.

use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

const WEATHER_ENDPOINT: &str = "http://api.openweathermap.org/data/2.5/weather";
const NEWS_ENDPOINT: &str = "https://newsapi.org/v2/everything";

/// Articles returned per news lookup, at most.
const NEWS_LIMIT: usize = 5;

/// Shared HTTP agent with consistent timeouts.
fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build()
    })
}

// ---------- Provider seam ----------

/// The one seam the form logic depends on: swap this for a stub in tests
/// and the handlers never touch the network.
pub trait LookupProvider: Send + Sync {
    fn fetch_weather(&self, city: &str) -> Option<WeatherReport>;
    fn fetch_news(&self, constructor: &str) -> Option<Vec<NewsArticle>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub condition: String,
    pub description: String,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_mps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: String,
    pub description: Option<String>,
}

// ---------- Wire formats ----------

#[derive(Deserialize)]
struct WeatherResponse {
    weather: Vec<WeatherEntry>,
    main: WeatherMain,
    wind: WeatherWind,
}

#[derive(Deserialize)]
struct WeatherEntry {
    main: String,
    description: String,
}

#[derive(Deserialize)]
struct WeatherMain {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct WeatherWind {
    speed: f64,
}

#[derive(Deserialize)]
struct NewsResponse {
    status: String,
    #[serde(rename = "totalResults")]
    total_results: i64,
    #[serde(default)]
    articles: Vec<NewsEntry>,
}

#[derive(Deserialize)]
struct NewsEntry {
    title: String,
    url: String,
    source: NewsSource,
    #[serde(rename = "publishedAt")]
    published_at: String,
    description: Option<String>,
}

#[derive(Deserialize)]
struct NewsSource {
    name: String,
}

// ---------- HTTP implementation ----------

pub struct HttpLookupProvider {
    weather_endpoint: String,
    news_endpoint: String,
    weather_key: Option<String>,
    news_key: Option<String>,
}

impl HttpLookupProvider {
    pub fn new(weather_key: Option<String>, news_key: Option<String>) -> Self {
        Self::with_endpoints(
            WEATHER_ENDPOINT.to_string(),
            NEWS_ENDPOINT.to_string(),
            weather_key,
            news_key,
        )
    }

    fn with_endpoints(
        weather_endpoint: String,
        news_endpoint: String,
        weather_key: Option<String>,
        news_key: Option<String>,
    ) -> Self {
        Self {
            weather_endpoint,
            news_endpoint,
            weather_key,
            news_key,
        }
    }
}

impl LookupProvider for HttpLookupProvider {
    fn fetch_weather(&self, city: &str) -> Option<WeatherReport> {
        let key = self.weather_key.as_deref()?;
        let response = match agent()
            .get(&self.weather_endpoint)
            .query("q", city)
            .query("appid", key)
            .query("units", "metric")
            .call()
        {
            Ok(response) => response,
            Err(err) => {
                warn!("weather lookup failed for {city}: {err}");
                return None;
            }
        };
        let data: WeatherResponse = match response.into_json() {
            Ok(data) => data,
            Err(err) => {
                warn!("weather payload malformed for {city}: {err}");
                return None;
            }
        };
        let entry = data.weather.into_iter().next()?;
        Some(WeatherReport {
            condition: entry.main,
            description: entry.description,
            temperature_c: data.main.temp,
            humidity_pct: data.main.humidity,
            wind_speed_mps: data.wind.speed,
        })
    }

    fn fetch_news(&self, constructor: &str) -> Option<Vec<NewsArticle>> {
        let key = self.news_key.as_deref()?;
        let query = format!("F1 {constructor} standings");
        let response = match agent()
            .get(&self.news_endpoint)
            .query("q", &query)
            .query("sortBy", "publishedAt")
            .query("language", "en")
            .query("apiKey", key)
            .call()
        {
            Ok(response) => response,
            Err(err) => {
                warn!("news lookup failed for {constructor}: {err}");
                return None;
            }
        };
        let data: NewsResponse = match response.into_json() {
            Ok(data) => data,
            Err(err) => {
                warn!("news payload malformed for {constructor}: {err}");
                return None;
            }
        };
        if data.status != "ok" || data.total_results <= 0 {
            return None;
        }
        let articles: Vec<NewsArticle> = data
            .articles
            .into_iter()
            .take(NEWS_LIMIT)
            .map(|a| NewsArticle {
                title: a.title,
                url: a.url,
                source: a.source.name,
                published_at: a.published_at,
                description: a.description,
            })
            .collect();
        if articles.is_empty() {
            return None;
        }
        Some(articles)
    }
}

// ---------- Circuit -> host city ----------

/// Host city used for the weather lookup. Circuits without an entry get the
/// "unavailable for this Grand Prix" outcome and no request is issued.
pub fn host_city(circuit: &str) -> Option<&'static str> {
    let city = match circuit {
        "Monaco Grand Prix" => "Monaco",
        "British Grand Prix" => "Silverstone",
        "Italian Grand Prix" => "Monza",
        "Canadian Grand Prix" => "Montreal",
        "Japanese Grand Prix" => "Suzuka",
        "United States Grand Prix" => "Austin",
        "Abu Dhabi Grand Prix" => "Abu Dhabi",
        "Australian Grand Prix" => "Melbourne",
        "Circuit Paul Ricard" => "Le Castellet",
        "Hungarian Grand Prix" => "Budapest",
        "Belgian Grand Prix" => "Spa-Francorchamps",
        "Singapore Grand Prix" => "Singapore",
        "Brazilian Grand Prix" => "São Paulo",
        "Saudi Arabian Grand Prix" => "Jeddah",
        "Qatar Grand Prix" => "Lusail",
        "Austrian Grand Prix" => "Spielberg",
        "French Grand Prix" => "Le Castellet",
        "Dutch Grand Prix" => "Zandvoort",
        _ => return None,
    };
    Some(city)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn serve_once(body: &str, status_line: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}")
    }

    fn provider_at(weather_url: String, news_url: String) -> HttpLookupProvider {
        HttpLookupProvider::with_endpoints(
            weather_url,
            news_url,
            Some("test-key".to_string()),
            Some("test-key".to_string()),
        )
    }

    #[test]
    fn weather_success_extracts_the_consumed_fields() {
        let body = r#"{
            "weather": [{"main": "Clouds", "description": "scattered clouds"}],
            "main": {"temp": 21.4, "humidity": 64},
            "wind": {"speed": 3.2}
        }"#;
        let url = serve_once(body, "HTTP/1.1 200 OK");
        let provider = provider_at(url, "http://unused.invalid".to_string());
        let report = provider.fetch_weather("Monaco").unwrap();
        assert_eq!(
            report,
            WeatherReport {
                condition: "Clouds".to_string(),
                description: "scattered clouds".to_string(),
                temperature_c: 21.4,
                humidity_pct: 64.0,
                wind_speed_mps: 3.2,
            }
        );
    }

    #[test]
    fn weather_non_200_degrades_to_none() {
        let url = serve_once(r#"{"cod":"404","message":"city not found"}"#, "HTTP/1.1 404 Not Found");
        let provider = provider_at(url, "http://unused.invalid".to_string());
        assert_eq!(provider.fetch_weather("Atlantis"), None);
    }

    #[test]
    fn weather_malformed_payload_degrades_to_none() {
        let url = serve_once(r#"{"weather": "oops"}"#, "HTTP/1.1 200 OK");
        let provider = provider_at(url, "http://unused.invalid".to_string());
        assert_eq!(provider.fetch_weather("Monaco"), None);
    }

    #[test]
    fn weather_without_an_api_key_is_unavailable() {
        let provider = HttpLookupProvider::with_endpoints(
            "http://unused.invalid".to_string(),
            "http://unused.invalid".to_string(),
            None,
            None,
        );
        // No key: no request is made at all, the endpoint being unreachable
        // would otherwise hang the test.
        assert_eq!(provider.fetch_weather("Monaco"), None);
        assert_eq!(provider.fetch_news("Ferrari"), None);
    }

    #[test]
    fn news_success_keeps_at_most_five_articles() {
        let articles: Vec<String> = (0..7)
            .map(|i| {
                format!(
                    r#"{{"title":"headline {i}","url":"https://example.com/{i}","source":{{"name":"Example"}},"publishedAt":"2023-05-0{}T00:00:00Z","description":"d{i}"}}"#,
                    i + 1
                )
            })
            .collect();
        let body = format!(
            r#"{{"status":"ok","totalResults":7,"articles":[{}]}}"#,
            articles.join(",")
        );
        let url = serve_once(&body, "HTTP/1.1 200 OK");
        let provider = provider_at("http://unused.invalid".to_string(), url);
        let news = provider.fetch_news("Ferrari").unwrap();
        assert_eq!(news.len(), 5);
        assert_eq!(news[0].title, "headline 0");
        assert_eq!(news[0].source, "Example");
    }

    #[test]
    fn news_zero_results_degrades_to_none() {
        let body = r#"{"status":"ok","totalResults":0,"articles":[]}"#;
        let url = serve_once(body, "HTTP/1.1 200 OK");
        let provider = provider_at("http://unused.invalid".to_string(), url);
        assert_eq!(provider.fetch_news("Ferrari"), None);
    }

    #[test]
    fn news_error_status_degrades_to_none() {
        let body = r#"{"status":"error","totalResults":0,"code":"apiKeyInvalid"}"#;
        let url = serve_once(body, "HTTP/1.1 200 OK");
        let provider = provider_at("http://unused.invalid".to_string(), url);
        assert_eq!(provider.fetch_news("Ferrari"), None);
    }

    #[test]
    fn monaco_maps_to_monaco() {
        assert_eq!(host_city("Monaco Grand Prix"), Some("Monaco"));
        assert_eq!(host_city("British Grand Prix"), Some("Silverstone"));
    }

    #[test]
    fn unmapped_circuits_have_no_city() {
        assert_eq!(host_city("Miami Grand Prix"), None);
        assert_eq!(host_city("Spanish Grand Prix"), None);
    }
}
