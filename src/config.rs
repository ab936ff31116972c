/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub artifact_path: String,
    pub openweather_api_key: Option<String>,
    pub newsapi_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);
        let artifact_path = std::env::var("ARTIFACT_PATH")
            .unwrap_or_else(|_| "artifacts/model.json".to_string());
        Self {
            port,
            artifact_path,
            openweather_api_key: non_empty(std::env::var("OPENWEATHER_API_KEY").ok()),
            newsapi_key: non_empty(std::env::var("NEWSAPI_KEY").ok()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keys_are_treated_as_absent() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some("k".to_string())), Some("k".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
