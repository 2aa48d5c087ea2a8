//! From trait implementations for ParleyError conversions

use super::types::ParleyError;

impl From<std::io::Error> for ParleyError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<serde_yaml::Error> for ParleyError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Json {
            message: error.to_string(),
            context: Some("YAML".to_string()),
        }
    }
}

impl From<reqwest::Error> for ParleyError {
    fn from(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16());
        let url = error.url().map(|u| u.to_string());
        Self::Http {
            message: error.to_string(),
            url,
            status_code,
            context: None,
        }
    }
}
