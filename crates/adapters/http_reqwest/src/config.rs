//! HTTP service configuration.

use std::time::Duration;

use serde::Deserialize;

/// Where the servlet lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpServiceConfig {
    /// Base URL of the database servlet. Action names are appended to it.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/sensorDb/servlet/db/".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpServiceConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = HttpServiceConfig::default();
        assert_eq!(
            config.base_url,
            "http://localhost:8080/sensorDb/servlet/db/"
        );
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            base_url = "https://sensors.example.org/db"
            timeout_secs = 5
        "#;
        let config: HttpServiceConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.base_url, "https://sensors.example.org/db");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let config: HttpServiceConfig = toml::from_str("timeout_secs = 2").unwrap();
        assert_eq!(config.timeout_secs, 2);
        assert_eq!(config.base_url, HttpServiceConfig::default().base_url);
    }
}
