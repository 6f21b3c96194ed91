use crate::domain::ports::WatchOptions;
use crate::utils::error::{MarinexError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self {
            path: format!("{}/.marinex/session.json", home),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackingConfig {
    /// 每個動畫 tick 游標前進的點數
    pub playback_step: f64,
    pub follow: bool,
    pub live_zoom: f64,
    pub playback_zoom: f64,
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
    pub sample_interval_ms: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            playback_step: 0.5,
            follow: true,
            live_zoom: 15.0,
            playback_zoom: 14.0,
            high_accuracy: true,
            timeout_ms: 10_000,
            maximum_age_ms: 0,
            sample_interval_ms: 1_000,
        }
    }
}

impl TrackingConfig {
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            enable_high_accuracy: self.high_accuracy,
            timeout: Duration::from_millis(self.timeout_ms),
            maximum_age: Duration::from_millis(self.maximum_age_ms),
            sample_interval: Duration::from_millis(self.sample_interval_ms),
        }
    }
}

impl ClientConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 檔案存在就載入，否則使用預設值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            tracing::debug!("Loading configuration from {}", path.as_ref().display());
            Self::from_file(path)
        } else {
            tracing::debug!(
                "No configuration at {}, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MarinexError::ConfigValidation {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MARINEX_API_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MarinexError::Config {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_range("api.timeout_seconds", self.api.timeout_seconds, 1, 600)?;
        validation::validate_path("session.path", &self.session.path)?;
        validation::validate_range(
            "tracking.playback_step",
            self.tracking.playback_step,
            0.01,
            1.0,
        )?;
        validation::validate_range("tracking.live_zoom", self.tracking.live_zoom, 0.0, 22.0)?;
        validation::validate_range(
            "tracking.playback_zoom",
            self.tracking.playback_zoom,
            0.0,
            22.0,
        )?;
        validation::validate_range(
            "tracking.sample_interval_ms",
            self.tracking.sample_interval_ms,
            10,
            3_600_000,
        )?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tracking.playback_step, 0.5);
        assert_eq!(
            config.tracking.watch_options().timeout,
            Duration::from_millis(10_000)
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
[api]
base_url = "https://marinex.example.com/api/"

[tracking]
follow = false
"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://marinex.example.com/api/");
        assert_eq!(config.api.timeout_seconds, 30);
        assert!(!config.tracking.follow);
        assert_eq!(config.tracking.playback_zoom, 14.0);
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("MARINEX_TEST_API_HOST", "api.marinex.test");
        let config = ClientConfig::from_toml_str(
            r#"
[api]
base_url = "https://${MARINEX_TEST_API_HOST}/api/"
"#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://api.marinex.test/api/");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = ClientConfig::from_toml_str(
            r#"
[tracking]
playback_step = 0.0
"#,
        )
        .unwrap();
        assert!(config.validate_config().is_err());

        assert!(ClientConfig::from_toml_str("[api\nbase_url = 1").is_err());
    }
}
