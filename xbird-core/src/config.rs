use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/Qwen/Qwen2.5-72B-Instruct";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub client: ClientConfig,
    pub popup: PopupConfig,
    pub storage: StorageConfig,
}

/// Feed scanning behaviour and the selector strategies used against the host markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub min_view_count: u64,
    pub processed_capacity: usize,
    pub debounce_ms: u64,
    pub settle_ms: u64,
    /// Phrase marker identifying the views entry in a metrics label.
    pub view_marker: String,
    /// Tried in order; the first selector with any match wins.
    pub post_selectors: Vec<String>,
    pub metrics_selectors: Vec<String>,
    pub permalink_selectors: Vec<String>,
    pub metrics_attribute: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_view_count: 500,
            processed_capacity: 1000,
            debounce_ms: 500,
            settle_ms: 1000,
            view_marker: "views".to_string(),
            post_selectors: vec![
                r#"article[data-testid="tweet"], article[role="article"]"#.to_string(),
                "article".to_string(),
            ],
            metrics_selectors: vec![
                r#"[role="group"][aria-label*="view"], [aria-label*="reply"], [aria-label*="repost"], [aria-label*="like"]"#
                    .to_string(),
                r#"[aria-label*="view"]"#.to_string(),
            ],
            permalink_selectors: vec![r#"a[href*="/status/"]"#.to_string()],
            metrics_attribute: "aria-label".to_string(),
        }
    }
}

impl ScanConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_base_ms: u64,
    pub max_reply_chars: usize,
    pub max_new_tokens: u32,
    pub temperature: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 15,
            max_attempts: 3,
            retry_base_ms: 1000,
            max_reply_chars: 280,
            max_new_tokens: 100,
            temperature: 0.7,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    pub copy_success_ms: u64,
    pub copy_error_ms: u64,
    pub composer_cooldown_ms: u64,
    pub composer_base_url: String,
    pub default_intensity: u8,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            copy_success_ms: 3000,
            copy_error_ms: 2000,
            composer_cooldown_ms: 3000,
            composer_base_url: "https://x.com/intent/post".to_string(),
            default_intensity: 69,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://xbird.db?mode=rwc".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            std::io::ErrorKind::PermissionDenied => ConfigError::PermissionDenied {
                path: path.display().to_string(),
            },
            _ => ConfigError::InvalidValue {
                field: "path".to_string(),
                value: format!("{}: {e}", path.display()),
            },
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.processed_capacity < 2 {
            return Err(ConfigError::InvalidValue {
                field: "scan.processed_capacity".to_string(),
                value: self.scan.processed_capacity.to_string(),
            });
        }
        if self.client.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.max_attempts".to_string(),
                value: "0".to_string(),
            });
        }
        if self.client.max_reply_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.max_reply_chars".to_string(),
                value: "0".to_string(),
            });
        }
        for (field, chain) in [
            ("scan.post_selectors", &self.scan.post_selectors),
            ("scan.metrics_selectors", &self.scan.metrics_selectors),
            ("scan.permalink_selectors", &self.scan.permalink_selectors),
        ] {
            if chain.iter().all(|selector| selector.trim().is_empty()) {
                return Err(ConfigError::ValidationFailed {
                    reason: format!("{field} must contain at least one selector"),
                });
            }
        }
        if self.scan.view_marker.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "scan.view_marker must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_extension_constants() {
        let config = AppConfig::default();
        assert_eq!(config.scan.min_view_count, 500);
        assert_eq!(config.scan.processed_capacity, 1000);
        assert_eq!(config.scan.debounce(), Duration::from_millis(500));
        assert_eq!(config.scan.settle_delay(), Duration::from_millis(1000));
        assert_eq!(config.client.timeout(), Duration::from_secs(15));
        assert_eq!(config.client.max_attempts, 3);
        assert_eq!(config.client.max_reply_chars, 280);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [scan]
            min_view_count = 2000
            post_selectors = ["div.post"]

            [client]
            endpoint = "http://localhost:9000/generate"
            "#,
        )
        .unwrap();

        assert_eq!(config.scan.min_view_count, 2000);
        assert_eq!(config.scan.post_selectors, vec!["div.post".to_string()]);
        assert_eq!(config.scan.processed_capacity, 1000);
        assert_eq!(config.client.endpoint, "http://localhost:9000/generate");
        assert_eq!(config.client.timeout_secs, 15);
    }

    #[test]
    fn test_validation_rejects_empty_chains() {
        let result = AppConfig::from_toml(
            r#"
            [scan]
            metrics_selectors = []
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));

        let result = AppConfig::from_toml("[client]\nmax_attempts = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = AppConfig::load("/definitely/not/here/xbird.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let result = AppConfig::from_toml("[scan\nmin_view_count = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
