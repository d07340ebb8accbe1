//! Configuration loaded from TOML with environment overrides.
//!
//! Recognized variables: `CLINIC_DATABASE_PATH`, `CLINIC_ATTACHMENTS_DIR`,
//! `CLINIC_WEBHOOK_URL`, `CLINIC_LOG`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::logging::DEFAULT_FILTER;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    pub database_path: PathBuf,
    pub attachments_dir: PathBuf,
    /// Minimum time a table load takes, so spinners do not flash
    pub min_loading_delay_ms: u64,
    pub page_size: usize,
    pub item_cache_ttl_secs: u64,
    pub log_filter: String,
    pub log_json: bool,
    pub webhook: Option<WebhookConfig>,
    pub accounting: Option<AccountingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingConfig {
    pub base_url: String,
    pub token: String,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("clinic.db"),
            attachments_dir: PathBuf::from("attachments"),
            min_loading_delay_ms: 800,
            page_size: 10,
            item_cache_ttl_secs: 300,
            log_filter: DEFAULT_FILTER.to_string(),
            log_json: false,
            webhook: None,
            accounting: None,
        }
    }
}

impl ClinicConfig {
    /// Read `path`, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (the process environment in [`load`](Self::load)).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(path) = lookup("CLINIC_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("CLINIC_ATTACHMENTS_DIR") {
            self.attachments_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("CLINIC_WEBHOOK_URL") {
            match self.webhook.as_mut() {
                Some(webhook) => webhook.url = url,
                None => {
                    self.webhook = Some(WebhookConfig {
                        url,
                        timeout_secs: default_timeout_secs(),
                    })
                }
            }
        }
        if let Some(filter) = lookup("CLINIC_LOG") {
            self.log_filter = filter;
        }
        self.validate().context("invalid configuration after environment overrides")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        if let Some(webhook) = &self.webhook {
            if !(webhook.url.starts_with("http://") || webhook.url.starts_with("https://")) {
                bail!("webhook url must be http(s): {}", webhook.url);
            }
        }
        Ok(())
    }

    pub fn min_loading_delay(&self) -> Duration {
        Duration::from_millis(self.min_loading_delay_ms)
    }

    pub fn item_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.item_cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ClinicConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClinicConfig::default());
        assert_eq!(config.min_loading_delay(), Duration::from_millis(800));
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_parse_sections() {
        let config = ClinicConfig::from_toml_str(
            r#"
            database_path = "/var/lib/clinic/clinic.db"
            page_size = 25

            [webhook]
            url = "https://billing.example.org/hook"

            [accounting]
            base_url = "https://books.example.org/api"
            token = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.webhook.as_ref().unwrap().timeout_secs, 10);
        assert_eq!(config.accounting.unwrap().token, "secret");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CLINIC_DATABASE_PATH", "/tmp/other.db"),
            ("CLINIC_WEBHOOK_URL", "http://localhost:9000/in"),
            ("CLINIC_LOG", "clinic_core=debug"),
        ]
        .into_iter()
        .collect();

        let mut config = ClinicConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.webhook.unwrap().url, "http://localhost:9000/in");
        assert_eq!(config.log_filter, "clinic_core=debug");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ClinicConfig::from_toml_str("page_size = 0").is_err());
        assert!(ClinicConfig::from_toml_str("[webhook]\nurl = \"ftp://x\"").is_err());
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClinicConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("reading config file"));
    }
}
