//! Tracing subscriber setup for host applications.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ClinicConfig;

pub const DEFAULT_FILTER: &str = "clinic_core=info";

/// `EnvFilter` for `filter`; empty falls back to `RUST_LOG`, then
/// [`DEFAULT_FILTER`]. Invalid directives also fall back to the default.
pub fn build_filter(filter: &str) -> EnvFilter {
    if filter.trim().is_empty() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    } else {
        EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install a global fmt subscriber. Returns `false` if a subscriber was
/// already set.
pub fn init(filter: &str, json: bool) -> bool {
    let filter = build_filter(filter);

    let installed = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    installed.is_ok()
}

/// [`init`] with the `log_filter` and `log_json` settings.
pub fn init_from_config(config: &ClinicConfig) -> bool {
    init(&config.log_filter, config.log_json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_refused() {
        init("clinic_core=debug", false);
        assert!(!init("", true));
    }

    #[test]
    fn test_filter_follows_config() {
        let mut config = ClinicConfig::from_toml_str("log_filter = \"clinic_core=warn\"").unwrap();
        assert_eq!(build_filter(&config.log_filter).to_string(), "clinic_core=warn");

        config
            .apply_overrides(|key| (key == "CLINIC_LOG").then(|| "clinic_core=trace".to_string()))
            .unwrap();
        assert_eq!(build_filter(&config.log_filter).to_string(), "clinic_core=trace");
    }

    #[test]
    fn test_invalid_filter_uses_default() {
        assert_eq!(build_filter("=[").to_string(), DEFAULT_FILTER);
    }
}
