//! Structured logging setup
//!
//! `RUST_LOG` takes precedence over the configured level. Calling
//! `init_logging` more than once is harmless: later calls leave the first
//! subscriber in place.

use crate::utils::toml_config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Install the global tracing subscriber
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let base_subscriber = Registry::default().with(build_env_filter(config));

    let installed = if config.format == "json" {
        base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        base_subscriber
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        let config = LoggingConfig {
            level: "not a level[".to_string(),
            format: "text".to_string(),
        };
        // must not panic on a bad directive
        let _ = build_env_filter(&config);
    }

    #[test]
    fn test_second_init_is_noop() {
        let config = LoggingConfig::default();
        let _ = init_logging(&config);
        assert!(!init_logging(&config));
    }
}
