use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingSettings};

/// `RUST_LOG` wins over the configured filter when set.
pub fn filter_for(settings: &LoggingSettings) -> Result<EnvFilter> {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok(), settings)
}

fn filter_from(env_directive: Option<String>, settings: &LoggingSettings) -> Result<EnvFilter> {
    if let Some(directive) = env_directive
        && let Ok(filter) = EnvFilter::try_new(&directive)
    {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.filter)
        .map_err(|e| anyhow::anyhow!("Invalid log filter '{}': {}", settings.filter, e))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(settings: &LoggingSettings) -> Result<()> {
    let filter = filter_for(settings)?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match settings.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(filter: &str) -> LoggingSettings {
        LoggingSettings {
            filter: filter.to_string(),
            format: LogFormat::Pretty,
        }
    }

    #[test]
    fn test_uses_configured_filter_without_env() {
        let filter = filter_from(None, &settings("coursehub=debug")).unwrap();
        assert_eq!(filter.to_string(), "coursehub=debug");
    }

    #[test]
    fn test_env_directive_wins() {
        let filter = filter_from(Some("warn".into()), &settings("debug")).unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_bad_env_directive_falls_back_to_config() {
        let filter = filter_from(Some("coursehub=verbose".into()), &settings("info")).unwrap();
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_invalid_configured_filter_is_an_error() {
        let err = filter_from(None, &settings("coursehub=verbose")).unwrap_err();
        assert!(err.to_string().contains("Invalid log filter"));
    }
}
