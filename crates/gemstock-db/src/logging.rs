//! Tracing subscriber setup for binaries.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingSettings};

/// Initializes the global tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - overrides the configured filter entirely
/// - `RUST_LOG=gemstock_db=trace` - trace for the database crate only
/// - Default: `settings.filter`
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match settings.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Full => builder.try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let settings = LoggingSettings::default();
        init_tracing(&settings);
        init_tracing(&settings);
    }

    #[test]
    fn test_bad_filter_falls_back() {
        let settings = LoggingSettings {
            filter: "[[not a filter".to_string(),
            format: LogFormat::Full,
        };
        init_tracing(&settings);
    }
}
