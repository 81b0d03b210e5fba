//! Tracing subscriber setup for the experiment runner

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::{LogFormat, LoggingConfig};

const FALLBACK_LEVEL: &str = "info";

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Returns `false`
/// when a subscriber was already installed, e.g. by an embedding program.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let installed = tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(format_layer(&config.format))
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(level = %config.level, format = ?config.format, "Logging initialized");
    } else {
        tracing::debug!("Subscriber already installed, keeping it");
    }
    installed
}

/// Build the level filter, falling back to `info` on an unparsable level
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL))
}

fn format_layer(format: &LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_second_init_keeps_first_subscriber() {
        let config = LoggingConfig::default();

        init_logging(&config);
        assert!(!init_logging(&config));
    }

    #[test]
    fn test_invalid_level_falls_back() {
        let filter = env_filter("scientist=loud");

        if std::env::var("RUST_LOG").is_err() {
            assert_eq!(
                Layer::<Registry>::max_level_hint(&filter),
                Some(LevelFilter::INFO)
            );
        }
    }
}
