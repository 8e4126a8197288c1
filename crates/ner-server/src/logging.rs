//! Logging initialization.
//!
//! Console sink with a switchable JSON/text formatter, plus an optional
//! append-mode file sink. `RUST_LOG` overrides the configured level.

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use ner_core::config::LoggingConfig;
use ner_core::error::{CoreError, CoreResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global tracing subscriber. Call once, before anything logs.
pub fn init_logging(config: &LoggingConfig) -> CoreResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            CoreError::ConfigError(format!(
                "logging.level '{}' is not a valid filter: {}",
                config.level, e
            ))
        })?;

    let mut layers: Vec<BoxedLayer> = vec![console_layer(&config.format)];

    if let Some(path) = &config.file {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CoreError::ConfigError(format!(
                        "logging.file directory {} not creatable: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        let file = std::fs::File::options()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                CoreError::ConfigError(format!(
                    "logging.file {} not writable: {}",
                    path.display(),
                    e
                ))
            })?;
        layers.push(file_layer(&config.format, Arc::new(file)));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .init();

    Ok(())
}

fn console_layer(format: &str) -> BoxedLayer {
    match format {
        "json" => fmt::layer().json().boxed(),
        _ => fmt::layer().boxed(),
    }
}

fn file_layer(format: &str, file: Arc<std::fs::File>) -> BoxedLayer {
    match format {
        "json" => fmt::layer().json().with_writer(file).with_ansi(false).boxed(),
        _ => fmt::layer().with_writer(file).with_ansi(false).boxed(),
    }
}
