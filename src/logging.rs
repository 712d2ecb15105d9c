use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::LoggingConfig,
    error::{AddContext, Error},
};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level_override`, which takes precedence over the
/// configured level. Console output goes to stderr so a PDF can be written to stdout. Keep the
/// returned guard alive for as long as the file log should be flushed.
pub fn init_logging(
    cfg: &LoggingConfig,
    level_override: Option<&str>,
) -> Result<Option<WorkerGuard>, Error> {
    let level = level_override.unwrap_or(cfg.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if cfg.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = match cfg.file.as_deref().map(Path::new) {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(Error::from)
                    .add_context(&format!("creating log directory '{}'", parent.display()))?;
            }
            let file = std::fs::File::create(path)
                .map_err(Error::from)
                .add_context(&format!("creating log file '{}'", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::from(format!("failed to init logging: {e}")))?;

    Ok(guard)
}
