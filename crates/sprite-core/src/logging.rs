use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;
use crate::error::SpriteError;

/// Install the global `tracing` subscriber. A valid `RUST_LOG` wins over the
/// configured level. Fails if a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), SpriteError> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env.as_deref(), &config.level)?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false))
            .try_init()
    };
    result.map_err(|e| SpriteError::Config(format!("failed to set tracing subscriber: {e}")))
}

/// `env` directives if present and parseable, else `level`.
fn build_filter(env: Option<&str>, level: &str) -> Result<EnvFilter, SpriteError> {
    if let Some(filter) = env
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
    {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| SpriteError::Config(format!("log.level: {e}")))
}
