//! Tracing setup. Logs go to stderr so they never mix with the conversation
//! on stdout.

use pitwall_config::LoggingConfig;
use tracing::dispatcher::{self, DefaultGuard, Dispatch};
use tracing_subscriber::EnvFilter;

/// Install the subscriber. It stays active until the returned guard drops.
///
/// `RUST_LOG` wins over both `--verbose` and `logging.level`.
pub fn init(verbose: bool, config: &LoggingConfig) -> DefaultGuard {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let dispatch = if config.json {
        Dispatch::new(builder.json().finish())
    } else {
        Dispatch::new(builder.finish())
    };

    dispatcher::set_default(&dispatch)
}
