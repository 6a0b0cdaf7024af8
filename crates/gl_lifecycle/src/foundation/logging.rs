//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from the `RUST_LOG` environment variable
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Initialize the logging system with an explicit filter such as `"info"` or
/// `"gl_lifecycle=debug"`
///
/// `RUST_LOG` still wins when it is set, so a user can raise verbosity without
/// touching the configuration file.
pub fn init_with_filter(filter: &str) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init()
}
