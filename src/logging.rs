//! Logging setup shared by the demo binaries.

pub use log::{debug, error, info, trace, warn};

/// Installs `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
///
/// Calling it more than once is harmless; later calls keep the first logger.
pub fn init()
{
	let env = env_logger::Env::default().default_filter_or("info");
	let _ = env_logger::Builder::from_env(env).format_timestamp(None).try_init();
}
