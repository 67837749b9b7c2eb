//! Tracing subscriber setup for hosts embedding the store.

use tracing_subscriber::{fmt, EnvFilter};

use crate::types::{Result, StoreError};

/// Installs a global `fmt` subscriber writing to stderr.
///
/// `filter` uses [`EnvFilter`] directive syntax, e.g. `"info"` or
/// `"exhash::storage=debug"`. Fails if the directive is malformed or a
/// subscriber is already installed.
pub fn init_logging(filter: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(filter)
                .map_err(|e| StoreError::InvalidArgument(format!("invalid log filter: {e}")))?,
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| StoreError::InvalidArgument("logging already initialized".into()))
}
