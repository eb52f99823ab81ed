//! Operational helpers: logging setup.

use fbrec_types::{config::OpsConfig, FbrecError, Result};
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.clone())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| FbrecError::Configuration(format!("failed to create log filter: {err}")))?;

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| FbrecError::Configuration(format!("tracing init error: {err}")))?;
    Ok(())
}
