// SPDX-License-Identifier: AGPL-3.0
// Ingest Bridge Core - Logging setup for frontends

use crate::types::AppError;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, with this crate at info
/// unless overridden
pub fn init_tracing() -> Result<(), AppError> {
    let directive: Directive = "ingest_bridge_core=info"
        .parse()
        .map_err(|e| AppError::InvalidConfig(format!("Invalid log directive: {}", e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .try_init()
        .map_err(|e| AppError::InvalidConfig(format!("Logging already initialised: {}", e)))
}
