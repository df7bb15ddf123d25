// SPDX-License-Identifier: AGPL-3.0
// Ingest Bridge Core - Shared logic for all frontends
//
// This crate provides:
// - Endpoint, connection and column types, and AppError
// - ConfigModel and SelectionState for the session's choices
// - Orchestrator, the discovery and transfer state machine
// - TransferService and its HTTP implementation
// - OrchestratorBridge to drive the orchestrator from a frontend
//
// Frontend-specific code lives in separate crates.

pub mod bridge;
pub mod client;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod selection;
pub mod service;
pub mod settings;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use bridge::OrchestratorBridge;
pub use client::HttpTransferService;
pub use logging::init_tracing;
pub use model::{ConfigChange, ConfigModel};
pub use orchestrator::{DiscoverySlot, Effect, Message, Orchestrator, RequestTag, Snapshot};
pub use selection::SelectionState;
pub use service::TransferService;
pub use settings::ClientSettings;
pub use types::{
    parse_delimiter, parse_port, AppError, ColumnDescriptor, ConnectionState, DataPreview,
    DatabaseConfig, DatabaseConfigUpdate, Endpoint, FileConfig, FileConfigUpdate, FilePreview,
    TransferDirection, TransferReceipt, TransferRequest, TransferStatus,
};
