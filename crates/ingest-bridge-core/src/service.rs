// SPDX-License-Identifier: AGPL-3.0
// Ingest Bridge Core - Transfer service seam
//
// Logical operations of the external transfer service. The HTTP client in
// `client` is the production implementation; tests supply their own.

use crate::types::{
    AppError, ColumnDescriptor, DataPreview, DatabaseConfig, FileConfig, FilePreview,
    TransferReceipt, TransferRequest,
};
use async_trait::async_trait;

/// Operations offered by the database/file transfer service
#[async_trait]
pub trait TransferService: Send + Sync {
    /// Check reachability and credentials
    ///
    /// Fails with Connection or Auth.
    async fn connect(&self, config: &DatabaseConfig) -> Result<(), AppError>;

    /// List tables of the configured database
    ///
    /// Fails with Connection or Auth.
    async fn list_tables(&self, config: &DatabaseConfig) -> Result<Vec<String>, AppError>;

    /// Describe the columns of one table
    ///
    /// Fails with NotFound when the table is absent.
    async fn list_columns(
        &self,
        config: &DatabaseConfig,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, AppError>;

    /// Read the header (and some rows) of a flat file using its delimiter
    ///
    /// Fails with Parse on malformed input.
    async fn preview_file(&self, file: &FileConfig) -> Result<FilePreview, AppError>;

    /// Sample rows of selected columns
    async fn preview_table(
        &self,
        config: &DatabaseConfig,
        table: &str,
        columns: &[String],
    ) -> Result<DataPreview, AppError>;

    /// Run a transfer to completion and report the row count
    ///
    /// Fails with Transfer carrying the service's message.
    async fn transfer(&self, request: &TransferRequest) -> Result<TransferReceipt, AppError>;

    /// Service name for logging
    fn name(&self) -> &str;
}
