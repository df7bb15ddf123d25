// SPDX-License-Identifier: AGPL-3.0
// Ingest Bridge Core - Scripted service for tests
//
// Answers every call from preset results. Column listings can be held back
// per table until the test releases them.

use crate::service::TransferService;
use crate::types::{
    AppError, ColumnDescriptor, DataPreview, DatabaseConfig, FileConfig, FilePreview,
    TransferReceipt, TransferRequest,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;

pub struct ScriptedService {
    tables: Mutex<Result<Vec<String>, AppError>>,
    columns: Mutex<HashMap<String, Result<Vec<ColumnDescriptor>, AppError>>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    file_preview: Mutex<Result<FilePreview, AppError>>,
    transfer_result: Mutex<Result<TransferReceipt, AppError>>,
    transfers: Mutex<Vec<TransferRequest>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Ok(Vec::new())),
            columns: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            file_preview: Mutex::new(Ok(FilePreview::default())),
            transfer_result: Mutex::new(Ok(TransferReceipt {
                record_count: 0,
                exported: None,
            })),
            transfers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tables(self, tables: &[&str]) -> Self {
        *self.tables.lock().unwrap() = Ok(tables.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_columns(self, table: &str, columns: Vec<ColumnDescriptor>) -> Self {
        self.columns
            .lock()
            .unwrap()
            .insert(table.to_string(), Ok(columns));
        self
    }

    pub fn with_file_preview(self, preview: FilePreview) -> Self {
        *self.file_preview.lock().unwrap() = Ok(preview);
        self
    }

    pub fn with_transfer(self, result: Result<TransferReceipt, AppError>) -> Self {
        *self.transfer_result.lock().unwrap() = result;
        self
    }

    /// Hold `list_columns(table)` until the returned sender fires
    pub fn hold_columns(&self, table: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(table.to_string(), rx);
        tx
    }

    pub fn transfer_calls(&self) -> usize {
        self.transfers.lock().unwrap().len()
    }

    pub fn last_transfer(&self) -> Option<TransferRequest> {
        self.transfers.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TransferService for ScriptedService {
    async fn connect(&self, _config: &DatabaseConfig) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_tables(&self, _config: &DatabaseConfig) -> Result<Vec<String>, AppError> {
        self.tables.lock().unwrap().clone()
    }

    async fn list_columns(
        &self,
        _config: &DatabaseConfig,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, AppError> {
        let gate = self.gates.lock().unwrap().remove(table);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        self.columns
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_else(|| Err(AppError::NotFound(format!("Table {} doesn't exist", table))))
    }

    async fn preview_file(&self, _file: &FileConfig) -> Result<FilePreview, AppError> {
        self.file_preview.lock().unwrap().clone()
    }

    async fn preview_table(
        &self,
        _config: &DatabaseConfig,
        _table: &str,
        columns: &[String],
    ) -> Result<DataPreview, AppError> {
        Ok(DataPreview {
            columns: columns.to_vec(),
            rows: Vec::new(),
        })
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<TransferReceipt, AppError> {
        self.transfers.lock().unwrap().push(request.clone());
        self.transfer_result.lock().unwrap().clone()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
