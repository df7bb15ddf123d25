// SPDX-License-Identifier: AGPL-3.0
// Ingest Bridge Core - Transfer orchestrator
//
// Message-driven state machine. `update` applies a user action or a service
// result and returns the effects (service calls) to run next. Discovery
// results carry the tag of the request that produced them; a result whose
// tag is no longer expected is dropped.

use crate::model::{ConfigChange, ConfigModel};
use crate::selection::SelectionState;
use crate::service::TransferService;
use crate::types::{
    AppError, ColumnDescriptor, ConnectionState, DataPreview, DatabaseConfig,
    DatabaseConfigUpdate, Endpoint, FileConfig, FileConfigUpdate, FilePreview, TransferDirection,
    TransferReceipt, TransferRequest, TransferStatus,
};
use std::collections::{BTreeSet, HashMap};

/// Kind of discovery request; one may be outstanding per slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoverySlot {
    Connection,
    Tables,
    /// Column listing and file preview share a slot
    Columns,
    Sample,
}

/// Identifies the request a discovery result answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    pub slot: DiscoverySlot,
    pub seq: u64,
}

#[derive(Debug, Clone)]
pub enum Message {
    // User actions
    SourceSelected(Endpoint),
    TargetSelected(Endpoint),
    DatabaseEdited(DatabaseConfigUpdate),
    FileEdited(FileConfigUpdate),
    TableChosen(String),
    ColumnToggled(String),
    ColumnsSelected(Vec<String>),
    AllColumnsSelected,
    AllColumnsCleared,
    CheckConnection,
    RequestPreview,
    Refresh,
    StartTransfer(TransferDirection),

    // Service results
    ConnectionChecked {
        tag: RequestTag,
        result: Result<(), AppError>,
    },
    TablesLoaded {
        tag: RequestTag,
        result: Result<Vec<String>, AppError>,
    },
    ColumnsLoaded {
        tag: RequestTag,
        result: Result<Vec<ColumnDescriptor>, AppError>,
    },
    FilePreviewed {
        tag: RequestTag,
        result: Result<FilePreview, AppError>,
    },
    TablePreviewed {
        tag: RequestTag,
        result: Result<DataPreview, AppError>,
    },
    TransferFinished(Result<TransferReceipt, AppError>),
}

/// A service call requested by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CheckConnection {
        tag: RequestTag,
        config: DatabaseConfig,
    },
    ListTables {
        tag: RequestTag,
        config: DatabaseConfig,
    },
    ListColumns {
        tag: RequestTag,
        config: DatabaseConfig,
        table: String,
    },
    PreviewFile {
        tag: RequestTag,
        file: FileConfig,
    },
    PreviewTable {
        tag: RequestTag,
        config: DatabaseConfig,
        table: String,
        columns: Vec<String>,
    },
    Transfer(TransferRequest),
}

impl Effect {
    /// Run the call and wrap its outcome as the message to feed back
    pub async fn execute(self, service: &dyn TransferService) -> Message {
        match self {
            Effect::CheckConnection { tag, config } => Message::ConnectionChecked {
                tag,
                result: service.connect(&config).await,
            },
            Effect::ListTables { tag, config } => Message::TablesLoaded {
                tag,
                result: service.list_tables(&config).await,
            },
            Effect::ListColumns { tag, config, table } => Message::ColumnsLoaded {
                tag,
                result: service.list_columns(&config, &table).await,
            },
            Effect::PreviewFile { tag, file } => Message::FilePreviewed {
                tag,
                result: service.preview_file(&file).await,
            },
            Effect::PreviewTable {
                tag,
                config,
                table,
                columns,
            } => Message::TablePreviewed {
                tag,
                result: service.preview_table(&config, &table, &columns).await,
            },
            Effect::Transfer(request) => {
                tracing::info!(
                    "Transfer {} via {}: table {}, {} columns",
                    request.direction,
                    service.name(),
                    request.table,
                    request.columns.len()
                );
                Message::TransferFinished(service.transfer(&request).await)
            }
        }
    }
}

/// Everything a frontend needs to render
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub source: Endpoint,
    pub target: Endpoint,
    pub database: DatabaseConfig,
    pub file: FileConfig,
    pub tables: Vec<String>,
    pub chosen_table: Option<String>,
    pub available_columns: Vec<ColumnDescriptor>,
    pub selected_columns: BTreeSet<String>,
    pub preview: Option<DataPreview>,
    pub discovering: bool,
    pub discovery_error: Option<String>,
    pub connection: ConnectionState,
    pub status: TransferStatus,
}

/// Coordinates configuration, discovery and the transfer status
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    model: ConfigModel,
    selection: SelectionState,
    status: TransferStatus,
    connection: ConnectionState,
    preview: Option<DataPreview>,
    discovery_error: Option<String>,
    /// Expected sequence number per slot
    pending: HashMap<DiscoverySlot, u64>,
    next_seq: u64,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> &ConfigModel {
        &self.model
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn status(&self) -> &TransferStatus {
        &self.status
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn preview(&self) -> Option<&DataPreview> {
        self.preview.as_ref()
    }

    pub fn discovery_error(&self) -> Option<&str> {
        self.discovery_error.as_deref()
    }

    /// A table or column request is outstanding
    pub fn is_discovering(&self) -> bool {
        self.pending.contains_key(&DiscoverySlot::Tables)
            || self.pending.contains_key(&DiscoverySlot::Columns)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            source: self.model.source(),
            target: self.model.target(),
            database: self.model.database().clone(),
            file: self.model.file().clone(),
            tables: self.selection.tables().to_vec(),
            chosen_table: self.selection.chosen_table().map(str::to_string),
            available_columns: self.selection.available_columns().to_vec(),
            selected_columns: self.selection.selected_columns().clone(),
            preview: self.preview.clone(),
            discovering: self.is_discovering(),
            discovery_error: self.discovery_error.clone(),
            connection: self.connection.clone(),
            status: self.status.clone(),
        }
    }

    /// Apply one message. Rejected user actions are logged; their effect on
    /// state (if any) is already visible through the status.
    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        let result = match message {
            Message::SourceSelected(endpoint) => Ok(self.set_source(endpoint)),
            Message::TargetSelected(endpoint) => self.set_target(endpoint),
            Message::DatabaseEdited(update) => Ok(self.update_database_config(update)),
            Message::FileEdited(update) => Ok(self.update_file_config(update)),
            Message::TableChosen(table) => self.choose_table(table),
            Message::ColumnToggled(name) => {
                self.selection.toggle_column(&name);
                Ok(Vec::new())
            }
            Message::ColumnsSelected(names) => {
                self.set_selected_columns(names);
                Ok(Vec::new())
            }
            Message::AllColumnsSelected => {
                self.selection.select_all();
                Ok(Vec::new())
            }
            Message::AllColumnsCleared => {
                self.selection.unselect_all();
                Ok(Vec::new())
            }
            Message::CheckConnection => self.check_connection().map(|e| vec![e]),
            Message::RequestPreview => self
                .request_preview()
                .map(|e| e.into_iter().collect::<Vec<_>>()),
            Message::Refresh => Ok(self.refresh()),
            Message::StartTransfer(direction) => self.run_transfer(direction).map(|e| vec![e]),

            Message::ConnectionChecked { tag, result } => {
                self.on_connection_checked(tag, result);
                Ok(Vec::new())
            }
            Message::TablesLoaded { tag, result } => {
                self.on_tables_loaded(tag, result);
                Ok(Vec::new())
            }
            Message::ColumnsLoaded { tag, result } => {
                self.on_columns_loaded(tag, result);
                Ok(Vec::new())
            }
            Message::FilePreviewed { tag, result } => {
                self.on_file_previewed(tag, result);
                Ok(Vec::new())
            }
            Message::TablePreviewed { tag, result } => {
                self.on_table_previewed(tag, result);
                Ok(Vec::new())
            }
            Message::TransferFinished(result) => {
                self.on_transfer_finished(result);
                Ok(Vec::new())
            }
        };

        result.unwrap_or_else(|e| {
            tracing::warn!("Action rejected: {}", e);
            Vec::new()
        })
    }

    pub fn set_source(&mut self, endpoint: Endpoint) -> Vec<Effect> {
        match self.model.set_source(endpoint) {
            Some(change) => self.on_config_changed(change),
            None => Vec::new(),
        }
    }

    pub fn set_target(&mut self, endpoint: Endpoint) -> Result<Vec<Effect>, AppError> {
        Ok(match self.model.set_target(endpoint)? {
            Some(change) => self.on_config_changed(change),
            None => Vec::new(),
        })
    }

    pub fn update_database_config(&mut self, update: DatabaseConfigUpdate) -> Vec<Effect> {
        match self.model.update_database_config(update) {
            Some(change) => self.on_config_changed(change),
            None => Vec::new(),
        }
    }

    pub fn update_file_config(&mut self, update: FileConfigUpdate) -> Vec<Effect> {
        match self.model.update_file_config(update) {
            Some(change) => self.on_config_changed(change),
            None => Vec::new(),
        }
    }

    /// Replace the column selection; unknown names are dropped
    pub fn set_selected_columns(&mut self, names: Vec<String>) {
        self.selection.set_selected_columns(names);
    }

    /// Choose the table: the column source when the database is the source,
    /// the destination table otherwise
    pub fn choose_table(&mut self, table: String) -> Result<Vec<Effect>, AppError> {
        if !self.model.uses(Endpoint::Database) {
            return Err(AppError::Precondition(
                "No database endpoint is configured".to_string(),
            ));
        }

        let table = table.trim().to_string();
        let choice = (!table.is_empty()).then_some(table);
        if !self.selection.choose_table(choice.clone()) {
            return Ok(Vec::new());
        }

        if self.model.source() != Endpoint::Database {
            tracing::info!("Target table set to {:?}", choice);
            return Ok(Vec::new());
        }

        self.reset_columns();
        Ok(match choice {
            Some(table) => vec![self.list_columns(table)],
            None => Vec::new(),
        })
    }

    /// Explicit reachability and credential check
    pub fn check_connection(&mut self) -> Result<Effect, AppError> {
        let config = self.model.database();
        if !config.is_discoverable() {
            let err = AppError::Precondition("Host and database are required".to_string());
            self.connection = ConnectionState::Failed {
                message: err.user_message().to_string(),
            };
            return Err(err);
        }

        let config = config.clone();
        self.connection = ConnectionState::Checking;
        Ok(Effect::CheckConnection {
            tag: self.issue(DiscoverySlot::Connection),
            config,
        })
    }

    /// Ask for sample rows of the selected columns. The file source already
    /// has its samples from the header preview.
    pub fn request_preview(&mut self) -> Result<Option<Effect>, AppError> {
        if self.model.source() == Endpoint::File {
            return Ok(None);
        }

        let table = self
            .selection
            .chosen_table()
            .ok_or_else(|| AppError::Precondition("Choose a table first".to_string()))?
            .to_string();
        if self.selection.selected_columns().is_empty() {
            return Err(AppError::Precondition(
                "Select at least one column".to_string(),
            ));
        }

        let columns = self.selection.selected_columns().iter().cloned().collect();
        Ok(Some(Effect::PreviewTable {
            tag: self.issue(DiscoverySlot::Sample),
            config: self.model.database().clone(),
            table,
            columns,
        }))
    }

    /// Forget discovered state and discover again
    pub fn refresh(&mut self) -> Vec<Effect> {
        self.reset_discovery();
        self.discover()
    }

    /// Start a transfer.
    ///
    /// While another transfer runs the call is refused and the status is left
    /// alone. Any other unmet requirement marks the status as failed without
    /// contacting the service.
    pub fn run_transfer(&mut self, direction: TransferDirection) -> Result<Effect, AppError> {
        if self.status.is_running() {
            return Err(AppError::Precondition(
                "A transfer is already running".to_string(),
            ));
        }

        match self.transfer_request(direction) {
            Ok(request) => {
                tracing::info!("Transfer started: {}", direction);
                self.status = TransferStatus::Running;
                Ok(Effect::Transfer(request))
            }
            Err(err) => {
                tracing::warn!("Transfer not started: {}", err);
                self.status = TransferStatus::Failed {
                    message: err.user_message().to_string(),
                };
                Err(err)
            }
        }
    }

    fn transfer_request(&self, direction: TransferDirection) -> Result<TransferRequest, AppError> {
        if direction.source() != self.model.source() || direction.target() != self.model.target() {
            return Err(AppError::Precondition(format!(
                "Configured endpoints do not match a {} transfer",
                direction
            )));
        }
        if self.selection.selected_columns().is_empty() {
            return Err(AppError::Precondition(
                "Select at least one column".to_string(),
            ));
        }

        let database = self.model.database();
        let missing = database.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::Precondition(format!(
                "Database configuration is incomplete: missing {}",
                missing.join(", ")
            )));
        }

        let file = self.model.file();
        if !file.has_file() {
            return Err(AppError::Precondition("Choose a file first".to_string()));
        }

        let table = self
            .selection
            .chosen_table()
            .ok_or_else(|| AppError::Precondition("Choose a table first".to_string()))?;

        Ok(TransferRequest {
            direction,
            database: database.clone(),
            file: file.clone(),
            table: table.to_string(),
            columns: self.selection.selected_columns().iter().cloned().collect(),
        })
    }

    fn on_config_changed(&mut self, change: ConfigChange) -> Vec<Effect> {
        let source = self.model.source();

        match change {
            ConfigChange::SourceChanged | ConfigChange::TargetChanged => {
                self.reset_discovery();
                self.discover()
            }
            ConfigChange::DatabaseChanged => {
                self.connection = ConnectionState::Unknown;
                self.pending.remove(&DiscoverySlot::Connection);
                self.pending.remove(&DiscoverySlot::Tables);
                self.selection.clear_tables();
                self.discovery_error = None;
                if source == Endpoint::Database {
                    self.reset_columns();
                }
                self.list_tables().into_iter().collect()
            }
            ConfigChange::FileChanged => {
                if source != Endpoint::File {
                    return Vec::new();
                }
                self.reset_columns();
                self.discovery_error = None;
                self.preview_file().into_iter().collect()
            }
        }
    }

    /// Discovery for the current configuration
    fn discover(&mut self) -> Vec<Effect> {
        let mut effects: Vec<Effect> = self.list_tables().into_iter().collect();
        if self.model.source() == Endpoint::File {
            effects.extend(self.preview_file());
        }
        effects
    }

    fn reset_discovery(&mut self) {
        self.pending.retain(|slot, _| *slot == DiscoverySlot::Connection);
        self.selection = SelectionState::new();
        self.preview = None;
        self.discovery_error = None;
    }

    /// Drop columns, selection and samples along with their outstanding requests
    fn reset_columns(&mut self) {
        self.pending.remove(&DiscoverySlot::Columns);
        self.pending.remove(&DiscoverySlot::Sample);
        self.selection.clear_columns();
        self.preview = None;
    }

    fn list_tables(&mut self) -> Option<Effect> {
        let config = self.model.database();
        if !self.model.uses(Endpoint::Database) || !config.is_discoverable() {
            return None;
        }

        let config = config.clone();
        tracing::info!("Listing tables of {}:{}/{}", config.host, config.port, config.database);
        Some(Effect::ListTables {
            tag: self.issue(DiscoverySlot::Tables),
            config,
        })
    }

    fn list_columns(&mut self, table: String) -> Effect {
        tracing::info!("Listing columns of {}", table);
        Effect::ListColumns {
            tag: self.issue(DiscoverySlot::Columns),
            config: self.model.database().clone(),
            table,
        }
    }

    fn preview_file(&mut self) -> Option<Effect> {
        let file = self.model.file();
        if !file.has_file() {
            return None;
        }

        let file = file.clone();
        tracing::info!("Previewing {} (delimiter {:?})", file.file_name, file.delimiter);
        Some(Effect::PreviewFile {
            tag: self.issue(DiscoverySlot::Columns),
            file,
        })
    }

    fn issue(&mut self, slot: DiscoverySlot) -> RequestTag {
        self.next_seq += 1;
        self.pending.insert(slot, self.next_seq);
        RequestTag {
            slot,
            seq: self.next_seq,
        }
    }

    /// Consume the expected tag; false means the result is stale
    fn accept(&mut self, tag: RequestTag) -> bool {
        if self.pending.get(&tag.slot) == Some(&tag.seq) {
            self.pending.remove(&tag.slot);
            true
        } else {
            tracing::debug!("Discarding stale {:?} response #{}", tag.slot, tag.seq);
            false
        }
    }

    fn on_connection_checked(&mut self, tag: RequestTag, result: Result<(), AppError>) {
        if !self.accept(tag) {
            return;
        }
        self.connection = match result {
            Ok(()) => {
                tracing::info!("Connection check succeeded");
                ConnectionState::Connected
            }
            Err(err) => {
                tracing::warn!("Connection check failed: {}", err);
                ConnectionState::Failed {
                    message: err.user_message().to_string(),
                }
            }
        };
    }

    fn on_tables_loaded(&mut self, tag: RequestTag, result: Result<Vec<String>, AppError>) {
        if !self.accept(tag) {
            return;
        }
        if self.model.source() == Endpoint::Database {
            self.reset_columns();
        }

        match result {
            Ok(tables) => {
                tracing::info!("Found {} tables", tables.len());
                self.selection.replace_tables(tables);
                self.discovery_error = None;
            }
            Err(err) => {
                tracing::warn!("Failed to fetch tables: {}", err);
                self.selection.clear_tables();
                self.discovery_error = Some(format!("Failed to fetch tables: {}", err.user_message()));
            }
        }
    }

    fn on_columns_loaded(
        &mut self,
        tag: RequestTag,
        result: Result<Vec<ColumnDescriptor>, AppError>,
    ) {
        if !self.accept(tag) {
            return;
        }

        match result {
            Ok(columns) => {
                tracing::info!("Found {} columns", columns.len());
                self.selection.replace_columns(columns);
                self.discovery_error = None;
            }
            Err(err) => {
                tracing::warn!("Failed to fetch columns: {}", err);
                self.selection.clear_columns();
                self.discovery_error =
                    Some(format!("Failed to fetch columns: {}", err.user_message()));
            }
        }
    }

    fn on_file_previewed(&mut self, tag: RequestTag, result: Result<FilePreview, AppError>) {
        if !self.accept(tag) {
            return;
        }

        match result {
            Ok(preview) => {
                tracing::info!("File has {} columns", preview.columns.len());
                self.preview = Some(DataPreview::from_records(&preview.columns, &preview.rows));
                self.selection
                    .replace_columns(preview.columns.into_iter().map(ColumnDescriptor::new).collect());
                self.discovery_error = None;
            }
            Err(err) => {
                tracing::warn!("Failed to read file columns: {}", err);
                self.selection.clear_columns();
                self.preview = None;
                self.discovery_error =
                    Some(format!("Failed to read file columns: {}", err.user_message()));
            }
        }
    }

    fn on_table_previewed(&mut self, tag: RequestTag, result: Result<DataPreview, AppError>) {
        if !self.accept(tag) {
            return;
        }

        match result {
            Ok(preview) => {
                self.preview = Some(preview);
            }
            Err(err) => {
                tracing::warn!("Failed to preview data: {}", err);
                self.preview = None;
                self.discovery_error = Some(format!("Failed to preview data: {}", err.user_message()));
            }
        }
    }

    fn on_transfer_finished(&mut self, result: Result<TransferReceipt, AppError>) {
        if !self.status.is_running() {
            tracing::warn!("Ignoring transfer result while {:?}", self.status);
            return;
        }

        self.status = match result {
            Ok(receipt) => {
                tracing::info!("Transfer succeeded: {} records", receipt.record_count);
                TransferStatus::Succeeded {
                    record_count: receipt.record_count,
                }
            }
            Err(err) => {
                tracing::error!("Transfer failed: {}", err);
                let message = match err.user_message() {
                    "" => "Network error while contacting the transfer service".to_string(),
                    message => message.to_string(),
                };
                TransferStatus::Failed { message }
            }
        };
    }
}
