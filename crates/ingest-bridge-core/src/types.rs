// SPDX-License-Identifier: AGPL-3.0
// Ingest Bridge Core - Type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default ClickHouse HTTP port
pub const DEFAULT_DATABASE_PORT: u16 = 8123;

/// Default field delimiter for flat files
pub const DEFAULT_DELIMITER: char = ',';

/// One side of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Database,
    File,
}

impl Endpoint {
    pub const ALL: [Endpoint; 2] = [Endpoint::Database, Endpoint::File];

    /// The endpoint on the opposite side
    pub fn other(self) -> Self {
        match self {
            Self::Database => Self::File,
            Self::File => Self::Database,
        }
    }

    /// Get display label for this endpoint
    pub fn label(&self) -> &'static str {
        match self {
            Self::Database => "ClickHouse",
            Self::File => "Flat File",
        }
    }
}

/// Connection parameters for the database endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    #[serde(rename = "jwt_token")]
    pub token: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_DATABASE_PORT,
            database: String::new(),
            user: String::new(),
            token: String::new(),
        }
    }
}

// The token never ends up in logs.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .finish()
    }
}

impl DatabaseConfig {
    /// Enough is known to ask the service for the table list
    pub fn is_discoverable(&self) -> bool {
        !self.host.trim().is_empty() && !self.database.trim().is_empty()
    }

    /// Every field a transfer needs is populated
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Names of required fields that are still empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.host.trim().is_empty() {
            missing.push("host");
        }
        if self.port == 0 {
            missing.push("port");
        }
        if self.database.trim().is_empty() {
            missing.push("database");
        }
        if self.user.trim().is_empty() {
            missing.push("user");
        }
        missing
    }

    /// Merge the set fields of `update`; returns whether anything changed
    pub fn apply(&mut self, update: DatabaseConfigUpdate) -> bool {
        let before = self.clone();

        if let Some(host) = update.host {
            self.host = host;
        }
        if let Some(port) = update.port {
            self.port = port;
        }
        if let Some(database) = update.database {
            self.database = database;
        }
        if let Some(user) = update.user {
            self.user = user;
        }
        if let Some(token) = update.token {
            self.token = token;
        }

        *self != before
    }
}

/// Partial edit of a [`DatabaseConfig`], one optional value per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseConfigUpdate {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub token: Option<String>,
}

impl DatabaseConfigUpdate {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Coerce port text from an input field
pub fn parse_port(text: &str) -> Result<u16, AppError> {
    text.trim()
        .parse::<u16>()
        .map_err(|_| AppError::Precondition(format!("Invalid port: {:?}", text)))
}

/// Flat file selection and parsing options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    /// Path of the chosen file; empty when nothing is chosen yet
    pub file_name: String,
    pub delimiter: char,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            file_name: String::new(),
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl FileConfig {
    pub fn has_file(&self) -> bool {
        !self.file_name.trim().is_empty()
    }

    /// Merge the set fields of `update`; returns whether anything changed
    pub fn apply(&mut self, update: FileConfigUpdate) -> bool {
        let before = self.clone();

        if let Some(file_name) = update.file_name {
            self.file_name = file_name;
        }
        if let Some(delimiter) = update.delimiter {
            self.delimiter = delimiter;
        }

        *self != before
    }
}

/// Partial edit of a [`FileConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfigUpdate {
    pub file_name: Option<String>,
    pub delimiter: Option<char>,
}

impl FileConfigUpdate {
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }
}

/// Coerce delimiter text from an input field. `\t` is accepted for tab.
pub fn parse_delimiter(text: &str) -> Result<char, AppError> {
    if text == "\\t" {
        return Ok('\t');
    }

    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(AppError::Precondition(format!(
            "Delimiter must be a single character, got {:?}",
            text
        ))),
    }
}

/// A column as reported by discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
        }
    }

    pub fn typed(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: Some(data_type.into()),
        }
    }

    /// Display label, e.g. `id (UInt64)`
    pub fn label(&self) -> String {
        match &self.data_type {
            Some(data_type) => format!("{} ({})", self.name, data_type),
            None => self.name.clone(),
        }
    }
}

/// Which way rows move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferDirection {
    DatabaseToFile,
    FileToDatabase,
}

impl TransferDirection {
    pub fn source(&self) -> Endpoint {
        match self {
            Self::DatabaseToFile => Endpoint::Database,
            Self::FileToDatabase => Endpoint::File,
        }
    }

    pub fn target(&self) -> Endpoint {
        self.source().other()
    }

    /// Direction implied by a source endpoint
    pub fn from_source(source: Endpoint) -> Self {
        match source {
            Endpoint::Database => Self::DatabaseToFile,
            Endpoint::File => Self::FileToDatabase,
        }
    }
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source().label(), self.target().label())
    }
}

/// Transfer status projection for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransferStatus {
    #[default]
    Idle,
    Running,
    Succeeded {
        record_count: u64,
    },
    Failed {
        message: String,
    },
}

impl TransferStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    /// Text for the status area; nothing is shown while idle
    pub fn summary(&self) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::Running => Some("Transferring data...".to_string()),
            Self::Succeeded { record_count } => Some(format!(
                "Transfer completed successfully! {} records processed.",
                record_count
            )),
            Self::Failed { message } if message.is_empty() => {
                Some("An error occurred during transfer.".to_string())
            }
            Self::Failed { message } => Some(message.clone()),
        }
    }
}

/// Result of the explicit connection test
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Unknown,
    Checking,
    Connected,
    Failed {
        message: String,
    },
}

/// Everything a transfer needs, captured when it is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub direction: TransferDirection,
    pub database: DatabaseConfig,
    pub file: FileConfig,
    /// Source table for exports, target table for imports
    pub table: String,
    /// Selected columns in name order
    pub columns: Vec<String>,
}

/// Terminal result reported by the transfer service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub record_count: u64,
    /// CSV payload returned by a database-to-file export
    pub exported: Option<String>,
}

/// Header and sample rows of a flat file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilePreview {
    pub columns: Vec<String>,
    #[serde(default, rename = "preview")]
    pub rows: Vec<serde_json::Value>,
}

/// Sample rows laid out by column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataPreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl DataPreview {
    /// Lay out record-shaped rows (`{"col": value}`) in column order.
    /// Missing values become null.
    pub fn from_records(columns: &[String], records: &[serde_json::Value]) -> Self {
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| {
                        record
                            .get(column)
                            .cloned()
                            .unwrap_or(serde_json::Value::Null)
                    })
                    .collect()
            })
            .collect();

        Self {
            columns: columns.to_vec(),
            rows,
        }
    }
}

/// Error types for the application
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppError {
    /// The bare description shown to the user, without the category prefix
    pub fn user_message(&self) -> &str {
        match self {
            Self::Connection(msg)
            | Self::Auth(msg)
            | Self::NotFound(msg)
            | Self::Parse(msg)
            | Self::Transfer(msg)
            | Self::Precondition(msg)
            | Self::FileIo(msg)
            | Self::Serialization(msg)
            | Self::InvalidConfig(msg) => msg,
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileIo(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let db = DatabaseConfig::default();
        assert_eq!(db.port, 8123);
        assert!(!db.is_discoverable());

        let file = FileConfig::default();
        assert_eq!(file.delimiter, ',');
        assert!(!file.has_file());
    }

    #[test]
    fn test_database_update_merges_only_set_fields() {
        let mut db = DatabaseConfig::default();
        assert!(db.apply(DatabaseConfigUpdate::default().host("h").database("d")));
        assert!(db.is_discoverable());
        assert!(!db.is_complete());
        assert_eq!(db.missing_fields(), vec!["user"]);

        assert!(db.apply(DatabaseConfigUpdate::default().user("u")));
        assert_eq!(db.host, "h");
        assert_eq!(db.port, 8123);
        assert!(db.is_complete());

        // Same value again is not a change
        assert!(!db.apply(DatabaseConfigUpdate::default().user("u")));
        assert!(!db.apply(DatabaseConfigUpdate::default()));
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut db = DatabaseConfig::default();
        db.apply(DatabaseConfigUpdate::default().token("secret"));
        let rendered = format!("{:?}", db);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_wire_names() {
        let db = DatabaseConfig::default();
        let json = serde_json::to_value(&db).unwrap();
        assert!(json.get("jwt_token").is_some());

        let column: ColumnDescriptor =
            serde_json::from_str(r#"{"name":"id","type":"UInt64"}"#).unwrap();
        assert_eq!(column, ColumnDescriptor::typed("id", "UInt64"));
        assert_eq!(column.label(), "id (UInt64)");

        let bare: ColumnDescriptor = serde_json::from_str(r#"{"name":"ts"}"#).unwrap();
        assert_eq!(bare.label(), "ts");
    }

    #[test]
    fn test_parse_inputs() {
        assert_eq!(parse_port("9000").unwrap(), 9000);
        assert!(parse_port("abc").unwrap_err().is_precondition());
        assert!(parse_port("70000").is_err());

        assert_eq!(parse_delimiter(";").unwrap(), ';');
        assert_eq!(parse_delimiter("\\t").unwrap(), '\t');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(",,").is_err());
    }

    #[test]
    fn test_direction_endpoints() {
        assert_eq!(TransferDirection::DatabaseToFile.source(), Endpoint::Database);
        assert_eq!(TransferDirection::DatabaseToFile.target(), Endpoint::File);
        assert_eq!(
            TransferDirection::from_source(Endpoint::File),
            TransferDirection::FileToDatabase
        );
    }

    #[test]
    fn test_status_summary() {
        assert_eq!(TransferStatus::Idle.summary(), None);
        assert_eq!(
            TransferStatus::Succeeded { record_count: 42 }.summary().unwrap(),
            "Transfer completed successfully! 42 records processed."
        );
        assert_eq!(
            TransferStatus::Failed {
                message: String::new()
            }
            .summary()
            .unwrap(),
            "An error occurred during transfer."
        );
    }

    #[test]
    fn test_preview_from_records() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let records = vec![
            serde_json::json!({"id": 1, "name": "a"}),
            serde_json::json!({"id": 2}),
        ];
        let preview = DataPreview::from_records(&columns, &records);
        assert_eq!(preview.rows[0], vec![serde_json::json!(1), serde_json::json!("a")]);
        assert_eq!(preview.rows[1][1], serde_json::Value::Null);
    }

    #[test]
    fn test_user_message_strips_category() {
        let err = AppError::Transfer("connection reset".to_string());
        assert_eq!(err.user_message(), "connection reset");
        assert_eq!(err.to_string(), "Transfer failed: connection reset");
    }
}
