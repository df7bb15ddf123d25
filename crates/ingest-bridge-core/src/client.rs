// SPDX-License-Identifier: AGPL-3.0
// Ingest Bridge Core - HTTP client for the transfer service
//
// Every operation is a single POST. Failures are mapped onto AppError
// categories; the service's `detail` text is kept as the user message.

use crate::service::TransferService;
use crate::settings::ClientSettings;
use crate::types::{
    AppError, ColumnDescriptor, DataPreview, DatabaseConfig, FileConfig, FilePreview,
    TransferDirection, TransferReceipt, TransferRequest,
};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

type ErrorKind = fn(String) -> AppError;

#[derive(Serialize)]
struct TableRequest<'a> {
    #[serde(flatten)]
    config: &'a DatabaseConfig,
    table_name: &'a str,
}

#[derive(Serialize)]
struct Selection<'a> {
    table_name: &'a str,
    columns: &'a [String],
}

#[derive(Serialize)]
struct SelectionRequest<'a> {
    config: &'a DatabaseConfig,
    selection: Selection<'a>,
}

#[derive(Deserialize)]
struct TablesResponse {
    tables: Vec<String>,
}

#[derive(Deserialize)]
struct ColumnsResponse {
    columns: Vec<ColumnDescriptor>,
}

#[derive(Deserialize)]
struct TablePreviewResponse {
    #[serde(default)]
    preview: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct TransferResponse {
    #[serde(default)]
    record_count: u64,
    #[serde(default)]
    data: Option<String>,
}

/// Client for the FastAPI transfer service
pub struct HttpTransferService {
    http_client: Client,
    settings: ClientSettings,
}

impl HttpTransferService {
    pub fn new(settings: ClientSettings) -> Result<Self, AppError> {
        settings.validate()?;

        // No global timeout: transfers can run long, discovery sets its own
        let http_client = Client::builder()
            .connect_timeout(settings.connect_timeout())
            .build()
            .map_err(|e| AppError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Transfer service at {}", settings.api_base_url);

        Ok(Self {
            http_client,
            settings,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http_client.post(self.settings.endpoint(path))
    }

    fn discovery(&self, path: &str) -> RequestBuilder {
        self.post(path).timeout(self.settings.request_timeout())
    }

    fn transfer_call(&self, path: &str) -> RequestBuilder {
        let builder = self.post(path);
        match self.settings.transfer_timeout() {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    async fn read_file(file: &FileConfig) -> Result<(String, Vec<u8>), AppError> {
        let path = Path::new(file.file_name.trim());
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::FileIo(format!("Failed to read {}: {}", path.display(), e)))?;

        let name = path
            .file_name()
            .ok_or_else(|| AppError::FileIo("Invalid file path".to_string()))?
            .to_string_lossy()
            .to_string();

        Ok((name, bytes))
    }

    async fn file_form(file: &FileConfig) -> Result<Form, AppError> {
        let (name, bytes) = Self::read_file(file).await?;
        Ok(Form::new()
            .part("file", Part::bytes(bytes).file_name(name))
            .text("delimiter", file.delimiter.to_string()))
    }

    async fn transfer_to_file(&self, request: &TransferRequest) -> Result<TransferReceipt, AppError> {
        let body = SelectionRequest {
            config: &request.database,
            selection: Selection {
                table_name: &request.table,
                columns: &request.columns,
            },
        };

        let response: TransferResponse = send_json(
            self.transfer_call("/api/transfer/clickhouse-to-file").json(&body),
            "Transfer",
            AppError::Transfer,
        )
        .await?;

        if let Some(data) = &response.data {
            let path = request.file.file_name.trim();
            tokio::fs::write(path, data)
                .await
                .map_err(|e| AppError::FileIo(format!("Failed to write {}: {}", path, e)))?;
            tracing::info!("Wrote {} records to {}", response.record_count, path);
        }

        Ok(TransferReceipt {
            record_count: response.record_count,
            exported: response.data,
        })
    }

    async fn transfer_to_database(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferReceipt, AppError> {
        let form = Self::file_form(&request.file)
            .await?
            .text("table_name", request.table.clone())
            .text("columns", serde_json::to_string(&request.columns)?)
            .text("config", serde_json::to_string(&request.database)?);

        let response: TransferResponse = send_json(
            self.transfer_call("/api/transfer/file-to-clickhouse")
                .multipart(form),
            "Transfer",
            AppError::Transfer,
        )
        .await?;

        tracing::info!(
            "Loaded {} records into {}",
            response.record_count,
            request.table
        );

        Ok(TransferReceipt {
            record_count: response.record_count,
            exported: None,
        })
    }
}

#[async_trait]
impl TransferService for HttpTransferService {
    async fn connect(&self, config: &DatabaseConfig) -> Result<(), AppError> {
        let _: Value = send_json(
            self.discovery("/api/clickhouse/connect").json(config),
            "Connection check",
            AppError::Connection,
        )
        .await?;
        Ok(())
    }

    async fn list_tables(&self, config: &DatabaseConfig) -> Result<Vec<String>, AppError> {
        let response: TablesResponse = send_json(
            self.discovery("/api/clickhouse/tables").json(config),
            "Table listing",
            AppError::Connection,
        )
        .await?;
        Ok(response.tables)
    }

    async fn list_columns(
        &self,
        config: &DatabaseConfig,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, AppError> {
        let body = TableRequest {
            config,
            table_name: table,
        };
        let response: ColumnsResponse = send_json(
            self.discovery("/api/clickhouse/columns").json(&body),
            "Column listing",
            AppError::NotFound,
        )
        .await?;
        Ok(response.columns)
    }

    async fn preview_file(&self, file: &FileConfig) -> Result<FilePreview, AppError> {
        let form = Self::file_form(file).await?;
        let mut preview: FilePreview = send_json(
            self.discovery("/api/file/preview").multipart(form),
            "File preview",
            AppError::Parse,
        )
        .await?;

        preview.rows.truncate(self.settings.preview_rows);
        Ok(preview)
    }

    async fn preview_table(
        &self,
        config: &DatabaseConfig,
        table: &str,
        columns: &[String],
    ) -> Result<DataPreview, AppError> {
        let body = SelectionRequest {
            config,
            selection: Selection {
                table_name: table,
                columns,
            },
        };
        let mut response: TablePreviewResponse = send_json(
            self.discovery("/api/clickhouse/preview").json(&body),
            "Data preview",
            AppError::Parse,
        )
        .await?;

        response.preview.truncate(self.settings.preview_rows);
        Ok(DataPreview {
            columns: columns.to_vec(),
            rows: response.preview,
        })
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<TransferReceipt, AppError> {
        match request.direction {
            TransferDirection::DatabaseToFile => self.transfer_to_file(request).await,
            TransferDirection::FileToDatabase => self.transfer_to_database(request).await,
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Send a request and decode its JSON body, mapping failures onto AppError
async fn send_json<T: DeserializeOwned>(
    builder: RequestBuilder,
    what: &str,
    kind: ErrorKind,
) -> Result<T, AppError> {
    let response = builder.send().await.map_err(|e| send_error(e, what))?;
    let response = check_status(response, kind).await?;

    response
        .json()
        .await
        .map_err(|e| AppError::Serialization(format!("Failed to parse {} response: {}", what, e)))
}

fn send_error(err: reqwest::Error, what: &str) -> AppError {
    if err.is_timeout() {
        AppError::Connection(format!("{} timed out", what))
    } else if err.is_connect() {
        AppError::Connection(format!("Cannot reach the transfer service: {}", err))
    } else {
        AppError::Connection(format!("{} request failed: {}", what, err))
    }
}

async fn check_status(response: Response, kind: ErrorKind) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_detail(&body).unwrap_or_else(|| format!("Service returned {}", status));
    tracing::warn!("Transfer service returned {}: {}", status, message);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Auth(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        _ => kind(message),
    })
}

/// FastAPI puts its message under `detail`; fall back to the raw body
fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(detail) => Some(detail.to_string()),
            None => Some(body.to_string()),
        },
        _ => Some(body.to_string()),
    }
}
