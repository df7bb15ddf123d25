// SPDX-License-Identifier: AGPL-3.0
// Ingest Bridge Core - Configuration model
//
// Endpoint choices and per-endpoint configuration for the session.
// Lives in memory only.

use crate::types::{
    AppError, DatabaseConfig, DatabaseConfigUpdate, Endpoint, FileConfig, FileConfigUpdate,
};

/// Notification emitted when the configuration actually changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    /// Source changed; the target may have been moved along with it
    SourceChanged,
    TargetChanged,
    DatabaseChanged,
    FileChanged,
}

/// Current endpoint choices and their configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigModel {
    source: Endpoint,
    target: Endpoint,
    database: DatabaseConfig,
    file: FileConfig,
}

impl Default for ConfigModel {
    fn default() -> Self {
        Self {
            source: Endpoint::Database,
            target: Endpoint::File,
            database: DatabaseConfig::default(),
            file: FileConfig::default(),
        }
    }
}

impl ConfigModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Endpoint {
        self.source
    }

    pub fn target(&self) -> Endpoint {
        self.target
    }

    pub fn database(&self) -> &DatabaseConfig {
        &self.database
    }

    pub fn file(&self) -> &FileConfig {
        &self.file
    }

    /// Whether `endpoint` is currently used on either side
    pub fn uses(&self, endpoint: Endpoint) -> bool {
        self.source == endpoint || self.target == endpoint
    }

    /// Whether a target option should be offered; the source's own endpoint never is
    pub fn target_enabled(&self, endpoint: Endpoint) -> bool {
        endpoint != self.source
    }

    /// Choose the source endpoint.
    ///
    /// Picking the current target as source moves the target to the only
    /// endpoint left, so source and target never match.
    pub fn set_source(&mut self, endpoint: Endpoint) -> Option<ConfigChange> {
        if self.source == endpoint {
            return None;
        }

        self.source = endpoint;
        if self.target == endpoint {
            self.target = endpoint.other();
            tracing::info!(
                "Target moved to {} to keep it apart from the source",
                self.target.label()
            );
        }

        tracing::info!("Source set to {}", endpoint.label());
        Some(ConfigChange::SourceChanged)
    }

    /// Choose the target endpoint; the source's endpoint is not selectable
    pub fn set_target(&mut self, endpoint: Endpoint) -> Result<Option<ConfigChange>, AppError> {
        if !self.target_enabled(endpoint) {
            return Err(AppError::Precondition(format!(
                "{} is already the source",
                endpoint.label()
            )));
        }
        if self.target == endpoint {
            return Ok(None);
        }

        self.target = endpoint;
        tracing::info!("Target set to {}", endpoint.label());
        Ok(Some(ConfigChange::TargetChanged))
    }

    pub fn update_database_config(&mut self, update: DatabaseConfigUpdate) -> Option<ConfigChange> {
        if self.database.apply(update) {
            tracing::debug!("Database config updated: {:?}", self.database);
            Some(ConfigChange::DatabaseChanged)
        } else {
            None
        }
    }

    pub fn update_file_config(&mut self, update: FileConfigUpdate) -> Option<ConfigChange> {
        if self.file.apply(update) {
            tracing::debug!("File config updated: {:?}", self.file);
            Some(ConfigChange::FileChanged)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_apart(model: &ConfigModel) {
        assert_ne!(model.source(), model.target());
        assert!(!model.target_enabled(model.source()));
    }

    #[test]
    fn test_defaults() {
        let model = ConfigModel::new();
        assert_eq!(model.source(), Endpoint::Database);
        assert_eq!(model.target(), Endpoint::File);
        assert_eq!(model.database().port, 8123);
        assert_eq!(model.file().delimiter, ',');
    }

    #[test]
    fn test_source_and_target_never_match() {
        for first in Endpoint::ALL {
            for second in Endpoint::ALL {
                let mut model = ConfigModel::new();
                model.set_source(first);
                assert_apart(&model);
                let _ = model.set_target(second);
                assert_apart(&model);
                model.set_source(second);
                assert_apart(&model);
                let _ = model.set_target(first);
                assert_apart(&model);
            }
        }
    }

    #[test]
    fn test_set_source_moves_target() {
        let mut model = ConfigModel::new();
        assert_eq!(model.set_source(Endpoint::File), Some(ConfigChange::SourceChanged));
        assert_eq!(model.target(), Endpoint::Database);
        assert_eq!(model.set_source(Endpoint::File), None);
    }

    #[test]
    fn test_set_target_rejects_source() {
        let mut model = ConfigModel::new();
        let err = model.set_target(Endpoint::Database).unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(model.target(), Endpoint::File);
        assert_eq!(model.set_target(Endpoint::File).unwrap(), None);
    }

    #[test]
    fn test_updates_report_changes() {
        let mut model = ConfigModel::new();
        assert_eq!(
            model.update_database_config(DatabaseConfigUpdate::default().host("h")),
            Some(ConfigChange::DatabaseChanged)
        );
        assert_eq!(
            model.update_database_config(DatabaseConfigUpdate::default().host("h")),
            None
        );
        assert_eq!(
            model.update_file_config(FileConfigUpdate::default().delimiter(';')),
            Some(ConfigChange::FileChanged)
        );
        assert_eq!(model.file().delimiter, ';');
        assert!(model.uses(Endpoint::File));
    }
}
