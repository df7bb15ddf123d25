// SPDX-License-Identifier: AGPL-3.0
// Ingest Bridge Core - Table and column selection

use crate::types::ColumnDescriptor;
use std::collections::BTreeSet;

/// Discovered tables and columns, and the user's choice among them.
///
/// The selected set is always a subset of the available column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    tables: Vec<String>,
    chosen_table: Option<String>,
    available: Vec<ColumnDescriptor>,
    selected: BTreeSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn chosen_table(&self) -> Option<&str> {
        self.chosen_table.as_deref()
    }

    pub fn available_columns(&self) -> &[ColumnDescriptor] {
        &self.available
    }

    pub fn selected_columns(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    fn is_available(&self, name: &str) -> bool {
        self.available.iter().any(|c| c.name == name)
    }

    /// Replace the table list; the chosen table no longer applies
    pub fn replace_tables(&mut self, tables: Vec<String>) {
        self.tables = tables;
        self.chosen_table = None;
    }

    /// Drop the table list and chosen table
    pub fn clear_tables(&mut self) {
        self.tables.clear();
        self.chosen_table = None;
    }

    /// Set the chosen table; returns whether it changed
    pub fn choose_table(&mut self, table: Option<String>) -> bool {
        if self.chosen_table == table {
            return false;
        }
        self.chosen_table = table;
        true
    }

    /// Replace available columns and clear the selection
    pub fn replace_columns(&mut self, columns: Vec<ColumnDescriptor>) {
        self.available = columns;
        self.selected.clear();
    }

    /// Drop available columns and the selection
    pub fn clear_columns(&mut self) {
        self.available.clear();
        self.selected.clear();
    }

    /// Replace the selection wholesale. Names that are not available are
    /// dropped and returned.
    pub fn set_selected_columns<I>(&mut self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let (kept, dropped): (BTreeSet<String>, BTreeSet<String>) =
            names.into_iter().partition(|name| self.is_available(name));

        if !dropped.is_empty() {
            tracing::debug!("Ignoring unknown columns: {:?}", dropped);
        }
        self.selected = kept;
        dropped.into_iter().collect()
    }

    /// Flip one column in or out of the selection
    pub fn toggle_column(&mut self, name: &str) {
        let mut next = self.selected.clone();
        if !next.remove(name) {
            next.insert(name.to_string());
        }
        self.set_selected_columns(next);
    }

    pub fn select_all(&mut self) {
        let all: Vec<String> = self.available.iter().map(|c| c.name.clone()).collect();
        self.set_selected_columns(all);
    }

    pub fn unselect_all(&mut self) {
        self.set_selected_columns(Vec::new());
    }
}
