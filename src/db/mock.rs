//! Mock database clients for testing.
//!
//! `MockDatabaseClient` holds an in-memory backup catalog and answers the
//! backup history statement the way the server would: filtering on the bound
//! database name and ordering the rows. `FailingDatabaseClient` simulates a
//! server that refuses connections or rejects statements.

use super::{ColumnInfo, Connector, DatabaseClient, Row, RowSink, Value};
use crate::config::ConnectionTarget;
use crate::error::{BackupError, Result};
use crate::query::{BackupType, Statement, PROJECTED_COLUMNS};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::cmp::Reverse;
use std::sync::{Arc, Mutex};

/// One raw row of the joined backup-set and media-family catalogs.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupSetEntry {
    pub database_name: String,
    pub backup_start_date: NaiveDateTime,
    pub backup_finish_date: Option<NaiveDateTime>,
    pub backup_size: i64,
    /// Single-character catalog type code (`D`, `I`, `L`, ...).
    pub type_code: String,
    pub is_copy_only: bool,
    pub physical_device_name: String,
}

impl BackupSetEntry {
    fn to_row(&self) -> Row {
        vec![
            Value::from(self.database_name.as_str()),
            Value::from(self.backup_start_date),
            Value::from(self.backup_finish_date),
            Value::from(self.backup_size),
            Value::from(BackupType::from_code(&self.type_code).map(|t| t.label())),
            Value::from(self.is_copy_only),
            Value::from(self.physical_device_name.as_str()),
        ]
    }
}

/// A mock database client that answers from an in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct MockDatabaseClient {
    entries: Vec<BackupSetEntry>,
    omit_metadata: bool,
    executed: Arc<Mutex<Vec<Statement>>>,
}

impl MockDatabaseClient {
    /// Creates a new mock client with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock client holding the given catalog entries.
    pub fn with_entries(entries: Vec<BackupSetEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Makes the client return rows without column metadata.
    pub fn without_metadata(mut self) -> Self {
        self.omit_metadata = true;
        self
    }

    /// Statements executed so far, across every connection from this mock.
    pub fn executed(&self) -> Vec<Statement> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn select(&self, statement: &Statement) -> Vec<&BackupSetEntry> {
        let filter = statement.params.first();
        let mut rows: Vec<&BackupSetEntry> = self
            .entries
            .iter()
            .filter(|e| filter.map_or(true, |name| &e.database_name == name))
            .collect();

        if filter.is_some() {
            rows.sort_by_key(|e| Reverse(e.backup_start_date));
        } else {
            rows.sort_by(|a, b| {
                a.database_name
                    .cmp(&b.database_name)
                    .then(b.backup_start_date.cmp(&a.backup_start_date))
            });
        }
        rows
    }
}

#[async_trait]
impl Connector for MockDatabaseClient {
    async fn connect(&self, _target: &ConnectionTarget) -> Result<Box<dyn DatabaseClient>> {
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute(&mut self, statement: &Statement, sink: &mut dyn RowSink) -> Result<()> {
        if let Ok(mut log) = self.executed.lock() {
            log.push(statement.clone());
        }

        if !self.omit_metadata {
            let columns: Vec<ColumnInfo> = PROJECTED_COLUMNS
                .iter()
                .map(|name| ColumnInfo::new(*name))
                .collect();
            sink.columns(&columns)?;
        }

        for entry in self.select(statement) {
            sink.row(&entry.to_row())?;
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Where a `FailingDatabaseClient` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailurePoint {
    Connect,
    Execute,
}

/// A database client whose server refuses connections or statements.
#[derive(Debug, Clone)]
pub struct FailingDatabaseClient {
    failure: FailurePoint,
    message: String,
}

impl FailingDatabaseClient {
    /// Fails every connection attempt with the given message.
    pub fn refusing(message: impl Into<String>) -> Self {
        Self {
            failure: FailurePoint::Connect,
            message: message.into(),
        }
    }

    /// Connects, then rejects every statement with the given message.
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self {
            failure: FailurePoint::Execute,
            message: message.into(),
        }
    }
}

#[async_trait]
impl Connector for FailingDatabaseClient {
    async fn connect(&self, target: &ConnectionTarget) -> Result<Box<dyn DatabaseClient>> {
        match self.failure {
            FailurePoint::Connect => Err(BackupError::database(format!(
                "Cannot connect to {}: {}",
                target.address(),
                self.message
            ))),
            FailurePoint::Execute => Ok(Box::new(self.clone())),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute(&mut self, _statement: &Statement, _sink: &mut dyn RowSink) -> Result<()> {
        Err(BackupError::database(self.message.clone()))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
