//! Database abstraction layer.
//!
//! Provides a trait-based interface for opening a connection and streaming a
//! statement's result set, so the SQL Server client and the in-memory test
//! clients can be used interchangeably.

mod mock;
mod sqlserver;
mod types;

pub use mock::{BackupSetEntry, FailingDatabaseClient, MockDatabaseClient};
pub use sqlserver::{SqlServerClient, SqlServerConnector};
pub use types::{ColumnInfo, Row, Value};

use crate::config::ConnectionTarget;
use crate::error::Result;
use crate::query::Statement;
use async_trait::async_trait;

/// Receives a result set as it is read from the server.
pub trait RowSink: Send {
    /// Called once with the column metadata, before any row.
    fn columns(&mut self, columns: &[ColumnInfo]) -> Result<()>;

    /// Called for each row, in server order.
    fn row(&mut self, row: &[Value]) -> Result<()>;
}

/// Opens connections for a resolved target.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to the catalog database described by `target`.
    async fn connect(&self, target: &ConnectionTarget) -> Result<Box<dyn DatabaseClient>>;
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with BackupError.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Executes a statement and streams its result set into `sink`.
    async fn execute(&mut self, statement: &Statement, sink: &mut dyn RowSink) -> Result<()>;

    /// Closes the database connection.
    async fn close(self: Box<Self>) -> Result<()>;
}
