//! One backup listing run: driver resolution, target building, query
//! construction, execution and rendering, in that order.

use crate::config::ConnectionConfig;
use crate::db::Connector;
use crate::drivers::resolve_driver;
use crate::error::Result;
use crate::query::BackupQuery;
use crate::report;
use std::io::Write;
use tracing::{debug, info};

/// Parsed inputs for a run.
#[derive(Debug, Clone, Default)]
pub struct BackupRequest {
    /// Server connection settings after CLI/config/env layering.
    pub connection: ConnectionConfig,

    /// Database to list backups for; `None` lists every database.
    pub database: Option<String>,
}

/// Lists backups and writes the report to `out`.
///
/// Configuration problems are detected before any connection is attempted.
/// The connection is released on every path. Returns the number of rows.
pub async fn run<W: Write + Send>(
    request: &BackupRequest,
    drivers: &[String],
    connector: &dyn Connector,
    out: W,
) -> Result<usize> {
    let driver = resolve_driver(drivers)?;
    let target = request.connection.to_target(driver)?;
    info!("Using driver '{}' for {}", driver, target.address());

    let query = BackupQuery::from_database(request.database.as_deref())?;
    let statement = query.build();
    debug!(
        "Listing backups for {}",
        query.database_name().unwrap_or("all databases")
    );

    let mut client = connector.connect(&target).await?;
    let outcome = report::list_backups(client.as_mut(), &statement, out).await;

    if let Err(e) = client.close().await {
        debug!("Error while closing connection: {}", e);
    }

    outcome
}
