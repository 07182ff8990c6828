//! SQL Server database client implementation.
//!
//! Provides `SqlServerClient`, which implements the `DatabaseClient` trait
//! over TDS using tiberius. Named instances are resolved through the SQL
//! Server Browser service.

use crate::config::{AuthMode, ConnectionTarget};
use crate::db::{ColumnInfo, Connector, DatabaseClient, RowSink, Value};
use crate::drivers::requires_encryption;
use crate::error::{BackupError, Result};
use crate::query::Statement;
use async_trait::async_trait;
use futures::TryStreamExt;
use tiberius::numeric::Numeric;
use tiberius::{
    AuthMethod, Client, ColumnData, Config, EncryptionLevel, FromSql, SqlBrowser, ToSql,
};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

type MssqlClient = Client<Compat<TcpStream>>;

/// Host aliases that name the local machine.
const LOCAL_HOST_ALIASES: [&str; 2] = [".", "(local)"];

const APPLICATION_NAME: &str = "backup-lister";

/// Opens `SqlServerClient` connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerConnector;

#[async_trait]
impl Connector for SqlServerConnector {
    async fn connect(&self, target: &ConnectionTarget) -> Result<Box<dyn DatabaseClient>> {
        let client = SqlServerClient::connect(target).await?;
        Ok(Box::new(client))
    }
}

/// SQL Server database client holding one connection.
pub struct SqlServerClient {
    client: MssqlClient,
}

impl SqlServerClient {
    /// Connects to the target. Authentication failures and unreachable hosts
    /// surface as database errors; there is no retry.
    pub async fn connect(target: &ConnectionTarget) -> Result<Self> {
        let config = build_config(target);

        debug!("Connecting to {}", target.display_string());
        let tcp = TcpStream::connect_named(&config)
            .await
            .map_err(|e| connection_error(target, e))?;
        tcp.set_nodelay(true).ok();

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| connection_error(target, e))?;

        debug!("Connected to {}", target.address());
        Ok(Self { client })
    }
}

#[async_trait]
impl DatabaseClient for SqlServerClient {
    async fn execute(&mut self, statement: &Statement, sink: &mut dyn RowSink) -> Result<()> {
        let params: Vec<&dyn ToSql> = statement
            .params
            .iter()
            .map(|p| p as &dyn ToSql)
            .collect();

        let mut stream = self.client.query(statement.sql.as_str(), &params).await?;

        let columns: Option<Vec<ColumnInfo>> = stream.columns().await?.map(|columns| {
            columns
                .iter()
                .map(|col| ColumnInfo::new(col.name()))
                .collect()
        });
        if let Some(columns) = columns {
            sink.columns(&columns)?;
        }

        let mut rows = stream.into_row_stream();
        let mut count = 0usize;
        while let Some(row) = rows.try_next().await? {
            let values: Vec<Value> = row
                .cells()
                .map(|(_, data)| convert_column_data(data))
                .collect();
            sink.row(&values)?;
            count += 1;
        }

        debug!("Streamed {} rows", count);
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

/// Builds a tiberius Config from a ConnectionTarget.
fn build_config(target: &ConnectionTarget) -> Config {
    let mut config = Config::new();

    let host = if LOCAL_HOST_ALIASES.contains(&target.host.to_lowercase().as_str()) {
        "localhost"
    } else {
        target.host.as_str()
    };
    config.host(host);
    if !target.instance.is_empty() {
        config.instance_name(&target.instance);
    }
    if let Some(port) = target.port {
        config.port(port);
    }

    config.database(&target.database);
    config.application_name(APPLICATION_NAME);
    config.authentication(auth_method(&target.auth));

    config.encryption(if requires_encryption(&target.driver) {
        EncryptionLevel::Required
    } else {
        EncryptionLevel::Off
    });
    if target.trust_server_certificate {
        config.trust_cert();
    }

    config
}

/// Trusted authentication uses SSPI on Windows and Kerberos elsewhere.
fn auth_method(auth: &AuthMode) -> AuthMethod {
    match auth {
        AuthMode::Trusted => AuthMethod::Integrated,
        AuthMode::SqlServer { user, password } => AuthMethod::sql_server(user, password),
    }
}

fn connection_error(target: &ConnectionTarget, err: tiberius::error::Error) -> BackupError {
    match BackupError::from(err) {
        BackupError::Database(msg) => {
            BackupError::database(format!("Cannot connect to {}: {msg}", target.address()))
        }
        other => other,
    }
}

/// Converts a tiberius cell into a report value.
fn convert_column_data(data: &ColumnData<'static>) -> Value {
    match data {
        ColumnData::Bit(Some(b)) => Value::Bool(*b),
        ColumnData::U8(Some(v)) => Value::Int(i64::from(*v)),
        ColumnData::I16(Some(v)) => Value::Int(i64::from(*v)),
        ColumnData::I32(Some(v)) => Value::Int(i64::from(*v)),
        ColumnData::I64(Some(v)) => Value::Int(*v),
        ColumnData::F32(Some(v)) => Value::Float(f64::from(*v)),
        ColumnData::F64(Some(v)) => Value::Float(*v),
        ColumnData::Numeric(Some(n)) => Value::Decimal(format_numeric(n)),
        ColumnData::String(Some(s)) => Value::String(s.to_string()),
        ColumnData::Guid(Some(g)) => Value::String(g.to_string()),
        ColumnData::Binary(Some(b)) => Value::Bytes(b.to_vec()),
        ColumnData::DateTime(Some(_))
        | ColumnData::SmallDateTime(Some(_))
        | ColumnData::DateTime2(Some(_)) => {
            chrono::NaiveDateTime::from_sql(data)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::DateTime)
        }
        // All None variants and types the backup catalog never returns
        _ => Value::Null,
    }
}

/// Renders a decimal without a trailing fraction when its scale is zero.
fn format_numeric(n: &Numeric) -> String {
    if n.scale() == 0 {
        n.value().to_string()
    } else {
        n.to_string()
    }
}
