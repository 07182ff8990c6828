//! Command-line argument parsing for the backup lister.
//!
//! Uses clap to parse CLI arguments and layer them over the config file.

use crate::app::BackupRequest;
use crate::config::{Config, ConnectionConfig};
use crate::error::{BackupError, Result};
use clap::Parser;
use std::path::PathBuf;

/// Show all backups taken for the databases on a SQL Server host.
#[derive(Parser, Debug)]
#[command(name = "backup-lister")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Host the SQL Server instance is running on [default: .]
    #[arg(short = 'H', long, value_name = "HOST")]
    pub hostname: Option<String>,

    /// Named instance on the host
    #[arg(short = 'i', long, value_name = "INSTANCE")]
    pub instance: Option<String>,

    /// Database to show backups for (all databases when omitted)
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// TCP port, skipping SQL Server Browser instance lookup
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,

    /// SQL login name (trusted authentication when omitted)
    #[arg(short = 'U', long, value_name = "USER")]
    pub user: Option<String>,

    /// Accept the server certificate without validation
    #[arg(long)]
    pub trust_server_certificate: bool,

    /// Use named connection from config
    #[arg(short = 'c', long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Connection settings given directly on the command line.
    pub fn to_connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: self.hostname.clone(),
            instance: self.instance.clone(),
            port: self.port,
            user: self.user.clone(),
            trust_server_certificate: self.trust_server_certificate,
            ..Default::default()
        }
    }

    /// Resolves the final connection configuration.
    ///
    /// Precedence, highest first: CLI arguments, the named (or default)
    /// connection from the config file, sqlcmd environment variables.
    pub fn resolve_connection(&self, config: &Config) -> Result<ConnectionConfig> {
        let mut connection = match &self.connection {
            Some(name) => config
                .get_connection(Some(name.as_str()))
                .cloned()
                .ok_or_else(|| {
                    BackupError::config(format!("Connection '{name}' not found in config file"))
                })?,
            None => config.get_connection(None).cloned().unwrap_or_default(),
        };

        connection.merge(&self.to_connection_config());
        connection.apply_env_defaults();
        Ok(connection)
    }

    /// Builds the request for a run.
    pub fn to_request(&self, config: &Config) -> Result<BackupRequest> {
        Ok(BackupRequest {
            connection: self.resolve_connection(config)?,
            database: self.database.clone(),
        })
    }
}
