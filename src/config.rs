//! Configuration management for the backup lister.
//!
//! Handles loading named connections from a TOML file, layering environment
//! defaults, and resolving everything into the `ConnectionTarget` used to
//! reach the server.

use crate::error::{BackupError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Host used when none is configured. `.` is the local default instance.
pub const DEFAULT_HOST: &str = ".";

/// Administrative database holding the backup catalog.
pub const CATALOG_DATABASE: &str = "msdb";

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Named server connections.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

/// How the connection authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    /// Identity of the calling process (integrated security).
    Trusted,
    /// SQL Server login with user name and password.
    Sql,
}

/// Server connection settings as written in the config file or on the CLI.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server host name.
    pub host: Option<String>,

    /// Named instance on the host.
    pub instance: Option<String>,

    /// TCP port, bypassing instance lookup.
    pub port: Option<u16>,

    /// Authentication kind. Inferred from `user` when absent.
    pub auth: Option<AuthKind>,

    /// SQL login name.
    pub user: Option<String>,

    /// SQL login password (not recommended to store in config).
    pub password: Option<String>,

    /// Driver to use instead of the ones discovered on the host.
    pub driver: Option<String>,

    /// Accept the server certificate without validation.
    #[serde(default)]
    pub trust_server_certificate: bool,
}

impl ConnectionConfig {
    /// Merges another config into this one, with the other taking precedence.
    pub fn merge(&mut self, other: &ConnectionConfig) {
        if other.host.is_some() {
            self.host = other.host.clone();
        }
        if other.instance.is_some() {
            self.instance = other.instance.clone();
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.auth.is_some() {
            self.auth = other.auth;
        }
        if other.user.is_some() {
            self.user = other.user.clone();
        }
        if other.password.is_some() {
            self.password = other.password.clone();
        }
        if other.driver.is_some() {
            self.driver = other.driver.clone();
        }
        self.trust_server_certificate |= other.trust_server_certificate;
    }

    /// Applies sqlcmd environment variables (SQLCMDSERVER, etc.) as defaults.
    pub fn apply_env_defaults(&mut self) {
        self.apply_defaults_from(|key| std::env::var(key).ok());
    }

    fn apply_defaults_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.host.is_none() {
            if let Some(server) = lookup("SQLCMDSERVER") {
                match server.split_once('\\') {
                    Some((host, instance)) => {
                        self.host = Some(host.to_string());
                        if self.instance.is_none() {
                            self.instance = Some(instance.to_string());
                        }
                    }
                    None => self.host = Some(server),
                }
            }
        }
        if self.user.is_none() {
            self.user = lookup("SQLCMDUSER");
        }
        if self.password.is_none() {
            self.password = lookup("SQLCMDPASSWORD");
        }
    }

    /// Resolves the authentication mode.
    pub fn auth_mode(&self) -> Result<AuthMode> {
        let kind = self.auth.unwrap_or(if self.user.is_some() {
            AuthKind::Sql
        } else {
            AuthKind::Trusted
        });

        match kind {
            AuthKind::Trusted => Ok(AuthMode::Trusted),
            AuthKind::Sql => {
                let user = self
                    .user
                    .clone()
                    .ok_or_else(|| BackupError::config("SQL authentication requires a user"))?;
                Ok(AuthMode::SqlServer {
                    user,
                    password: self.password.clone().unwrap_or_default(),
                })
            }
        }
    }

    /// Resolves into a connection target using the given driver.
    pub fn to_target(&self, driver: &str) -> Result<ConnectionTarget> {
        Ok(ConnectionTarget {
            host: self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
            instance: self.instance.clone().unwrap_or_default(),
            port: self.port,
            database: CATALOG_DATABASE.to_string(),
            auth: self.auth_mode()?,
            driver: driver.to_string(),
            trust_server_certificate: self.trust_server_certificate,
        })
    }
}

/// Authentication used for the connection.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Integrated security with the identity of the calling process.
    Trusted,
    /// Explicit SQL Server credentials.
    SqlServer { user: String, password: String },
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trusted => f.write_str("Trusted"),
            Self::SqlServer { user, .. } => f
                .debug_struct("SqlServer")
                .field("user", user)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// Everything needed to open the catalog connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub instance: String,
    pub port: Option<u16>,
    pub database: String,
    pub auth: AuthMode,
    pub driver: String,
    pub trust_server_certificate: bool,
}

impl ConnectionTarget {
    /// The server address, `host` or `host\instance`.
    pub fn address(&self) -> String {
        build_address(&self.host, &self.instance)
    }

    /// Returns a display-safe string (no credentials) for log output.
    pub fn display_string(&self) -> String {
        format!("{} @ {} via {}", self.database, self.address(), self.driver)
    }
}

/// Joins host and instance into a server address.
///
/// The instance is appended verbatim after a backslash; neither part is
/// validated.
pub fn build_address(host: &str, instance: &str) -> String {
    if instance.is_empty() {
        host.to_string()
    } else {
        format!("{host}\\{instance}")
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("backup-lister")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file is an empty config.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| BackupError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            // toml errors span several lines; keep the diagnostic on one.
            let detail = e.message().replace('\n', " ");
            BackupError::config(format!(
                "Configuration error in {}: {}",
                path.display(),
                detail
            ))
        })
    }

    /// Gets a named connection, or the default connection if name is None.
    pub fn get_connection(&self, name: Option<&str>) -> Option<&ConnectionConfig> {
        let key = name.unwrap_or("default");
        self.connections.get(key)
    }
}
