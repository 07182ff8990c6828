//! Backup history query construction.
//!
//! Produces the SQL text and bound parameter list for the two statement
//! variants: every database, or a single database selected by name. The
//! database name is only ever bound as a parameter, never spliced into text.

use crate::error::{BackupError, Result};

/// Columns projected by both statement variants, in output order.
pub const PROJECTED_COLUMNS: [&str; 7] = [
    "database_name",
    "backup_start_date",
    "backup_finish_date",
    "backup_size",
    "backup_type",
    "is_copy_only",
    "physical_device_name",
];

/// Kind of backup, decoded from the single-character catalog type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackupType {
    Full,
    Differential,
    Log,
}

impl BackupType {
    /// All labelled backup types, in the order the CASE expression lists them.
    pub const ALL: [BackupType; 3] = [Self::Full, Self::Differential, Self::Log];

    /// Decodes a catalog type code. Unknown codes have no label.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "D" => Some(Self::Full),
            "I" => Some(Self::Differential),
            "L" => Some(Self::Log),
            _ => None,
        }
    }

    /// The catalog type code for this backup type.
    pub fn code(&self) -> char {
        match self {
            Self::Full => 'D',
            Self::Differential => 'I',
            Self::Log => 'L',
        }
    }

    /// The label reported in the `backup_type` column.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::Differential => "Differential",
            Self::Log => "Log",
        }
    }
}

/// Which backups to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupQuery {
    /// Every database on the instance.
    AllDatabases,
    /// A single database, matched exactly by name.
    Database(String),
}

impl BackupQuery {
    /// Builds a query from an optional `--database` value.
    ///
    /// No value lists every database. An empty name is rejected.
    pub fn from_database(database: Option<&str>) -> Result<Self> {
        match database {
            None => Ok(Self::AllDatabases),
            Some("") => Err(BackupError::unexpected("database name must not be empty")),
            Some(name) => Ok(Self::Database(name.to_string())),
        }
    }

    /// The database filter, if any.
    pub fn database_name(&self) -> Option<&str> {
        match self {
            Self::AllDatabases => None,
            Self::Database(name) => Some(name),
        }
    }

    /// Produces the statement text and its bound parameters.
    pub fn build(&self) -> Statement {
        let mut sql = select_clause();
        let mut params = Vec::new();

        match self {
            Self::AllDatabases => {
                sql.push_str("ORDER BY bs.database_name ASC, bs.backup_start_date DESC");
            }
            Self::Database(name) => {
                sql.push_str("WHERE bs.database_name = @P1\n");
                sql.push_str("ORDER BY bs.backup_start_date DESC");
                params.push(name.clone());
            }
        }

        Statement { sql, params }
    }
}

/// SQL text plus the values bound to its `@P1..@Pn` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

fn select_clause() -> String {
    let mut case = String::from("CASE bs.type");
    for kind in BackupType::ALL {
        case.push_str(&format!(" WHEN '{}' THEN '{}'", kind.code(), kind.label()));
    }
    case.push_str(" ELSE NULL END");

    format!(
        "SELECT\n    \
             bs.database_name,\n    \
             bs.backup_start_date,\n    \
             bs.backup_finish_date,\n    \
             bs.backup_size,\n    \
             {case} AS backup_type,\n    \
             bs.is_copy_only,\n    \
             bmf.physical_device_name\n\
         FROM msdb.dbo.backupset AS bs\n\
         INNER JOIN msdb.dbo.backupmediafamily AS bmf\n    \
             ON bs.media_set_id = bmf.media_set_id\n"
    )
}
