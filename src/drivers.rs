//! Database client driver selection.
//!
//! The resolver is a pure function over the list of installed driver names.
//! Discovery reads the ODBC installer registry (`odbcinst.ini`) so that the
//! list reflects what the host actually has installed.

use crate::error::{BackupError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Substrings that identify a SQL Server driver, matched case-sensitively.
const SQL_SERVER_MARKERS: [&str; 2] = ["ODBC Driver", "SQL Server"];

/// Sections of `odbcinst.ini` that are bookkeeping, not drivers.
const RESERVED_SECTIONS: [&str; 2] = ["ODBC", "ODBC Drivers"];

/// First ODBC Driver major version that encrypts connections by default.
const MANDATORY_ENCRYPTION_VERSION: u32 = 18;

/// Picks the driver to connect with.
///
/// Returns the first entry naming a SQL Server driver, or the first entry
/// when none does. An empty list is a configuration error.
pub fn resolve_driver(drivers: &[String]) -> Result<&str> {
    let preferred = drivers
        .iter()
        .find(|name| SQL_SERVER_MARKERS.iter().any(|m| name.contains(m)));

    preferred
        .or_else(|| drivers.first())
        .map(String::as_str)
        .ok_or_else(|| BackupError::config("no driver available"))
}

/// Returns true if connections made through this driver must be encrypted.
///
/// Microsoft ODBC Driver 18 and later switched the default to mandatory
/// encryption; older drivers only encrypt the login packet.
pub fn requires_encryption(driver: &str) -> bool {
    driver_major_version(driver).is_some_and(|v| v >= MANDATORY_ENCRYPTION_VERSION)
}

fn driver_major_version(driver: &str) -> Option<u32> {
    let rest = driver.split("ODBC Driver ").nth(1)?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Lists installed drivers from the ODBC installer registry.
///
/// A missing or unreadable registry means no driver manager is installed and
/// yields an empty list.
pub fn installed_drivers() -> Vec<String> {
    let path = registry_path();
    debug!("Reading driver registry from {}", path.display());
    read_registry(&path)
}

/// Location of `odbcinst.ini`, honouring `ODBCSYSINI` and `ODBCINSTINI`.
pub fn registry_path() -> PathBuf {
    let dir = std::env::var_os("ODBCSYSINI")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/etc"));
    let file = std::env::var_os("ODBCINSTINI")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("odbcinst.ini"));
    dir.join(file)
}

/// Reads driver names from an `odbcinst.ini` file.
pub fn read_registry(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_registry(&content),
        Err(e) => {
            debug!("No driver registry at {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Extracts driver section names from `odbcinst.ini` content, in file order.
pub fn parse_registry(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('[')?.strip_suffix(']'))
        .map(str::trim)
        .filter(|name| !name.is_empty() && !RESERVED_SECTIONS.contains(name))
        .map(String::from)
        .collect()
}
