//! Backup Lister - SQL Server backup history reporting.
//!
//! This library exposes the core modules for use in integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod drivers;
pub mod error;
pub mod logging;
pub mod query;
pub mod report;
