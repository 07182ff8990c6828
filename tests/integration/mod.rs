//! Integration tests for the backup lister.

pub mod binary_test;
pub mod report_test;
