//! End-to-end report tests against the mock catalog.

use backup_lister::app::{self, BackupRequest};
use backup_lister::config::ConnectionConfig;
use backup_lister::db::{BackupSetEntry, FailingDatabaseClient, MockDatabaseClient};
use backup_lister::error::BackupError;
use backup_lister::query::PROJECTED_COLUMNS;
use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn sales_full_backup() -> BackupSetEntry {
    BackupSetEntry {
        database_name: "Sales".to_string(),
        backup_start_date: at(1, 2, 0),
        backup_finish_date: Some(at(1, 2, 5)),
        backup_size: 1048576,
        type_code: "D".to_string(),
        is_copy_only: false,
        physical_device_name: "\\\\backupsrv\\sales.bak".to_string(),
    }
}

fn request(database: Option<&str>) -> BackupRequest {
    BackupRequest {
        connection: ConnectionConfig {
            host: Some("srv".to_string()),
            user: Some("reporter".to_string()),
            password: Some("pw".to_string()),
            ..Default::default()
        },
        database: database.map(String::from),
    }
}

fn drivers() -> Vec<String> {
    vec![
        "PostgreSQL Unicode".to_string(),
        "ODBC Driver 18 for SQL Server".to_string(),
    ]
}

async fn render(
    request: &BackupRequest,
    mock: &MockDatabaseClient,
) -> Result<String, BackupError> {
    let mut out = Vec::new();
    app::run(request, &drivers(), mock, &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_single_row_all_databases() {
    let mock = MockDatabaseClient::with_entries(vec![sales_full_backup()]);

    let output = render(&request(None), &mock).await.unwrap();

    let expected = format!(
        "{}\n{}\n",
        PROJECTED_COLUMNS.join("\t"),
        "Sales\t2024-01-01T02:00:00\t2024-01-01T02:05:00\t1048576\tFull\tFalse\t\\\\backupsrv\\sales.bak"
    );
    assert_eq!(output, expected);
    assert_eq!(output.lines().count(), 2);
}

#[tokio::test]
async fn test_header_matches_projection() {
    let mock = MockDatabaseClient::with_entries(vec![sales_full_backup()]);

    let output = render(&request(None), &mock).await.unwrap();

    assert_eq!(
        output.lines().next().unwrap(),
        "database_name\tbackup_start_date\tbackup_finish_date\tbackup_size\tbackup_type\tis_copy_only\tphysical_device_name"
    );
}

#[tokio::test]
async fn test_null_finish_date_is_empty_field() {
    let mut entry = sales_full_backup();
    entry.backup_finish_date = None;
    let mock = MockDatabaseClient::with_entries(vec![entry]);

    let output = render(&request(None), &mock).await.unwrap();

    let row = output.lines().nth(1).unwrap();
    let fields: Vec<&str> = row.split('\t').collect();
    assert_eq!(fields.len(), 7);
    assert_eq!(fields[2], "");
    assert!(!row.contains("null") && !row.contains("None") && !row.contains("NULL"));
}

#[tokio::test]
async fn test_backup_type_labels() {
    let entries = ["D", "I", "L", "G"]
        .iter()
        .enumerate()
        .map(|(i, code)| BackupSetEntry {
            backup_start_date: at(1, i as u32, 0),
            type_code: code.to_string(),
            ..sales_full_backup()
        })
        .collect();
    let mock = MockDatabaseClient::with_entries(entries);

    let output = render(&request(Some("Sales")), &mock).await.unwrap();

    let labels: Vec<&str> = output
        .lines()
        .skip(1)
        .map(|line| line.split('\t').nth(4).unwrap())
        .collect();
    // Most recent first: G, L, I, D
    assert_eq!(labels, vec!["", "Log", "Differential", "Full"]);
}

#[tokio::test]
async fn test_single_database_filter() {
    let mut other = sales_full_backup();
    other.database_name = "HR".to_string();
    let mock = MockDatabaseClient::with_entries(vec![sales_full_backup(), other]);

    let output = render(&request(Some("HR")), &mock).await.unwrap();

    assert_eq!(output.lines().count(), 2);
    assert!(output.lines().nth(1).unwrap().starts_with("HR\t"));

    let executed = mock.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].params, vec!["HR".to_string()]);
    assert!(executed[0].sql.contains("WHERE"));
}

#[tokio::test]
async fn test_all_databases_sends_no_parameters() {
    let mock = MockDatabaseClient::with_entries(vec![sales_full_backup()]);

    render(&request(None), &mock).await.unwrap();

    let executed = mock.executed();
    assert!(executed[0].params.is_empty());
    assert!(!executed[0].sql.contains("WHERE"));
}

#[tokio::test]
async fn test_no_metadata_renders_rows_only() {
    let mock = MockDatabaseClient::with_entries(vec![sales_full_backup()]).without_metadata();

    let output = render(&request(None), &mock).await.unwrap();

    assert_eq!(output.lines().count(), 1);
    assert!(output.starts_with("Sales\t"));
}

#[tokio::test]
async fn test_empty_catalog_prints_header_only() {
    let mock = MockDatabaseClient::new();

    let output = render(&request(None), &mock).await.unwrap();

    assert_eq!(output, format!("{}\n", PROJECTED_COLUMNS.join("\t")));
}

#[tokio::test]
async fn test_empty_driver_list() {
    let mock = MockDatabaseClient::with_entries(vec![sales_full_backup()]);
    let mut out = Vec::new();

    let err = app::run(&request(None), &[], &mock, &mut out)
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert!(out.is_empty());
    assert!(mock.executed().is_empty());
    assert_eq!(err.diagnostic().lines().count(), 1);
}

#[tokio::test]
async fn test_connection_refused() {
    let failing = FailingDatabaseClient::refusing("Connection refused (os error 111)");
    let mut out = Vec::new();

    let err = app::run(&request(None), &drivers(), &failing, &mut out)
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 2);
    assert!(out.is_empty());
    assert!(err.to_string().contains("Connection refused"));
    assert!(err.to_string().contains("srv"));
}

#[tokio::test]
async fn test_statement_rejected() {
    let failing = FailingDatabaseClient::rejecting("The SELECT permission was denied");
    let mut out = Vec::new();

    let err = app::run(&request(Some("master")), &drivers(), &failing, &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, BackupError::Database(_)));
    assert!(out.is_empty());
}
