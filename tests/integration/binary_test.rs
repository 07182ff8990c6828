//! Process-level tests: exit statuses and stream separation.

use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output};

fn run_binary(registry_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_backup-lister"))
        .args(args)
        .arg("--config")
        .arg(registry_dir.join("missing-config.toml"))
        .env("ODBCSYSINI", registry_dir)
        .env_remove("ODBCINSTINI")
        .env_remove("SQLCMDSERVER")
        .env_remove("SQLCMDUSER")
        .env_remove("SQLCMDPASSWORD")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run backup-lister")
}

/// A local port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn test_no_driver_exits_with_config_status() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_binary(dir.path(), &["-H", "127.0.0.1", "-U", "sa"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.lines().count(), 1, "stderr: {stderr}");
    assert!(stderr.contains("no driver available"));
}

#[test]
fn test_refused_connection_exits_with_database_status() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("odbcinst.ini"),
        "[ODBC Driver 17 for SQL Server]\nDriver=/opt/microsoft/msodbcsql17/lib64/libmsodbcsql-17.so\n",
    )
    .unwrap();
    let port = closed_port().to_string();

    let output = run_binary(dir.path(), &["-H", "127.0.0.1", "-p", &port, "-U", "sa"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.lines().count(), 1, "stderr: {stderr}");
    assert!(stderr.contains("Database Error"));
}

#[test]
fn test_trusted_auth_refused_connection_exits_with_database_status() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("odbcinst.ini"), "[FreeTDS]\n").unwrap();
    let port = closed_port().to_string();

    let output = run_binary(dir.path(), &["-H", "127.0.0.1", "-p", &port]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.lines().count(), 1, "stderr: {stderr}");
    assert!(stderr.contains("Database Error"));
}

#[test]
fn test_empty_database_name_exits_with_unexpected_status() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("odbcinst.ini"), "[FreeTDS]\n").unwrap();

    let output = run_binary(dir.path(), &["-H", "127.0.0.1", "-U", "sa", "-d", ""]);

    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());
}
