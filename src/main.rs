//! Backup Lister - show the backups taken for the databases on a SQL Server host.

use backup_lister::app;
use backup_lister::cli::Cli;
use backup_lister::config::Config;
use backup_lister::db::SqlServerConnector;
use backup_lister::drivers;
use backup_lister::error::{BackupError, Result};
use backup_lister::logging;
use std::io::{self, BufWriter};
use std::process::ExitCode;
use tracing::info;

fn main() -> ExitCode {
    logging::init_stderr_logging();

    let cli = Cli::parse_args();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.diagnostic());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let request = cli.to_request(&config)?;
    let drivers = match &request.connection.driver {
        Some(driver) => vec![driver.clone()],
        None => drivers::installed_drivers(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| BackupError::unexpected(format!("Failed to start runtime: {e}")))?;

    let out = BufWriter::new(io::stdout());
    let rows = runtime.block_on(app::run(&request, &drivers, &SqlServerConnector, out))?;
    info!("Listed {} backups", rows);

    Ok(())
}
