//! Tab-separated rendering of backup history.
//!
//! Writes one header line of column names followed by one line per row, in
//! the order the server returned them. NULL cells become empty fields. A
//! reader that goes away early (`backup-lister | head`) ends output quietly.

use crate::db::{ColumnInfo, DatabaseClient, RowSink, Value};
use crate::error::{BackupError, Result};
use crate::query::Statement;
use std::io::{self, Write};
use tracing::debug;

const FIELD_SEPARATOR: &str = "\t";

/// Renders a result set as tab-separated lines.
pub struct TsvWriter<W: Write> {
    out: W,
    rows: usize,
    /// Set once the reader has closed its end of the pipe.
    closed: bool,
}

impl<W: Write> TsvWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            rows: 0,
            closed: false,
        }
    }

    /// Number of data rows written so far.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        if !self.closed {
            let flushed = self.out.flush();
            self.check(flushed)?;
        }
        Ok(self.out)
    }

    fn write_line(&mut self, fields: impl Iterator<Item = String>) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let line = fields.collect::<Vec<_>>().join(FIELD_SEPARATOR);
        let written = writeln!(self.out, "{line}");
        self.check(written)
    }

    fn check(&mut self, result: io::Result<()>) -> Result<()> {
        match result {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                debug!("Output closed by reader, discarding remaining rows");
                self.closed = true;
                Ok(())
            }
            other => other.map_err(write_error),
        }
    }
}

impl<W: Write + Send> RowSink for TsvWriter<W> {
    fn columns(&mut self, columns: &[ColumnInfo]) -> Result<()> {
        self.write_line(columns.iter().map(|c| c.name.clone()))
    }

    fn row(&mut self, row: &[Value]) -> Result<()> {
        self.write_line(row.iter().map(Value::to_display_string))?;
        if !self.closed {
            self.rows += 1;
        }
        Ok(())
    }
}

fn write_error(err: io::Error) -> BackupError {
    BackupError::unexpected(format!("Failed to write output: {err}"))
}

/// Executes the statement on an open connection and renders the result.
///
/// Returns the number of data rows written.
pub async fn list_backups<W: Write + Send>(
    client: &mut dyn DatabaseClient,
    statement: &Statement,
    out: W,
) -> Result<usize> {
    let mut writer = TsvWriter::new(out);
    client.execute(statement, &mut writer).await?;
    let rows = writer.row_count();
    writer.finish()?;
    debug!("Rendered {} backup rows", rows);
    Ok(rows)
}
