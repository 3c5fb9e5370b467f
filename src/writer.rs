//! Output writer — atomic CSV batch appends to a single shared stream
//!
//! The writer is shared by every worker. A batch is rendered to a string
//! before the lock is taken, then appended and flushed under one lock
//! acquisition, so rows of one identifier's batch are always contiguous in
//! the output regardless of concurrent completions. Ordering across batches
//! is completion order and deliberately unspecified.

use crate::error::Result;
use crate::types::{COLUMNS, Row};
use std::io::Write;
use tokio::sync::Mutex;

/// Field separator of the output format
const SEPARATOR: char = ',';

/// Mutex-guarded CSV sink shared across workers
pub struct CsvWriter<W: Write + Send> {
    sink: Mutex<W>,
}

impl<W: Write + Send> CsvWriter<W> {
    /// Wrap a sink. The caller writes the header exactly once, before any
    /// worker starts producing batches.
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Write the 21-column header row.
    pub async fn write_header(&self) -> Result<()> {
        let header = render_record(COLUMNS.iter().map(|c| c.to_string()));
        let mut sink = self.sink.lock().await;
        sink.write_all(header.as_bytes())?;
        sink.flush()?;
        Ok(())
    }

    /// Append one row batch contiguously.
    ///
    /// The whole batch is a single guarded write, so concurrent callers can
    /// never interleave rows within each other's batches.
    pub async fn write_batch(&self, rows: &[Row]) -> Result<()> {
        let mut buffer = String::new();
        for row in rows {
            buffer.push_str(&render_record(row.to_record().into_iter()));
        }
        let mut sink = self.sink.lock().await;
        sink.write_all(buffer.as_bytes())?;
        sink.flush()?;
        Ok(())
    }

    /// Consume the writer and hand back the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}

/// Render one record as a separator-joined, escaped, newline-terminated line.
pub(crate) fn render_record(fields: impl Iterator<Item = String>) -> String {
    let mut line = String::new();
    for (index, field) in fields.enumerate() {
        if index > 0 {
            line.push(SEPARATOR);
        }
        line.push_str(&escape_field(&field));
    }
    line.push('\n');
    line
}

/// Quote a field when it contains the separator, a quote, or a line break;
/// embedded quotes are doubled.
fn escape_field(field: &str) -> String {
    if field.contains(SEPARATOR)
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
