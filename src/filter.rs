//! Post-hoc row filter over already-produced CSV output
//!
//! Reads a complete CSV document (header first), keeps only data rows whose
//! named column equals a given value, and re-emits header plus survivors.
//! The parser is the inverse of the writer's quoting: it honors quoted
//! fields with embedded separators, doubled quotes, and line breaks.

use crate::error::{Error, Result};
use crate::writer::render_record;
use std::io::{Read, Write};

/// Filter `input` CSV to rows where `column` equals `value`, writing the
/// surviving document to `output`.
pub fn filter_rows<R: Read, W: Write>(
    mut input: R,
    output: &mut W,
    column: &str,
    value: &str,
) -> Result<()> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;

    let mut records = parse_records(&text)?.into_iter();
    let header = records
        .next()
        .ok_or_else(|| Error::MalformedRecord("input has no header row".to_string()))?;
    let index = header
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| Error::UnknownColumn(column.to_string()))?;

    output.write_all(render_record(header.into_iter()).as_bytes())?;

    let mut kept = 0usize;
    let mut total = 0usize;
    for record in records {
        total += 1;
        if record.get(index).map(String::as_str) == Some(value) {
            output.write_all(render_record(record.into_iter()).as_bytes())?;
            kept += 1;
        }
    }
    output.flush()?;
    tracing::info!(kept, total, column, "Filtered rows");
    Ok(())
}

/// Parse a CSV document into records of unescaped fields.
///
/// Handles quoted fields (embedded separators and newlines), doubled quotes
/// inside quoted fields, and both LF and CRLF record terminators. An
/// unterminated quote is an error.
fn parse_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // Distinguishes an empty document from a trailing empty field.
    let mut record_started = false;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                other => field.push(other),
            }
            continue;
        }
        match ch {
            '"' => {
                in_quotes = true;
                record_started = true;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                record_started = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if record_started || !field.is_empty() || !record.is_empty() {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                record_started = false;
            }
            other => {
                field.push(other);
                record_started = true;
            }
        }
    }

    if in_quotes {
        return Err(Error::MalformedRecord(
            "unterminated quoted field".to_string(),
        ));
    }
    if record_started || !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}
