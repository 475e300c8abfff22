//! Record reader
//!
//! Yields raw records (JSON objects) from a newline-delimited log file or from
//! a buffer already read from standard input.
//!
//! Lines that are blank, not valid JSON, or valid JSON but not an object are
//! skipped: assistant logs routinely contain streaming fragments this crate
//! does not model. Only I/O failures surface as errors.

use super::RawRecord;
use crate::error::{Error, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Lazy iterator over the JSON-object lines of a reader.
pub struct JsonlRecords<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
    skipped: usize,
}

impl<R: BufRead> JsonlRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Number of non-blank lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for JsonlRecords<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            // Raw bytes so that a line with invalid UTF-8 is skipped, not fatal
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(Error::Io(e))),
            }
            self.line_number += 1;

            let line = self.buf.trim_ascii();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_slice::<Value>(line) {
                Ok(Value::Object(record)) => return Some(Ok(record)),
                Ok(_) => {
                    tracing::debug!(line = self.line_number, "Skipping non-object JSON line");
                    self.skipped += 1;
                }
                Err(e) => {
                    tracing::debug!(line = self.line_number, error = %e, "Skipping malformed line");
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Read every record of a JSONL log file.
///
/// The file handle is closed before this returns.
pub fn read_jsonl(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path)
        .map_err(|e| Error::input(path.display().to_string(), format!("cannot open: {}", e)))?;

    let mut records = JsonlRecords::new(BufReader::new(file));
    let collected = records
        .by_ref()
        .collect::<Result<Vec<_>>>()
        .map_err(|e| Error::input(path.display().to_string(), e))?;

    tracing::debug!(
        path = %path.display(),
        records = collected.len(),
        skipped = records.skipped(),
        "Read JSONL log"
    );
    Ok(collected)
}

/// Parse a whole buffer as a single JSON object.
pub fn parse_record(buffer: &str) -> Result<RawRecord> {
    match serde_json::from_str::<Value>(buffer.trim())? {
        Value::Object(record) => Ok(record),
        other => Err(Error::input(
            "stdin",
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
    }
}

/// Parse a buffer as one JSON object, falling back to newline-delimited records.
///
/// Returns an `Input` error when neither reading yields an object.
pub fn parse_records(buffer: &str) -> Result<Vec<RawRecord>> {
    if let Ok(record) = parse_record(buffer) {
        return Ok(vec![record]);
    }

    let records = JsonlRecords::new(buffer.as_bytes()).collect::<Result<Vec<_>>>()?;
    if records.is_empty() {
        return Err(Error::input("stdin", "no JSON object found"));
    }
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
