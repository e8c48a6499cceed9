//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over commands from a command-script CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding `Result<Command, String>`
//! for each CSV row:
//!
//! ```no_run
//! use card_lifecycle_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("commands.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(command) => println!("line {}: {}", command.line, command.operation),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Malformed rows are yielded as `Err` values carrying their line number
//!
//! Rows are read one at a time; the file is never loaded whole.

use crate::io::csv_format::{convert_csv_record, record_line, CsvRecord};
use crate::types::Command;
use csv::{ReaderBuilder, StringRecord, Terminator};
use std::fs::File;
use std::io::{Chain, Read};
use std::path::Path;

/// Streaming command reader over a CSV file
#[derive(Debug)]
pub struct SyncReader {
    /// CSV reader over the file plus a closing newline, so every record is
    /// newline-terminated
    reader: csv::Reader<Chain<File, &'static [u8]>>,

    /// Trimmed header row
    headers: StringRecord,

    record: StringRecord,
}

impl SyncReader {
    /// Open a command script
    ///
    /// # Errors
    ///
    /// Returns `Err(String)` if the file cannot be opened or its header row
    /// cannot be read.
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        // Fields are trimmed after reading so embedded newlines still count;
        // a CRLF's '\r' is trimmed with them
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .terminator(Terminator::Any(b'\n'))
            .buffer_capacity(8 * 1024)
            .from_reader(file.chain(&b"\n"[..]));

        let mut headers = reader
            .headers()
            .map_err(|e| format!("Failed to read header of '{}': {}", path.display(), e))?
            .clone();
        headers.trim();

        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Command, String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let read = self.reader.read_record(&mut self.record);
            let end_line = self.reader.position().line();

            let line = match read {
                Ok(false) => return None,
                Ok(true) => record_line(end_line, self.record.iter()),
                Err(e) => {
                    return Some(Err(format!(
                        "Line {}: CSV parse error: {}",
                        end_line.saturating_sub(1),
                        e
                    )))
                }
            };

            self.record.trim();
            if self.record.iter().all(str::is_empty) {
                continue;
            }

            return Some(
                self.record
                    .deserialize::<CsvRecord>(Some(&self.headers))
                    .map_err(|e| format!("CSV parse error: {}", e))
                    .and_then(|csv_record| convert_csv_record(csv_record, line))
                    .map_err(|e| format!("Line {}: {}", line, e)),
            );
        }
    }
}
