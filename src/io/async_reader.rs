//! Asynchronous CSV reader with batch interface
//!
//! Reads command-script rows with `csv-async` and hands them out in batches.
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Commands
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, record_line, CsvRecord};
use crate::types::Command;
use csv_async::{AsyncReaderBuilder, StringRecord, Terminator};
use futures::io::{AsyncRead, AsyncReadExt, Chain, Cursor};

/// Batch-oriented command reader over any `AsyncRead`
pub struct AsyncReader<R: AsyncRead + Unpin> {
    /// Deserializer over the input plus a closing newline, so every record is
    /// newline-terminated
    csv_reader: csv_async::AsyncDeserializer<Chain<R, Cursor<&'static [u8]>>>,

    /// Trimmed header row, read with the first batch
    headers: Option<StringRecord>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        // Fields are trimmed after reading so embedded newlines still count;
        // a CRLF's '\r' is trimmed with them
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .terminator(Terminator::Any(b'\n'))
            .create_deserializer(reader.chain(Cursor::new(&b"\n"[..])));

        Self {
            csv_reader,
            headers: None,
        }
    }

    /// Read up to `batch_size` well-formed commands
    ///
    /// Malformed rows are logged and skipped; they do not count towards the
    /// batch size. An empty batch means the input is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Command> {
        let mut batch = Vec::with_capacity(batch_size);

        let headers = match self.headers.take() {
            Some(headers) => headers,
            None => match self.csv_reader.headers().await {
                Ok(headers) => {
                    let mut headers = headers.clone();
                    headers.trim();
                    headers
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read header row");
                    return batch;
                }
            },
        };

        let mut record = StringRecord::new();
        while batch.len() < batch_size {
            let read = self.csv_reader.read_record(&mut record).await;
            let end_line = self.csv_reader.position().line();

            let line = match read {
                Ok(false) => break,
                Ok(true) => record_line(end_line, record.iter()),
                Err(e) => {
                    let line = end_line.saturating_sub(1);
                    tracing::warn!(line, error = %e, "skipping malformed row");
                    continue;
                }
            };

            record.trim();
            if record.iter().all(str::is_empty) {
                continue;
            }

            match record
                .deserialize::<CsvRecord>(Some(&headers))
                .map_err(|e| format!("CSV parse error: {}", e))
                .and_then(|csv_record| convert_csv_record(csv_record, line))
            {
                Ok(command) => batch.push(command),
                Err(e) => tracing::warn!(line, error = %e, "skipping malformed row"),
            }
        }

        self.headers = Some(headers);
        batch
    }
}
