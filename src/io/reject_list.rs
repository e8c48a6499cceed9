//! Reject list loading
//!
//! The reject list is a CSV file with columns `card_number,operations`, where
//! `operations` is the scope string matched by substring containment
//! (e.g. `authorisation capture`).

use crate::core::InMemoryLedgerStore;
use crate::io::csv_format::RejectCsvRecord;
use crate::types::card::strip_whitespace;
use crate::types::RejectEntry;
use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::Path;

/// Read reject entries from any reader
///
/// Malformed rows are logged and skipped.
pub fn read_rejects<R: Read>(input: R) -> Vec<RejectEntry> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input);

    let mut entries = Vec::new();
    for (index, row) in reader.deserialize::<RejectCsvRecord>().enumerate() {
        match row {
            Ok(record) => entries.push(RejectEntry {
                card_reference: strip_whitespace(&record.card_number),
                operation_scope: record.operations.to_lowercase(),
            }),
            Err(e) => tracing::warn!(line = index + 2, error = %e, "skipping malformed reject row"),
        }
    }
    entries
}

/// Load a reject list file into the store
///
/// # Returns
///
/// * `Ok(usize)` - Number of entries loaded
/// * `Err(String)` - The file could not be opened
pub fn load_rejects(path: &Path, store: &InMemoryLedgerStore) -> Result<usize, String> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("Failed to open reject list '{}': {}", path.display(), e))?;

    let entries = read_rejects(file);
    let count = entries.len();
    for entry in entries {
        store.insert_reject(entry);
    }

    tracing::info!(count, path = %path.display(), "reject list loaded");
    Ok(count)
}
