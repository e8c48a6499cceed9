//! CSV format handling for command scripts, results and ledger snapshots
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization of command-script rows
//! - Conversion from CSV records to `Command`
//! - Result and ledger snapshot serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{CardDetails, Command, CommandResult, Operation, TransactionRecord, TransactionState};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Raw command-script row as read from CSV
///
/// Columns: `op,ref,card_number,expiry,cvv,amount,currency`. Only `op` and
/// `ref` are required; the rest depend on the operation.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CsvRecord {
    pub op: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub cvv: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Reject list row
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RejectCsvRecord {
    pub card_number: String,
    pub operations: String,
}

/// Convert a CSV row to a `Command`
///
/// Only the shape of the row is checked here: a known operation name and a
/// decimal amount if one is given. Field rules are left to the engine.
///
/// # Arguments
///
/// * `csv_record` - The raw row
/// * `line` - Line of the input file the row was read from
///
/// # Returns
///
/// * `Ok(Command)` - Row is well-formed
/// * `Err(String)` - Unknown operation or unparseable amount
pub fn convert_csv_record(csv_record: CsvRecord, line: u64) -> Result<Command, String> {
    let operation = Operation::from_str(&csv_record.op)
        .map_err(|e| format!("{} for ref '{}'", e, csv_record.reference))?;

    let amount = match csv_record.amount {
        Some(amount_str) if !amount_str.trim().is_empty() => {
            match Decimal::from_str(amount_str.trim()) {
                Ok(decimal) => Some(decimal),
                Err(_) => {
                    return Err(format!(
                        "Invalid amount '{}' for ref '{}'",
                        amount_str, csv_record.reference
                    ))
                }
            }
        }
        _ => None,
    };

    Ok(Command {
        line,
        operation,
        reference: csv_record.reference,
        card: CardDetails {
            number: csv_record.card_number.unwrap_or_default(),
            expiry_date: csv_record.expiry.unwrap_or_default(),
            cvv: csv_record.cvv.unwrap_or_default(),
        },
        amount,
        currency: csv_record.currency.unwrap_or_default(),
    })
}

/// Line of the input file a newline-terminated record starts on
///
/// `end_line` is the reader's line once the record has been read, i.e. the
/// line after its terminator. Quoted fields may span lines, so their embedded
/// newlines are counted back.
pub fn record_line<'a>(end_line: u64, fields: impl IntoIterator<Item = &'a str>) -> u64 {
    let embedded: u64 = fields
        .into_iter()
        .map(|field| field.matches('\n').count() as u64)
        .sum();
    end_line.saturating_sub(1 + embedded)
}

/// Write command results as CSV, ordered by input line
///
/// Columns: `line,op,ref,status,outcome,amount,currency`. `amount` and
/// `currency` are only filled for successful commands.
pub fn write_results_csv(results: &[CommandResult], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["line", "op", "ref", "status", "outcome", "amount", "currency"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted: Vec<&CommandResult> = results.iter().collect();
    sorted.sort_by_key(|result| result.line);

    for result in sorted {
        let (amount, currency) = match &result.outcome {
            Ok(response) => (response.amount.to_string(), response.currency.clone()),
            Err(_) => (String::new(), String::new()),
        };

        writer
            .write_record(&[
                result.line.to_string(),
                result.operation.to_string(),
                result.reference.clone(),
                result.status_code().to_string(),
                result.outcome_name().to_string(),
                amount,
                currency,
            ])
            .map_err(|e| format!("Failed to write result record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write a ledger snapshot as CSV, ordered by creation time then id
///
/// Columns: `id,card,expiry,authorized,available,currency,state`, with the
/// card number masked down to its last four digits.
pub fn write_ledger_csv(records: &[TransactionRecord], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["id", "card", "expiry", "authorized", "available", "currency", "state"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted: Vec<&TransactionRecord> = records.iter().collect();
    sorted.sort_by_key(|record| (record.created_at, record.id));

    for record in sorted {
        let state = match record.state {
            TransactionState::Live => "live",
            TransactionState::Cancelled { .. } => "cancelled",
        };

        writer
            .write_record(&[
                record.id.to_string(),
                CardDetails::mask(&record.card_reference),
                record.expiry.to_string(),
                record.authorized_amount.to_string(),
                record.available_amount.to_string(),
                record.currency.clone(),
                state.to_string(),
            ])
            .map_err(|e| format!("Failed to write ledger record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
