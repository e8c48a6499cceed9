//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row conversion, result and ledger serialization)
//! - `sync_reader` - Synchronous command reader with iterator interface
//! - `async_reader` - Asynchronous command reader with batch reading interface
//! - `reject_list` - Reject list loading

pub mod async_reader;
pub mod csv_format;
pub mod reject_list;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{convert_csv_record, write_ledger_csv, write_results_csv, CsvRecord};
pub use reject_list::{load_rejects, read_rejects};
pub use sync_reader::SyncReader;
