//! Card Lifecycle Engine CLI
//!
//! Runs a command script of card operations through the lifecycle engine.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > results.csv
//! cargo run -- --strategy sync commands.csv > results.csv
//! cargo run -- --rejects rejects.csv --ledger-output ledger.csv commands.csv > results.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 commands.csv > results.csv
//! ```
//!
//! One result row per command goes to stdout; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success (individual commands may still have failed)
//! - 1: Error (file not found, file not readable, output not writable, etc.)

use card_lifecycle_engine::cli;
use card_lifecycle_engine::logging;
use card_lifecycle_engine::strategy;
use std::process;

fn main() {
    let args = cli::parse_args();
    logging::setup_logging(args.log_level.as_deref());

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config, args.to_pipeline_options())
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
