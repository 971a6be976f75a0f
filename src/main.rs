//! Bank Ledger CLI
//!
//! Applies a CSV of account operations to an empty ledger and prints the
//! resulting account snapshots.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > accounts.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use bank_ledger::{BatchError, Ledger};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), BatchError> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(BatchError::MissingArgument);
    }

    let input_path = &args[1];
    let file = File::open(input_path)?;
    let reader = BufReader::new(file);

    let mut ledger = Ledger::new();
    ledger.process_csv(reader)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    ledger.write_output(handle)?;

    Ok(())
}
