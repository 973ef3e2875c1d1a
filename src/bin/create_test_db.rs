use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, macros::date};

use bankdash::{Statement, TransactionKind, create_statement, initialize_db};

/// A utility for creating a test database for the bankdash server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test statements...");

    let start_date = date!(2025 - 01 - 01);
    let mut count = 0;

    for (user_name, opening_balance) in [("alice", 2500.0), ("bob", 900.0), ("carol", 15000.0)] {
        let mut balance = opening_balance;

        for day in 0..30i64 {
            // Credit every third entry, debit the rest, with amounts that
            // vary enough to make the charts interesting.
            let kind = if day % 3 == 0 {
                TransactionKind::Credit
            } else {
                TransactionKind::Debit
            };
            let amount = 20.0 + (day as f64 * 13.7) % 180.0;

            balance += match kind {
                TransactionKind::Credit => amount,
                TransactionKind::Debit => -amount,
            };

            let statement = Statement {
                txn_date: start_date + Duration::days(day),
                flag: kind.as_flag().to_owned(),
                amount,
                balance,
                user_name: user_name.to_owned(),
            };

            create_statement(&statement, &conn)?;
            count += 1;
        }
    }

    println!("Success! Created {count} statements.");

    Ok(())
}
