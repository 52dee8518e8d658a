use std::{
    error::Error,
    io::{self},
    path::Path,
    process::exit,
};

use clap::Parser;
use rusqlite::Connection;

use parish_ledger::{PasswordHash, ValidatedPassword, add_access_key, initialize_db};

/// A utility for adding a sign-up access phrase to the ledger database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let conn = Connection::open(db_path)
        .unwrap_or_else(|_| panic!("Could not open the database at {db_path:?}"));
    initialize_db(&conn)?;

    let hash = match get_access_phrase_hash() {
        Some(hash) => hash,
        None => return Ok(()),
    };

    add_access_key(&hash, &conn)?;
    println!("Access phrase added successfully!");

    Ok(())
}

fn validate_db_path(db_path: &Path) {
    match db_path.extension() {
        None => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }
}

fn get_access_phrase_hash() -> Option<PasswordHash> {
    loop {
        println!();

        let first_phrase = match rpassword::prompt_password("Enter the new access phrase: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read the phrase from stdin: {error}"));
                return None;
            }
        };

        let validated_phrase = match ValidatedPassword::new(&first_phrase) {
            Ok(phrase) => phrase,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let second_phrase = match rpassword::prompt_password("Enter the same phrase again: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read the phrase from stdin: {error}"));
                return None;
            }
        };

        if first_phrase != second_phrase {
            print_error("Phrases must match, try again.");
            continue;
        }

        let hash = match PasswordHash::new(validated_phrase, PasswordHash::DEFAULT_COST) {
            Ok(hash) => hash,
            Err(error) => {
                print_error(format!("Could not hash the phrase: {error}. Try again."));
                continue;
            }
        };

        return Some(hash);
    }
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string())
}
