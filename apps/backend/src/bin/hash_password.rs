//! Reads one password from stdin and prints its Argon2id PHC hash, for
//! seeding `users.password_hash` by hand.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use profile_doctor_backend::auth::password::hash_password;

fn main() -> ExitCode {
    eprint!("Enter password: ");
    let _ = io::stderr().flush();

    let mut line = String::new();
    if let Err(e) = io::stdin().lock().read_line(&mut line) {
        eprintln!("Failed to read password: {e}");
        return ExitCode::FAILURE;
    }
    let password = line.trim_end_matches(['\r', '\n']);

    if password.is_empty() {
        eprintln!("Password cannot be empty");
        return ExitCode::FAILURE;
    }

    match hash_password(password) {
        Ok(hash) => {
            println!("{hash}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
