//! statehorn CLI (`horn`) - Standalone binary
//!
//! This is the entry point for the `horn` command-line tool.
//!
//! The binary is a thin wrapper around [`statehorn_cli::run_cli`], handling
//! error display and exit codes. All command logic lives in the library
//! crate for testability.
//!
//! # Exit Codes
//!
//! - `0` - Success, no attack found
//! - `1` - An attack was found, or an error occurred

fn main() {
    env_logger::init();
    match statehorn_cli::run_cli() {
        Ok(found_attack) => {
            if found_attack {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
