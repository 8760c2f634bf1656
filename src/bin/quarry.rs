/// Quarry CLI
///
/// Runs compiled filter bytecode against JSON input and prints the results.
use quarry_core::cli;

fn main() {
    match cli::run_cli() {
        Ok(status) => std::process::exit(status),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
