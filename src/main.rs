// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, dispatch.
// - Any error is printed to stdout and ends the invocation with a failure
//   exit code.

use clap::Parser;
use danft::{cli::Cli, ui};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.init_logging();

    match ui::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Printed regardless of the log level, `-q` only silences diagnostics.
            println!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}
