//! spritecut - Command-line tool for cutting sprite sheets into frames

use std::process::ExitCode;

use spritecut::cli;

fn main() -> ExitCode {
    cli::run()
}
