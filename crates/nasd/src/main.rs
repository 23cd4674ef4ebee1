//! `nasd` binary entry point: runs the daemon and maps failure to an exit code.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match nasd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(io::stderr(), "nasd: {error}").ok();
            ExitCode::FAILURE
        }
    }
}
