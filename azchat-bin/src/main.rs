use std::process::ExitCode;

use azchat_bin::{Cli, run};
use clap::Parser;

fn main() -> ExitCode {
    let args = Cli::parse();
    run(args)
}
