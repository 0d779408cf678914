use std::process::ExitCode;

use clap::Parser;
use templater::{Cli, generate_template};

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.init_logging();

    if cli.settings_template {
        print!("{}", generate_template());
        return ExitCode::SUCCESS;
    }

    match cli.builder().process() {
        Ok(result) => {
            println!("{result}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
