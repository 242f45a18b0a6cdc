use cfgvault_cli::cli::Cli;
use cfgvault_cli::{commands, util};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    util::init_tracing(cli.verbose);
    util::install_panic_hook();

    match commands::run(&cli, &mut std::io::stderr()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cfgvault: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
