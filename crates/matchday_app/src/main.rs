mod cli;
mod config;
mod run;

use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;
use matchday_logging::{md_error, LogDestination};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Scrape(args) => {
            let level = if args.verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            };
            matchday_logging::initialize(LogDestination::Both, level, None);

            match run::scrape(args).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    md_error!("{err}");
                    err.exit_code()
                }
            }
        }
    }
}
