use clap::Parser;
use colored::*;
use std::process::ExitCode;

use sugar_cli::cli::{self, Cli};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG, when set, wins over -v
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(format!("warn,sugar_cli={level}")),
    )
    .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    init_logging(args.verbose);

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            if let Some(fault) = cli::fault_of(&err) {
                eprint!("{}", fault.report());
            }
            ExitCode::FAILURE
        }
    }
}
