//! cmdtree-probe - inspect cmdtree definitions from the command line.
//!
//! Reads a TOML tree definition, parses sample arguments against it and
//! reports what matched. Its own argv is parsed with cmdtree.

mod cli;
mod report;

use std::process::ExitCode;

use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Action, Cli};

fn init_logging(level: &str) {
    // Logs go to stderr; stdout carries reports.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run() -> Result<ExitCode> {
    let mut cli = Cli::new()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let parsed = if args.is_empty() {
        Ok(())
    } else {
        cli.parse(args)
    };
    init_logging(&cli.log_level());

    if let Err(err) = parsed {
        eprintln!("[cmdtree-probe] Error: {}", err);
        eprintln!("Run 'cmdtree-probe --help' for usage.");
        return Ok(ExitCode::from(2));
    }
    if cli.flag("version") {
        println!("cmdtree-probe {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }
    let json = cli.flag("json");
    let action = match cli.take_action() {
        Some(action) if !cli.flag("help") => action,
        _ => {
            print!("{}", cli.usage());
            return Ok(ExitCode::SUCCESS);
        }
    };
    debug!(?action, json, "dispatching");

    match action {
        Action::Check { definition, args } => {
            let report = report::check(&definition, &args)?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", report.render_text());
                if let Some(error) = &report.error {
                    eprintln!("[cmdtree-probe] Parse failed: {}", error);
                }
            }
            info!(ok = report.ok, "check finished");
            Ok(if report.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Action::Print { definition } => {
            print!("{}", report::print(&definition)?);
            Ok(ExitCode::SUCCESS)
        }
        Action::Classify { tokens } => {
            let rows = report::classify_tokens(&tokens);
            if json {
                print_json(&rows)?;
            } else {
                print!("{}", report::render_classified(&rows));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[cmdtree-probe] Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
