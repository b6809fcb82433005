mod cli;
mod commands;
mod config;
mod embedding;
mod model;
mod semantic;
mod text;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Values already in the environment take precedence over `.env`.
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "loaded environment file");
    }

    let cli = Cli::parse();
    let config_path = cli.config_path.as_deref();

    match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run(args, config_path),
        Commands::StyleCheck(args) => commands::style_check::run(args, config_path),
        Commands::Api(args) => commands::api::run(args, config_path),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
