//! PHA CLI entry point.

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use pha_cli::cli::Cli;
use pha_cli::commands;

fn main() {
    // Env files must load before parsing so clap sees PHA_* variables.
    let loaded = pha_core::load_env_files();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt().with_env_filter(filter).with_target(false).init();

    match loaded {
        Ok(files) => debug!(?files, "Loaded env files"),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = commands::execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
