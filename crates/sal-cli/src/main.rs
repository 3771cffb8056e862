//! SAL CLI - audit and publish Statutes at Large metadata.

mod cli;
mod commands;
mod terminal;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { force } => commands::run::run(cli.config, force, cli.verbose),

        Commands::Check => commands::check::run(cli.config, cli.verbose),

        Commands::Audit { force } => commands::audit::run(cli.config, force, cli.verbose),

        Commands::Generate { force } => commands::generate::run(cli.config, force, cli.verbose),

        Commands::Status { json } => commands::status::run(cli.config, json, cli.verbose),

        Commands::Unlock => commands::unlock::run(cli.config, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so prompts and reports on stdout stay readable.
/// `RUST_LOG` takes precedence over `--verbose`.
fn setup_logging(verbose: bool) {
    let default = if verbose { "sal=debug" } else { "sal=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
