//! Shipyard CLI - bundle assembly for Node-based desktop apps

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, GlobalArgs};
use shipyard::util::diagnostic::{self, suggestions, Diagnostic};
use shipyard::util::config::ConfigParseError;
use shipyard::util::ProjectNotFound;
use shipyard::LicenseError;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("shipyard=debug")
    } else {
        EnvFilter::new("shipyard=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = GlobalArgs {
        project: cli.project,
        mode: cli.mode,
        color: !cli.no_color,
    };

    match cli.command {
        Some(Commands::Build(args)) => commands::build::execute(&global, args),
        Some(Commands::Prune(args)) => commands::prune::execute(&global, args),
        Some(Commands::Licenses(args)) => commands::licenses::execute(&global, args),
        None => commands::build::execute(&global, Default::default()),
    }
}

/// Print an error, using the structured diagnostic when there is one.
fn report(err: &anyhow::Error, color: bool) {
    if let Some(license_err) = err.downcast_ref::<LicenseError>() {
        diagnostic::emit(&license_err.to_diagnostic(), color);
    } else if let Some(parse_err) = err.downcast_ref::<ConfigParseError>() {
        eprint!("{}", diagnostic::render_report(parse_err, color));
    } else if let Some(not_found) = err.downcast_ref::<ProjectNotFound>() {
        let diag = Diagnostic::error(not_found.to_string()).with_suggestion(suggestions::NO_CONFIG);
        diagnostic::emit(&diag, color);
    } else {
        eprintln!("error: {:#}", err);
    }
}
