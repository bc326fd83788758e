//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shipyard::BuildMode;

/// Shipyard - bundle assembly and license gating for Node-based desktop apps
#[derive(Parser)]
#[command(name = "shipyard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Project directory (defaults to searching upward for Shipyard.toml)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Build mode: development or production
    #[arg(
        long,
        global = true,
        env = "SHIPYARD_BUILD_MODE",
        default_value = "development"
    )]
    pub mode: BuildMode,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assemble the bundle directory (default)
    Build(BuildArgs),

    /// Write the pruned package.json only
    Prune(PruneArgs),

    /// Check dependency licenses and write the license summary
    Licenses(LicensesArgs),
}

#[derive(Args, Default)]
pub struct BuildArgs {
    /// Skip the install step
    #[arg(long)]
    pub no_install: bool,
}

#[derive(Args)]
pub struct PruneArgs {
    /// Print the pruned package.json instead of writing it
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Args)]
pub struct LicensesArgs {
    /// Only report dependencies that need an override
    #[arg(long)]
    pub check: bool,

    /// Where to write the summary (defaults to the configured path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Options shared by every command.
pub struct GlobalArgs {
    pub project: Option<PathBuf>,
    pub mode: BuildMode,
    pub color: bool,
}
