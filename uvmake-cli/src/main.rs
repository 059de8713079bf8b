//! uvmake: generate a uv workspace manifest from a tree of `uvmake.yaml`
//! contributor files and keep the dev environment in sync with it.
//!
//! # Usage
//!
//! ```text
//! uvmake configure [--root <dir>] [--manifest <path> | --unmanaged-manifest <path>]
//!                  [--python <constraint>] [--package-name <name>] [--dev-env <path>]
//! uvmake install   [--root <dir>] --install-env <path> [--install-cache <path>] [--no-configure]
//! uvmake status    [--root <dir>] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{configure::ConfigureArgs, install::InstallArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "uvmake",
    version,
    about = "Generate a uv workspace manifest from a configuration tree and sync its environment",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collect contributions, regenerate the manifest if needed, and sync the dev environment.
    Configure(ConfigureArgs),

    /// Install the locked workspace into the install environment.
    Install(InstallArgs),

    /// Show whether the manifest is current with the configuration tree.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Configure(args) => args.run(),
        Commands::Install(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}

/// Route library `log` records through a `RUST_LOG`-filtered subscriber.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
