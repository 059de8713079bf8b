//! `uvmake install` — configure (unless skipped), then install the locked
//! workspace into the install environment.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use uvmake_sync::{install, SystemRunner};

use super::{configure::print_report, WorkspaceArgs};

/// Arguments for `uvmake install`.
#[derive(Args, Debug)]
pub struct InstallArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Install from the existing manifest and lockfile without a configure pass.
    #[arg(long)]
    pub no_configure: bool,
}

impl InstallArgs {
    pub fn run(self) -> Result<()> {
        let session = self.workspace.collect()?;
        let config = session.config().clone();

        if self.no_configure {
            println!("{} '{}' configure skipped", "·".bright_black(), config.package_name);
        } else {
            let report = session
                .finalize(SystemRunner)
                .with_context(|| format!("configure failed for '{}'", config.package_name))?;
            print_report(&config.package_name, &report);
        }

        let report = install::install(&config, SystemRunner)
            .with_context(|| format!("install failed for '{}'", config.package_name))?;
        println!(
            "{} '{}' installed into {} ({} wheel(s))",
            "✓".green(),
            config.package_name,
            report.environment.display(),
            report.wheels.len()
        );
        for wheel in &report.wheels {
            if let Some(name) = wheel.file_name() {
                println!("  {}  {}", "+".bright_black(), name.to_string_lossy());
            }
        }
        Ok(())
    }
}
