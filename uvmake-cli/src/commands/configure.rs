//! `uvmake configure` — collect, regenerate if changed, sync.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use uvmake_sync::{FinalizeReport, SystemRunner, WriteResult};

use super::WorkspaceArgs;

/// Arguments for `uvmake configure`.
#[derive(Args, Debug)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,
}

impl ConfigureArgs {
    pub fn run(self) -> Result<()> {
        let session = self.workspace.collect()?;
        let package = session.config().package_name.clone();
        let report = session
            .finalize(SystemRunner)
            .with_context(|| format!("configure failed for '{package}'"))?;
        print_report(&package, &report);
        Ok(())
    }
}

pub(crate) fn print_report(package: &str, report: &FinalizeReport) {
    if !report.regenerated {
        println!("{} '{package}' unchanged", "✓".green());
    } else {
        match &report.manifest {
            Some(WriteResult::Written { path }) => println!(
                "{} '{package}' manifest regenerated ({} member(s)): {}",
                "✓".green(),
                report.members.len(),
                path.display()
            ),
            Some(WriteResult::Unchanged { path }) => println!(
                "{} '{package}' manifest already up to date: {}",
                "✓".green(),
                path.display()
            ),
            None => println!("{} '{package}' unmanaged manifest left as is", "✓".green()),
        }
        for member in &report.members {
            println!("  {}  {} ({})", "+".bright_black(), member.name, member.path);
        }
        for dep in &report.dev_dependencies_added {
            println!("  {}  dev: {dep}", "+".bright_black());
        }
    }
    println!(
        "  {}  synced {}",
        "·".bright_black(),
        report.environment.display()
    );
}
