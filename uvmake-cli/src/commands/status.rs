//! `uvmake status` — compare the configuration tree against the last pass.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use uvmake_core::ManifestMode;
use uvmake_sync::{snapshot, status, Status};

use super::WorkspaceArgs;

/// Arguments for `uvmake status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatusJson {
    package: String,
    manifest: PathBuf,
    mode: ManifestMode,
    configured_at: Option<String>,
    #[serde(flatten)]
    status: Status,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let session = self.workspace.collect()?;
        let config = session.config();

        let status = status::check(config, session.contributions())
            .with_context(|| format!("status check failed for '{}'", config.package_name))?;
        let configured_at = snapshot::load_at(&config.state_dir)
            .context("failed to load snapshot")?
            .map(|s| s.configured_at);

        if self.json {
            let payload = StatusJson {
                package: config.package_name.clone(),
                manifest: config.manifest_path.clone(),
                mode: config.mode,
                configured_at: configured_at.map(|t| t.to_rfc3339()),
                status,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        println!(
            "uvmake v{} | {} | {} manifest {}",
            env!("CARGO_PKG_VERSION"),
            config.package_name,
            mode_label(config.mode),
            config.manifest_path.display()
        );
        println!(
            "{} {}  {}",
            status_indicator(&status),
            status_label(&status),
            status_detail(&status, configured_at)
        );
        if status.needs_configure() {
            println!("Run 'uvmake configure' to regenerate the manifest.");
        }
        Ok(())
    }
}

fn mode_label(mode: ManifestMode) -> &'static str {
    match mode {
        ManifestMode::Managed => "managed",
        ManifestMode::Unmanaged => "unmanaged",
    }
}

fn status_label(status: &Status) -> &'static str {
    match status {
        Status::NeverConfigured => "NEVER CONFIGURED",
        Status::Stale { .. } => "STALE",
        Status::Missing { .. } => "MISSING",
        Status::Modified { .. } => "MODIFIED",
        Status::Current => "CURRENT",
    }
}

fn status_indicator(status: &Status) -> String {
    match status {
        Status::NeverConfigured => "■".bright_black().bold().to_string(),
        Status::Stale { .. } => "■".yellow().bold().to_string(),
        Status::Missing { .. } | Status::Modified { .. } => "■".red().bold().to_string(),
        Status::Current => "■".green().bold().to_string(),
    }
}

fn status_detail(status: &Status, configured_at: Option<DateTime<Utc>>) -> String {
    let age = configured_at
        .map(|t| format!("configured {}", format_age(t)))
        .unwrap_or_else(|| "no snapshot".to_string());
    match status {
        Status::NeverConfigured => age,
        Status::Stale { fields } => format!("{} changed; {age}", fields.join(", ")),
        Status::Missing { path } => format!("{} not found; {age}", path.display()),
        Status::Modified { path } => format!("{} edited since generation; {age}", path.display()),
        Status::Current => age,
    }
}

fn format_age(at: DateTime<Utc>) -> String {
    let secs = (Utc::now() - at).num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{s}s ago"),
        s if s < 60 * 60 => format!("{}m ago", s / 60),
        s if s < 24 * 60 * 60 => format!("{}h ago", s / (60 * 60)),
        s => format!("{}d ago", s / (24 * 60 * 60)),
    }
}
