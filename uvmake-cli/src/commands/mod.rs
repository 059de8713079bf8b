pub mod configure;
pub mod install;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use uvmake_core::{config, InitOptions};
use uvmake_sync::{pipeline, Session};

/// Root directory plus command-line overrides for the root `workspace` block.
#[derive(Args, Debug, Clone)]
pub struct WorkspaceArgs {
    /// Directory holding the root `uvmake.yaml`.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Manifest regenerated by uvmake.
    #[arg(long, conflicts_with = "unmanaged_manifest")]
    pub manifest: Option<PathBuf>,

    /// Manifest maintained by hand; uvmake only adds dev dependencies to it.
    #[arg(long)]
    pub unmanaged_manifest: Option<PathBuf>,

    /// Python version constraint, e.g. ">=3.12".
    #[arg(long)]
    pub python: Option<String>,

    /// Name of the generated workspace package.
    #[arg(long)]
    pub package_name: Option<String>,

    /// Version of the generated workspace package.
    #[arg(long)]
    pub package_version: Option<String>,

    /// Environment synced for development (default: <root>/.venv).
    #[arg(long)]
    pub dev_env: Option<PathBuf>,

    /// Environment populated by `uvmake install`.
    #[arg(long)]
    pub install_env: Option<PathBuf>,

    /// uv cache directory used by `uvmake install`.
    #[arg(long)]
    pub install_cache: Option<PathBuf>,

    /// Where the snapshot and install artifacts live (default: <root>/.uvmake).
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// uv executable.
    #[arg(long, value_name = "PATH")]
    pub uv: Option<PathBuf>,
}

impl WorkspaceArgs {
    /// Overrides with every path made absolute against `cwd`, so they mean
    /// what they meant on the command line. A bare `--uv` name stays a
    /// `PATH` lookup.
    pub fn overrides(&self, cwd: &Path) -> InitOptions {
        let abs = |p: &Option<PathBuf>| p.as_ref().map(|p| cwd.join(p));
        InitOptions {
            package_name: self.package_name.clone(),
            python: self.python.clone(),
            version: self.package_version.clone(),
            manifest: abs(&self.manifest),
            unmanaged_manifest: abs(&self.unmanaged_manifest),
            dev_environment: abs(&self.dev_env),
            install_environment: abs(&self.install_env),
            install_cache: abs(&self.install_cache),
            state_dir: abs(&self.state_dir),
            uv: self.uv.as_ref().map(|p| {
                if p.components().count() > 1 {
                    cwd.join(p)
                } else {
                    p.clone()
                }
            }),
        }
    }

    /// Walk the configuration tree and return the collect-phase session.
    pub fn collect(&self) -> Result<Session> {
        let cwd = std::env::current_dir().context("could not determine current directory")?;
        let root = cwd
            .join(&self.root)
            .canonicalize()
            .with_context(|| format!("cannot resolve root '{}'", self.root.display()))?;
        pipeline::collect_at(&root, &self.overrides(&cwd), config::global())
            .with_context(|| format!("failed to load configuration tree at {}", root.display()))
    }
}
