//! Initialization config.
//!
//! [`InitOptions`] is the partially-filled request (from a `workspace:` block
//! or CLI flags). [`InitOptions::resolve`] validates it into an immutable
//! [`InitializationConfig`]; [`ConfigCell`] holds the first one resolved.
//!
//! All relative paths resolve against the directory that declared them.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::normalize_lexically;

pub const DEFAULT_MANIFEST: &str = "pyproject.toml";
pub const DEFAULT_DEV_ENVIRONMENT: &str = ".venv";
pub const DEFAULT_STATE_DIR: &str = ".uvmake";
pub const DEFAULT_PACKAGE_VERSION: &str = "0.1.0";
pub const DEFAULT_UV: &str = "uv";

// ---------------------------------------------------------------------------
// ManifestMode
// ---------------------------------------------------------------------------

/// Who owns the manifest file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestMode {
    /// uvmake regenerates the manifest whenever contributions change.
    Managed,
    /// The manifest is authored elsewhere; uvmake never rewrites it.
    Unmanaged,
}

// ---------------------------------------------------------------------------
// InitOptions
// ---------------------------------------------------------------------------

/// Initialization request. Every field is optional here; required ones are
/// enforced by [`InitOptions::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitOptions {
    /// Workspace package name (required).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    /// Python version constraint, e.g. `>=3.12` (required).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Manifest regenerated by uvmake.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
    /// Manifest owned by someone else. Mutually exclusive with `manifest`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmanaged_manifest: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_environment: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_environment: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_cache: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv: Option<PathBuf>,
}

impl InitOptions {
    /// Fill every unset field from `fallback`; fields already set win.
    pub fn or(self, fallback: InitOptions) -> InitOptions {
        InitOptions {
            package_name: self.package_name.or(fallback.package_name),
            python: self.python.or(fallback.python),
            version: self.version.or(fallback.version),
            manifest: self.manifest.or(fallback.manifest),
            unmanaged_manifest: self.unmanaged_manifest.or(fallback.unmanaged_manifest),
            dev_environment: self.dev_environment.or(fallback.dev_environment),
            install_environment: self.install_environment.or(fallback.install_environment),
            install_cache: self.install_cache.or(fallback.install_cache),
            state_dir: self.state_dir.or(fallback.state_dir),
            uv: self.uv.or(fallback.uv),
        }
    }

    /// Validate and resolve against `base`. Pure: touches no files.
    pub fn resolve(&self, base: &Path) -> Result<InitializationConfig, ConfigError> {
        let at = |p: &Path| normalize_lexically(&base.join(p));

        let (manifest_path, mode) = match (&self.manifest, &self.unmanaged_manifest) {
            (Some(managed), Some(unmanaged)) => {
                return Err(ConfigError::ConflictingManifests {
                    managed: at(managed),
                    unmanaged: at(unmanaged),
                })
            }
            (Some(managed), None) => (at(managed), ManifestMode::Managed),
            (None, Some(unmanaged)) => (at(unmanaged), ManifestMode::Unmanaged),
            (None, None) => (at(Path::new(DEFAULT_MANIFEST)), ManifestMode::Managed),
        };

        let package_name = non_blank(&self.package_name).ok_or(ConfigError::MissingField("package_name"))?;
        let python = non_blank(&self.python).ok_or(ConfigError::MissingField("python"))?;

        Ok(InitializationConfig {
            package_name,
            python,
            package_version: non_blank(&self.version)
                .unwrap_or_else(|| DEFAULT_PACKAGE_VERSION.to_owned()),
            manifest_path,
            mode,
            dev_environment: at(self
                .dev_environment
                .as_deref()
                .unwrap_or(Path::new(DEFAULT_DEV_ENVIRONMENT))),
            install_environment: self.install_environment.as_deref().map(at),
            install_cache: self.install_cache.as_deref().map(at),
            state_dir: at(self.state_dir.as_deref().unwrap_or(Path::new(DEFAULT_STATE_DIR))),
            uv: self.uv.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_UV)),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

// ---------------------------------------------------------------------------
// InitializationConfig
// ---------------------------------------------------------------------------

/// Resolved, immutable configuration for one configuration pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializationConfig {
    pub package_name: String,
    pub python: String,
    pub package_version: String,
    pub manifest_path: PathBuf,
    pub mode: ManifestMode,
    pub dev_environment: PathBuf,
    pub install_environment: Option<PathBuf>,
    pub install_cache: Option<PathBuf>,
    /// Where the previous-run snapshot and install artifacts live.
    pub state_dir: PathBuf,
    /// `uv` executable; a bare name is looked up on `PATH`.
    pub uv: PathBuf,
}

impl InitializationConfig {
    pub fn is_managed(&self) -> bool {
        self.mode == ManifestMode::Managed
    }

    /// Directory containing the manifest (the workspace root for `uv`).
    pub fn manifest_dir(&self) -> &Path {
        self.manifest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    }
}

// ---------------------------------------------------------------------------
// ConfigCell
// ---------------------------------------------------------------------------

/// Initialize-once holder for [`InitializationConfig`].
///
/// The first successful [`ConfigCell::initialize`] wins; later calls return
/// the stored config unchanged.
#[derive(Debug, Default)]
pub struct ConfigCell {
    inner: OnceLock<InitializationConfig>,
}

impl ConfigCell {
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    pub fn initialize(
        &self,
        options: &InitOptions,
        base: &Path,
    ) -> Result<&InitializationConfig, ConfigError> {
        if let Some(existing) = self.inner.get() {
            if options.resolve(base).ok().as_ref() != Some(existing) {
                tracing::debug!(
                    "uvmake already initialized for '{}'; ignoring request from {}",
                    existing.package_name,
                    base.display()
                );
            }
            return Ok(existing);
        }
        let config = options.resolve(base)?;
        tracing::info!(
            "initialized '{}' (python {}, {:?} manifest at {})",
            config.package_name,
            config.python,
            config.mode,
            config.manifest_path.display()
        );
        Ok(self.inner.get_or_init(|| config))
    }

    pub fn get(&self) -> Option<&InitializationConfig> {
        self.inner.get()
    }
}

static GLOBAL: ConfigCell = ConfigCell::new();

/// Process-wide cell used by the `uvmake` binary.
pub fn global() -> &'static ConfigCell {
    &GLOBAL
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
