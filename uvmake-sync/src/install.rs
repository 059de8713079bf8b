//! Install-time sequence for the privileged install environment.
//!
//! Runs apart from the dev-environment sync: the lockfile written during
//! configuration is checked, exported and installed, together with freshly
//! built wheels of every workspace package.

use std::path::{Path, PathBuf};

use uvmake_core::{ConfigError, InitializationConfig};

use crate::error::{io_err, SyncError};
use crate::process::Runner;
use crate::uv::Uv;

const REQUIREMENTS_FILE: &str = "requirements.txt";
const WHEEL_DIR: &str = "wheels";

/// What one install run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub environment: PathBuf,
    pub requirements: PathBuf,
    pub wheels: Vec<PathBuf>,
}

/// Lock check, export, build, create-or-reuse the environment, install.
///
/// Every call honours `install_cache` through `UV_CACHE_DIR`. The first
/// failure aborts the sequence.
pub fn install<R: Runner>(
    config: &InitializationConfig,
    runner: R,
) -> Result<InstallReport, SyncError> {
    let environment = config
        .install_environment
        .as_deref()
        .ok_or(ConfigError::MissingField("install_environment"))?;
    let uv = Uv::new(&config.uv, runner).with_cache_dir(config.install_cache.clone());
    let project_dir = config.manifest_dir();

    uv.lock_check(project_dir)?;

    std::fs::create_dir_all(&config.state_dir).map_err(|e| io_err(&config.state_dir, e))?;
    let requirements = config.state_dir.join(REQUIREMENTS_FILE);
    uv.export_requirements(project_dir, &requirements)?;

    let wheel_dir = config.state_dir.join(WHEEL_DIR);
    reset_dir(&wheel_dir)?;
    uv.build_wheels(project_dir, &wheel_dir)?;
    let wheels = list_wheels(&wheel_dir)?;
    if wheels.is_empty() {
        tracing::warn!("no wheels built into {}", wheel_dir.display());
    }

    uv.create_environment(environment, &config.python)?;
    uv.install_requirements(environment, &requirements, &wheels)?;

    tracing::info!(
        "installed {} wheel(s) into {}",
        wheels.len(),
        environment.display()
    );
    Ok(InstallReport {
        environment: environment.to_path_buf(),
        requirements,
        wheels,
    })
}

/// Remove `dir` and recreate it empty, so stale wheels never get installed.
fn reset_dir(dir: &Path) -> Result<(), SyncError> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))
}

/// `*.whl` files directly under `dir`, sorted by path.
fn list_wheels(dir: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    let mut wheels = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| io_err(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "whl") {
            wheels.push(path);
        }
    }
    wheels.sort();
    Ok(wheels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reset_dir_drops_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("wheels");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("old-0.1.0-py3-none-any.whl"), "").unwrap();

        reset_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(list_wheels(&dir).unwrap().is_empty());
    }

    #[test]
    fn list_wheels_ignores_other_files_and_sorts() {
        let tmp = TempDir::new().unwrap();
        for name in ["b-1.0-py3-none-any.whl", "a-1.0-py3-none-any.whl", "a-1.0.tar.gz"] {
            std::fs::write(tmp.path().join(name), "").unwrap();
        }
        let wheels = list_wheels(tmp.path()).unwrap();
        let names: Vec<_> = wheels
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a-1.0-py3-none-any.whl", "b-1.0-py3-none-any.whl"]);
    }
}
