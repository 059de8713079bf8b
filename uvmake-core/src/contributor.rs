//! Contributor files and configuration-tree traversal.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   uvmake.yaml          (workspace block + contributions + subdirectories)
//!   libs/
//!     uvmake.yaml        (contributions + subdirectories)
//!     a/pyproject.toml
//! ```
//!
//! ```yaml
//! workspace:
//!   package_name: demo
//!   python: ">=3.12"
//! projects:
//!   - a/pyproject.toml
//! dev_dependencies:
//!   - jinja2>=3.1.6
//! subdirectories:
//!   - libs
//! ```
//!
//! Traversal is depth first in declaration order: a directory is visited
//! before the subdirectories it lists, and siblings in the order listed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::InitOptions;
use crate::error::{io_err, ConfigError};
use crate::types::{normalize_lexically, Contributor};

/// File name looked up in every directory of the configuration tree.
pub const CONTRIBUTOR_FILE: &str = "uvmake.yaml";

/// One parsed `uvmake.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContributorFile {
    /// Initialization request; only the first one reached takes effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<InitOptions>,
    #[serde(default)]
    pub projects: Vec<PathBuf>,
    #[serde(default)]
    pub dev_dependencies: Vec<String>,
    #[serde(default)]
    pub subdirectories: Vec<PathBuf>,
}

impl ContributorFile {
    /// Register this file's projects and dev dependencies, in file order.
    pub fn contribute(&self, contributor: &mut Contributor<'_>) -> Result<(), ConfigError> {
        for project in &self.projects {
            contributor.register_project(project);
        }
        for specifier in &self.dev_dependencies {
            contributor.register_dev_dependency(specifier)?;
        }
        Ok(())
    }
}

/// `<dir>/uvmake.yaml`. Pure, no I/O.
pub fn contributor_path_at(dir: &Path) -> PathBuf {
    dir.join(CONTRIBUTOR_FILE)
}

/// Load `<dir>/uvmake.yaml`.
///
/// Returns `ConfigError::ContributorNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed. An empty
/// file contributes nothing.
pub fn load_at(dir: &Path) -> Result<ContributorFile, ConfigError> {
    let path = contributor_path_at(dir);
    if !path.exists() {
        return Err(ConfigError::ContributorNotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(ContributorFile::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// Walk the configuration tree rooted at `root`, calling `visit` once per
/// directory with its parsed file. Returns the number of directories visited.
pub fn walk_at<F>(root: &Path, mut visit: F) -> Result<usize, ConfigError>
where
    F: FnMut(&Path, &ContributorFile) -> Result<(), ConfigError>,
{
    let root = normalize_lexically(root);
    let mut seen = HashSet::new();
    seen.insert(root.clone());
    let mut visited = 0;
    walk_dir(&root, &mut seen, &mut visit, &mut visited)?;
    Ok(visited)
}

fn walk_dir<F>(
    dir: &Path,
    seen: &mut HashSet<PathBuf>,
    visit: &mut F,
    visited: &mut usize,
) -> Result<(), ConfigError>
where
    F: FnMut(&Path, &ContributorFile) -> Result<(), ConfigError>,
{
    let file = load_at(dir)?;
    visit(dir, &file)?;
    *visited += 1;

    for sub in &file.subdirectories {
        let child = normalize_lexically(&dir.join(sub));
        if !seen.insert(child.clone()) {
            return Err(ConfigError::DuplicateSubdirectory { path: child });
        }
        walk_dir(&child, seen, visit, visited)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
