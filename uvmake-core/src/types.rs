//! Contribution accumulator: project references and dev-dependency
//! specifiers registered during the collection phase.
//!
//! All path fields use `PathBuf`; references are resolved against the
//! registering contributor's directory and normalized lexically (no
//! filesystem access).

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Snapshot key for the serialized project references.
pub const PROJECT_REFERENCES: &str = "project_references";
/// Snapshot key for the serialized dev-dependency specifiers.
pub const DEV_DEPENDENCY_SPECIFIERS: &str = "dev_dependency_specifiers";

const PROJECT_DESCRIPTOR: &str = "pyproject.toml";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Path to a project descriptor (or project directory) registered by a contributor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectRef(pub PathBuf);

impl ProjectRef {
    /// Directory holding the project. A reference naming a `pyproject.toml`
    /// maps to its parent; anything else is taken as the directory itself.
    pub fn project_dir(&self) -> &Path {
        match (self.0.file_name(), self.0.parent()) {
            (Some(name), Some(parent)) if name == PROJECT_DESCRIPTOR => parent,
            _ => &self.0,
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

impl From<PathBuf> for ProjectRef {
    fn from(p: PathBuf) -> Self {
        Self(p)
    }
}

impl From<&Path> for ProjectRef {
    fn from(p: &Path) -> Self {
        Self(p.to_path_buf())
    }
}

/// A dev-dependency specifier (name plus optional version constraint).
///
/// Only constructed through [`DevDependency::parse`], which rejects input the
/// generated manifest cannot carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DevDependency(String);

impl DevDependency {
    /// Validate `specifier` against the denylist and wrap it.
    ///
    /// Environment markers (`; python_version < "3.13"`) are not supported.
    pub fn parse(specifier: &str) -> Result<Self, ConfigError> {
        let trimmed = specifier.trim();
        let reason = if trimmed.is_empty() {
            Some("specifier is empty")
        } else if trimmed.contains(';') {
            Some("environment markers (`;`) are not supported")
        } else if trimmed.contains(['\n', '\r']) {
            Some("line breaks are not allowed")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(ConfigError::UnsupportedSpecifier {
                specifier: specifier.to_owned(),
                reason,
            }),
            None => Ok(Self(trimmed.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DevDependency {
    type Error = ConfigError;

    fn try_from(specifier: String) -> Result<Self, Self::Error> {
        Self::parse(&specifier)
    }
}

impl From<DevDependency> for String {
    fn from(dependency: DevDependency) -> Self {
        dependency.0
    }
}

impl fmt::Display for DevDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// ContributorSet
// ---------------------------------------------------------------------------

/// Everything contributors registered during one configuration pass.
///
/// Append-only. Project references are deduplicated when read through
/// [`ContributorSet::members`]; dev-dependency specifiers are kept as
/// registered, duplicates included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributorSet {
    project_references: Vec<ProjectRef>,
    dev_dependency_specifiers: Vec<DevDependency>,
}

impl ContributorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_project(&mut self, project: ProjectRef) {
        self.project_references.push(project);
    }

    pub fn push_dev_dependency(&mut self, dependency: DevDependency) {
        self.dev_dependency_specifiers.push(dependency);
    }

    /// Every registered reference, duplicates included, in encounter order.
    pub fn project_references(&self) -> &[ProjectRef] {
        &self.project_references
    }

    pub fn dev_dependency_specifiers(&self) -> &[DevDependency] {
        &self.dev_dependency_specifiers
    }

    /// Workspace members: references in encounter order, first occurrence wins.
    ///
    /// Two references are the same member when they name the same project
    /// directory, so `a` and `a/pyproject.toml` collapse into one.
    pub fn members(&self) -> Vec<&ProjectRef> {
        let mut seen = HashSet::new();
        self.project_references
            .iter()
            .filter(|p| seen.insert(p.project_dir()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.project_references.is_empty() && self.dev_dependency_specifiers.is_empty()
    }

    /// Canonical, order-preserving form of `project_references`.
    pub fn serialized_projects(&self) -> Result<String, ConfigError> {
        let paths: Vec<String> = self
            .project_references
            .iter()
            .map(|p| p.0.to_string_lossy().into_owned())
            .collect();
        Ok(serde_json::to_string(&paths)?)
    }

    /// Canonical, order-preserving form of `dev_dependency_specifiers`.
    pub fn serialized_dev_dependencies(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(&self.dev_dependency_specifiers)?)
    }

    /// Both serialized fields keyed by their snapshot names.
    pub fn serialized_fields(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        let mut fields = BTreeMap::new();
        fields.insert(PROJECT_REFERENCES.to_owned(), self.serialized_projects()?);
        fields.insert(
            DEV_DEPENDENCY_SPECIFIERS.to_owned(),
            self.serialized_dev_dependencies()?,
        );
        Ok(fields)
    }
}

// ---------------------------------------------------------------------------
// Contributor handle
// ---------------------------------------------------------------------------

/// Registration handle given to one contributor.
///
/// Relative paths are resolved against `base`, the contributor's directory.
#[derive(Debug)]
pub struct Contributor<'a> {
    base: PathBuf,
    set: &'a mut ContributorSet,
}

impl<'a> Contributor<'a> {
    pub fn new(base: impl Into<PathBuf>, set: &'a mut ContributorSet) -> Self {
        Self {
            base: base.into(),
            set,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Append a project reference. Existence is not checked here.
    pub fn register_project(&mut self, path: impl AsRef<Path>) {
        let resolved = normalize_lexically(&self.base.join(path.as_ref()));
        tracing::debug!("registered project {}", resolved.display());
        self.set.push_project(ProjectRef(resolved));
    }

    /// Append a dev-dependency specifier after checking the denylist.
    pub fn register_dev_dependency(&mut self, specifier: &str) -> Result<(), ConfigError> {
        let dependency = DevDependency::parse(specifier)?;
        tracing::debug!("registered dev dependency {dependency}");
        self.set.push_dev_dependency(dependency);
        Ok(())
    }
}

/// Drop `.` components and fold `..` into preceding normal components.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
