//! Template context: serializable rendering payload for the workspace manifest.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Everything the manifest template reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestContext {
    pub package_name: String,
    pub package_version: String,
    /// `requires-python` constraint.
    pub python: String,
    /// Placeholder package directory, relative to the manifest (`src/<module>`).
    pub package_dir: String,
    /// Workspace members in encounter order.
    pub members: Vec<MemberCtx>,
}

/// One workspace member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCtx {
    /// Declared package name, as reported by the package tool.
    pub name: String,
    /// Project directory relative to the manifest directory, `/`-separated.
    pub path: String,
}

impl MemberCtx {
    pub fn new(name: impl Into<String>, project_dir: &Path, manifest_dir: &Path) -> Self {
        Self {
            name: name.into(),
            path: relative_path(project_dir, manifest_dir),
        }
    }
}

impl ManifestContext {
    pub fn new(
        package_name: impl Into<String>,
        package_version: impl Into<String>,
        python: impl Into<String>,
        members: Vec<MemberCtx>,
    ) -> Self {
        let package_name = package_name.into();
        let package_dir = format!("src/{}", module_name(&package_name));
        Self {
            package_name,
            package_version: package_version.into(),
            python: python.into(),
            package_dir,
            members,
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

/// Import name for a distribution name: lowercase, `-` and `.` become `_`.
pub fn module_name(package_name: &str) -> String {
    package_name
        .trim()
        .to_lowercase()
        .replace(['-', '.'], "_")
}

fn relative_path(target: &Path, base: &Path) -> String {
    let rel = pathdiff::diff_paths(target, base).unwrap_or_else(|| target.to_path_buf());
    let rel = rel.to_string_lossy().replace('\\', "/");
    if rel.is_empty() {
        ".".to_owned()
    } else {
        rel
    }
}
