//! Manifest generation: query member identities, render, write atomically.
//!
//! Every member name is queried and checked for collisions before the
//! manifest is touched, so a failed query leaves the previous manifest in place.

use std::collections::HashMap;
use std::path::Path;

use uvmake_core::{InitializationConfig, ProjectRef};
use uvmake_renderer::{module_name, ManifestContext, MemberCtx, Renderer};

use crate::error::SyncError;
use crate::process::Runner;
use crate::uv::Uv;
use crate::writer::{self, WriteResult};

/// Outcome of one regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedManifest {
    pub write: WriteResult,
    /// Rendered members in manifest order.
    pub members: Vec<MemberCtx>,
}

/// Build the template context for `members`, asking `uv` for each name.
pub fn build_context<R: Runner>(
    config: &InitializationConfig,
    members: &[&ProjectRef],
    uv: &Uv<R>,
) -> Result<ManifestContext, SyncError> {
    let manifest_dir = config.manifest_dir();
    let mut rendered = Vec::with_capacity(members.len());
    let mut declared: HashMap<String, &Path> = HashMap::new();
    for member in members {
        let project_dir = member.project_dir();
        let identity = uv.query_project(project_dir)?;
        tracing::debug!("member {} -> {}", project_dir.display(), identity.name);
        if let Some(first) = declared.insert(identity.name.clone(), project_dir) {
            return Err(SyncError::DuplicateMemberName {
                name: identity.name,
                first: first.to_path_buf(),
                second: project_dir.to_path_buf(),
            });
        }
        rendered.push(MemberCtx::new(identity.name, project_dir, manifest_dir));
    }
    Ok(ManifestContext::new(
        &config.package_name,
        &config.package_version,
        &config.python,
        rendered,
    ))
}

/// Regenerate the managed manifest for `members` and create the placeholder
/// package directory next to it.
pub fn generate<R: Runner>(
    config: &InitializationConfig,
    members: &[&ProjectRef],
    uv: &Uv<R>,
    renderer: &Renderer,
) -> Result<GeneratedManifest, SyncError> {
    let ctx = build_context(config, members, uv)?;
    let content = renderer.render(&ctx)?;
    let write = writer::write_atomic(&config.manifest_path, &content)?;

    let package_dir = config
        .manifest_dir()
        .join("src")
        .join(module_name(&config.package_name));
    writer::ensure_dir(&package_dir)?;

    Ok(GeneratedManifest {
        write,
        members: ctx.members,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::process::{Step, ToolCommand, ToolOutput};
    use tempfile::TempDir;
    use uvmake_core::InitOptions;

    /// Answers `uv version` with the project directory's file name.
    struct Namer {
        fail_on: Option<&'static str>,
    }

    impl Runner for Namer {
        fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
            let dir = command.arg_value("--project").unwrap_or_default();
            let name = Path::new(dir)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.fail_on == Some(name.as_str()) {
                return Err(ToolError::Failed {
                    step: Step::QueryProject,
                    command: command.display_command(),
                    code: Some(2),
                    stderr: "error: No `pyproject.toml` found".into(),
                });
            }
            Ok(ToolOutput {
                stdout: format!("{name} 0.1.0\n"),
                stderr: String::new(),
            })
        }
    }

    fn config(root: &Path) -> InitializationConfig {
        InitOptions {
            package_name: Some("Demo-Pkg".into()),
            python: Some(">=3.12".into()),
            ..InitOptions::default()
        }
        .resolve(root)
        .unwrap()
    }

    fn refs(root: &Path, names: &[&str]) -> Vec<ProjectRef> {
        names
            .iter()
            .map(|n| ProjectRef(root.join(n).join("pyproject.toml")))
            .collect()
    }

    #[test]
    fn generate_writes_manifest_and_package_dir() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(tmp.path());
        let refs = refs(tmp.path(), &["a", "b"]);
        let members: Vec<&ProjectRef> = refs.iter().collect();
        let uv = Uv::new("uv", Namer { fail_on: None });

        let out = generate(&cfg, &members, &uv, &Renderer::new().unwrap()).unwrap();

        assert!(out.write.is_written());
        let names: Vec<&str> = out.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(out.members[1].path, "b");
        assert!(tmp.path().join("src").join("demo_pkg").is_dir());

        let text = std::fs::read_to_string(tmp.path().join("pyproject.toml")).unwrap();
        let table: toml::Table = text.parse().unwrap();
        assert_eq!(table["project"]["name"].as_str(), Some("Demo-Pkg"));
    }

    #[test]
    fn failed_query_keeps_previous_manifest() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(tmp.path());
        std::fs::write(&cfg.manifest_path, "# previous\n").unwrap();
        let refs = refs(tmp.path(), &["a", "broken"]);
        let members: Vec<&ProjectRef> = refs.iter().collect();
        let uv = Uv::new("uv", Namer { fail_on: Some("broken") });

        let err = generate(&cfg, &members, &uv, &Renderer::new().unwrap()).unwrap_err();
        assert!(matches!(err, SyncError::Tool(ToolError::Failed { step: Step::QueryProject, .. })));
        assert_eq!(std::fs::read_to_string(&cfg.manifest_path).unwrap(), "# previous\n");
    }

    #[test]
    fn colliding_member_names_keep_previous_manifest() {
        let tmp = TempDir::new().unwrap();
        let cfg = config(tmp.path());
        std::fs::write(&cfg.manifest_path, "# previous\n").unwrap();
        let refs = refs(tmp.path(), &["libs/core", "tools/core"]);
        let members: Vec<&ProjectRef> = refs.iter().collect();
        let uv = Uv::new("uv", Namer { fail_on: None });

        let err = generate(&cfg, &members, &uv, &Renderer::new().unwrap()).unwrap_err();
        match err {
            SyncError::DuplicateMemberName { name, first, second } => {
                assert_eq!(name, "core");
                assert_eq!(first, tmp.path().join("libs").join("core"));
                assert_eq!(second, tmp.path().join("tools").join("core"));
            }
            other => panic!("expected duplicate name, got {other:?}"),
        }
        assert_eq!(std::fs::read_to_string(&cfg.manifest_path).unwrap(), "# previous\n");
        assert!(!tmp.path().join("src").exists());
    }

    #[test]
    fn members_outside_manifest_dir_use_parent_segments() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = config(tmp.path());
        cfg.manifest_path = tmp.path().join("py").join("pyproject.toml");
        let refs = vec![ProjectRef(tmp.path().join("libs").join("c"))];
        let members: Vec<&ProjectRef> = refs.iter().collect();
        let uv = Uv::new("uv", Namer { fail_on: None });

        let ctx = build_context(&cfg, &members, &uv).unwrap();
        assert_eq!(ctx.members[0].path, "../libs/c");
        assert_eq!(ctx.package_dir, "src/demo_pkg");
    }
}
