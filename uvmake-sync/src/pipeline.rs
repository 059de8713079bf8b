//! Collect-then-finalize pipeline shared by `configure` and `install`.
//!
//! A [`Session`] owns the accumulator for one configuration pass. It is
//! consumed by [`Session::finalize`], so finalization happens at most once.

use std::path::{Path, PathBuf};

use chrono::Utc;

use uvmake_core::{
    contributor, ConfigCell, ConfigError, Contributor, ContributorSet, DevDependency, InitOptions,
    InitializationConfig,
};
use uvmake_renderer::{MemberCtx, Renderer};

use crate::error::SyncError;
use crate::manifest;
use crate::process::Runner;
use crate::snapshot::{self, Snapshot};
use crate::uv::Uv;
use crate::writer::{self, WriteResult};

/// Collect-phase state: the resolved config plus everything registered so far.
#[derive(Debug)]
pub struct Session {
    config: InitializationConfig,
    contributions: ContributorSet,
}

/// What one finalization did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeReport {
    /// Whether the snapshot comparison triggered the regenerate branch.
    pub regenerated: bool,
    /// Snapshot fields that differed from the previous pass.
    pub changed_fields: Vec<String>,
    /// Manifest write outcome; `None` when the manifest was not generated.
    pub manifest: Option<WriteResult>,
    /// Members written to the manifest, in order.
    pub members: Vec<MemberCtx>,
    pub dev_dependencies_added: Vec<DevDependency>,
    /// Environment the sync step targeted.
    pub environment: PathBuf,
}

impl Session {
    pub fn new(config: InitializationConfig) -> Self {
        Session {
            config,
            contributions: ContributorSet::new(),
        }
    }

    pub fn config(&self) -> &InitializationConfig {
        &self.config
    }

    pub fn contributions(&self) -> &ContributorSet {
        &self.contributions
    }

    /// Registration handle for a contributor rooted at `base`.
    pub fn contributor(&mut self, base: impl Into<PathBuf>) -> Contributor<'_> {
        Contributor::new(base, &mut self.contributions)
    }

    /// Run the deferred finalization:
    ///
    /// 1. compare the serialized contributions against the snapshot;
    /// 2. on any change, regenerate the managed manifest and add every dev
    ///    dependency in order, then persist the new snapshot;
    /// 3. always sync the dev environment, exactly once.
    ///
    /// The first failing `uv` call aborts the pass; nothing is retried.
    pub fn finalize<R: Runner>(self, runner: R) -> Result<FinalizeReport, SyncError> {
        let Session {
            config,
            contributions,
        } = self;
        let uv = Uv::new(&config.uv, runner);

        let previous = snapshot::load_at(&config.state_dir)?;
        let fields = snapshot::current_fields(&config, &contributions)?;
        let changed_fields = snapshot::changed_fields(&fields, previous.as_ref());

        let manifest_missing = config.is_managed() && !config.manifest_path.exists();
        if changed_fields.is_empty() && manifest_missing {
            tracing::info!(
                "managed manifest {} is missing; regenerating",
                config.manifest_path.display()
            );
        }
        let regenerated = !changed_fields.is_empty() || manifest_missing;

        let mut manifest = None;
        let mut members = Vec::new();
        let mut dev_dependencies_added = Vec::new();

        if regenerated {
            if config.is_managed() {
                let renderer = Renderer::new()?;
                let generated =
                    manifest::generate(&config, &contributions.members(), &uv, &renderer)?;
                manifest = Some(generated.write);
                members = generated.members;
            } else {
                tracing::debug!(
                    "unmanaged manifest {}; leaving it untouched",
                    config.manifest_path.display()
                );
            }

            for dependency in contributions.dev_dependency_specifiers() {
                uv.add_dev_dependency(config.manifest_dir(), dependency)?;
                dev_dependencies_added.push(dependency.clone());
            }

            let manifest_sha256 = if config.is_managed() {
                writer::hash_file(&config.manifest_path)?
            } else {
                None
            };
            snapshot::save_at(
                &config.state_dir,
                &Snapshot {
                    configured_at: Utc::now(),
                    fields,
                    manifest_sha256,
                },
            )?;
        } else {
            tracing::info!("contributions unchanged; skipping manifest regeneration");
        }

        uv.sync_environment(config.manifest_dir(), &config.dev_environment, &config.python)?;

        Ok(FinalizeReport {
            regenerated,
            changed_fields,
            manifest,
            members,
            dev_dependencies_added,
            environment: config.dev_environment,
        })
    }
}

/// Walk the configuration tree at `root` and build the collect-phase session.
///
/// The root's `workspace` block, with `overrides` taking precedence,
/// initializes `cell`. Later `workspace` blocks reach an initialized cell and
/// are ignored. Every error here happens before any file is written.
pub fn collect_at(
    root: &Path,
    overrides: &InitOptions,
    cell: &ConfigCell,
) -> Result<Session, SyncError> {
    let mut contributions = ContributorSet::new();
    let mut first = true;

    let visited = contributor::walk_at(root, |dir, file| {
        if first {
            let options = overrides
                .clone()
                .or(file.workspace.clone().unwrap_or_default());
            cell.initialize(&options, dir)?;
            first = false;
        } else if let Some(workspace) = &file.workspace {
            cell.initialize(workspace, dir)?;
        }
        file.contribute(&mut Contributor::new(dir, &mut contributions))
    })?;

    let config = cell
        .get()
        .cloned()
        .ok_or(ConfigError::MissingField("package_name"))?;
    tracing::info!(
        "collected {} contributor file(s): {} project reference(s), {} dev dependency specifier(s)",
        visited,
        contributions.project_references().len(),
        contributions.dev_dependency_specifiers().len()
    );
    Ok(Session {
        config,
        contributions,
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
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Echo {
        seen: RefCell<Vec<Step>>,
    }

    impl Runner for Echo {
        fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
            self.seen.borrow_mut().push(command.step());
            Ok(ToolOutput {
                stdout: "member 0.1.0\n".into(),
                stderr: String::new(),
            })
        }
    }

    fn session(root: &Path) -> Session {
        let config = InitOptions {
            package_name: Some("demo".into()),
            python: Some(">=3.12".into()),
            ..InitOptions::default()
        }
        .resolve(root)
        .unwrap();
        Session::new(config)
    }

    #[test]
    fn empty_session_generates_and_syncs() {
        let tmp = TempDir::new().unwrap();
        let runner = Echo::default();
        let report = session(tmp.path()).finalize(&runner).unwrap();

        assert!(report.regenerated);
        assert!(report.members.is_empty());
        assert_eq!(*runner.seen.borrow(), [Step::SyncEnvironment]);
        assert!(tmp.path().join("pyproject.toml").exists());
        assert!(snapshot::load_at(&tmp.path().join(".uvmake")).unwrap().is_some());
    }

    #[test]
    fn contributor_handle_resolves_against_base() {
        let tmp = TempDir::new().unwrap();
        let mut s = session(tmp.path());
        s.contributor(tmp.path().join("libs")).register_project("a");
        assert_eq!(
            s.contributions().project_references()[0].as_path(),
            tmp.path().join("libs").join("a")
        );
    }
}
