//! Typed `uv` command surface.
//!
//! | Method                 | Invocation                                                         |
//! |------------------------|--------------------------------------------------------------------|
//! | `create_environment`   | `uv venv --allow-existing --python <py> <path>`                    |
//! | `sync_environment`     | `uv sync --project <dir> --python <py>` (environment shadowed)     |
//! | `query_project`        | `uv version --project <dir>`                                       |
//! | `add_dev_dependency`   | `uv add --project <dir> --dev --no-sync <spec>`                    |
//! | `lock_check`           | `uv lock --check --project <dir>`                                  |
//! | `export_requirements`  | `uv export --project <dir> --frozen --no-dev ... --output-file <f>`|
//! | `build_wheels`         | `uv build --project <dir> --all-packages --wheel --out-dir <d>`    |
//! | `install_requirements` | `uv pip install --python <env> -r <f> <wheels...>`                 |

use std::path::{Path, PathBuf};

use uvmake_core::DevDependency;

use crate::error::ToolError;
use crate::process::{Runner, Step, ToolCommand};

/// Variable naming the currently active virtual environment.
pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";
/// Variable selecting the environment `uv sync` targets.
pub const UV_PROJECT_ENVIRONMENT: &str = "UV_PROJECT_ENVIRONMENT";
/// Variable selecting uv's cache directory.
pub const UV_CACHE_DIR: &str = "UV_CACHE_DIR";

/// A project's declared name and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    pub name: String,
    pub version: String,
}

/// Parse `uv version` output (`<name> <version>` on the last non-empty line).
pub fn parse_project_identity(stdout: &str) -> Option<ProjectIdentity> {
    let line = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).last()?;
    let mut parts = line.split_whitespace();
    let name = parts.next()?;
    let version = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(ProjectIdentity {
        name: name.to_owned(),
        version: version.to_owned(),
    })
}

/// `uv` front end over a [`Runner`].
#[derive(Debug, Clone)]
pub struct Uv<R> {
    program: PathBuf,
    runner: R,
    cache_dir: Option<PathBuf>,
}

impl<R: Runner> Uv<R> {
    pub fn new(program: impl Into<PathBuf>, runner: R) -> Self {
        Uv {
            program: program.into(),
            runner,
            cache_dir: None,
        }
    }

    /// Run every command with `UV_CACHE_DIR` set to `dir`.
    pub fn with_cache_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.cache_dir = dir;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn command(&self, step: Step) -> ToolCommand {
        let cmd = ToolCommand::new(step, &self.program);
        match &self.cache_dir {
            Some(dir) => cmd.env(UV_CACHE_DIR, dir),
            None => cmd,
        }
    }

    /// Create the environment at `path`, reusing one that already exists.
    pub fn create_environment(&self, path: &Path, python: &str) -> Result<(), ToolError> {
        let cmd = self
            .command(Step::CreateEnvironment)
            .args(["venv", "--allow-existing", "--python", python])
            .arg(path);
        self.runner.run(&cmd)?;
        Ok(())
    }

    /// The sync invocation: `environment` is the target, and any ambient
    /// active environment is shadowed so uv neither targets it nor warns
    /// about the mismatch.
    pub fn sync_command(&self, project_dir: &Path, environment: &Path, python: &str) -> ToolCommand {
        self.command(Step::SyncEnvironment)
            .args(["sync", "--project"])
            .arg(project_dir)
            .args(["--python", python])
            .env(UV_PROJECT_ENVIRONMENT, environment)
            .env(VIRTUAL_ENV, environment)
    }

    pub fn sync_environment(
        &self,
        project_dir: &Path,
        environment: &Path,
        python: &str,
    ) -> Result<(), ToolError> {
        self.runner
            .run(&self.sync_command(project_dir, environment, python))?;
        Ok(())
    }

    /// Declared name and version of the project in `project_dir`.
    pub fn query_project(&self, project_dir: &Path) -> Result<ProjectIdentity, ToolError> {
        let cmd = self
            .command(Step::QueryProject)
            .args(["version", "--project"])
            .arg(project_dir);
        let out = self.runner.run(&cmd)?;
        parse_project_identity(&out.stdout).ok_or_else(|| ToolError::UnexpectedOutput {
            step: Step::QueryProject,
            command: cmd.display_command(),
            detail: format!("expected `<name> <version>`, got {:?}", out.stdout.trim()),
        })
    }

    /// Add `dependency` to the dev group of the manifest in `project_dir`.
    pub fn add_dev_dependency(
        &self,
        project_dir: &Path,
        dependency: &DevDependency,
    ) -> Result<(), ToolError> {
        let cmd = self
            .command(Step::AddDevDependency)
            .args(["add", "--project"])
            .arg(project_dir)
            .args(["--dev", "--no-sync", dependency.as_str()]);
        self.runner.run(&cmd)?;
        Ok(())
    }

    /// Fail if the lockfile is out of date with the manifest.
    pub fn lock_check(&self, project_dir: &Path) -> Result<(), ToolError> {
        let cmd = self
            .command(Step::LockCheck)
            .args(["lock", "--check", "--project"])
            .arg(project_dir);
        self.runner.run(&cmd)?;
        Ok(())
    }

    /// Export locked third-party requirements (no dev group, no workspace
    /// members) to `output`.
    pub fn export_requirements(&self, project_dir: &Path, output: &Path) -> Result<(), ToolError> {
        let cmd = self
            .command(Step::ExportLockfile)
            .args(["export", "--project"])
            .arg(project_dir)
            .args([
                "--frozen",
                "--no-dev",
                "--no-hashes",
                "--no-emit-workspace",
                "--output-file",
            ])
            .arg(output);
        self.runner.run(&cmd)?;
        Ok(())
    }

    /// Build a wheel for every workspace package into `out_dir`.
    pub fn build_wheels(&self, project_dir: &Path, out_dir: &Path) -> Result<(), ToolError> {
        let cmd = self
            .command(Step::BuildWheel)
            .args(["build", "--project"])
            .arg(project_dir)
            .args(["--all-packages", "--wheel", "--out-dir"])
            .arg(out_dir);
        self.runner.run(&cmd)?;
        Ok(())
    }

    /// Install `requirements` and `wheels` into `environment`.
    pub fn install_requirements(
        &self,
        environment: &Path,
        requirements: &Path,
        wheels: &[PathBuf],
    ) -> Result<(), ToolError> {
        let cmd = self
            .command(Step::InstallWheel)
            .args(["pip", "install", "--python"])
            .arg(environment)
            .arg("-r")
            .arg(requirements)
            .args(wheels)
            .env(VIRTUAL_ENV, environment);
        self.runner.run(&cmd)?;
        Ok(())
    }
}
