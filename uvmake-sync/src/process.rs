//! Subprocess seam: [`ToolCommand`] describes one invocation, a [`Runner`]
//! executes it. [`SystemRunner`] is the only code that spawns processes.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::ToolError;

/// Which external-tool operation an invocation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    CreateEnvironment,
    SyncEnvironment,
    QueryProject,
    AddDevDependency,
    LockCheck,
    ExportLockfile,
    BuildWheel,
    InstallWheel,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::CreateEnvironment => "create-environment",
            Step::SyncEnvironment => "sync-environment",
            Step::QueryProject => "query-project",
            Step::AddDevDependency => "add-dev-dependency",
            Step::LockCheck => "lock-check",
            Step::ExportLockfile => "export-lockfile",
            Step::BuildWheel => "build-wheel",
            Step::InstallWheel => "install-wheel",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ToolCommand
// ---------------------------------------------------------------------------

/// Builder for a single external-tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    step: Step,
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(step: Step, program: impl AsRef<Path>) -> Self {
        ToolCommand {
            step,
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string_lossy().into_owned()));
        self
    }

    /// Override an environment variable for this invocation only.
    pub fn env(mut self, key: impl Into<String>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .insert(key.into(), value.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Value following `flag` in the argument list, if any.
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    pub fn env_overrides(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Environment the child process sees when started from `ambient`:
    /// the ambient variables with this command's overrides on top.
    pub fn effective_env<I, K, V>(&self, ambient: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut env: BTreeMap<String, String> = ambient
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        env.extend(self.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| {
            if a.contains(' ') {
                format!("'{a}'")
            } else {
                a.clone()
            }
        }));
        parts.join(" ")
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.envs(&self.env);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes [`ToolCommand`]s synchronously. A non-zero exit is an error.
pub trait Runner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError>;
}

impl<R: Runner + ?Sized> Runner for &R {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        (**self).run(command)
    }
}

/// Runs commands as real child processes, inheriting the ambient environment
/// except for each command's overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        let display = command.display_command();
        tracing::info!("[{}] {}", command.step, display);

        let output = command
            .build_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ToolError::Spawn {
                step: command.step,
                program: command.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(ToolError::Failed {
                step: command.step,
                command: display,
                code: output.status.code(),
                stderr: stderr.trim_end().to_owned(),
            });
        }
        if !stderr.trim().is_empty() {
            tracing::debug!("[{}] {}", command.step, stderr.trim_end());
        }
        Ok(ToolOutput { stdout, stderr })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
