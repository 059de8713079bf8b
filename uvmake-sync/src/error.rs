//! Error types for uvmake-sync.

use std::path::PathBuf;

use thiserror::Error;

use uvmake_core::ConfigError;
use uvmake_renderer::RenderError;

use crate::process::Step;

/// A failed external-tool invocation. Never retried.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program could not be started at all.
    #[error("{step}: failed to run `{program}`: {source}")]
    Spawn {
        step: Step,
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully; `stderr` is its own diagnostic.
    #[error("{step}: `{command}` {}\n{stderr}", describe_exit(.code))]
    Failed {
        step: Step,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The program succeeded but printed something we could not interpret.
    #[error("{step}: unexpected output from `{command}`: {detail}")]
    UnexpectedOutput {
        step: Step,
        command: String,
        detail: String,
    },
}

impl ToolError {
    /// The step that failed.
    pub fn step(&self) -> Step {
        match self {
            ToolError::Spawn { step, .. }
            | ToolError::Failed { step, .. }
            | ToolError::UnexpectedOutput { step, .. } => *step,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_owned(),
    }
}

/// All errors that can arise from finalize, install and status operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Configuration error (bad options, bad contributor files, bad specifiers).
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An external-tool failure.
    #[error("package tool failed: {0}")]
    Tool(#[from] ToolError),

    /// Two member projects declare the same package name; the manifest would
    /// carry the name twice as a `[tool.uv.sources]` key.
    #[error("package name `{name}` is declared by both {} and {}", .first.display(), .second.display())]
    DuplicateMemberName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (snapshot).
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
