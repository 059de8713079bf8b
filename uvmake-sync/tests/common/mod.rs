#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;

use uvmake_core::InitOptions;
use uvmake_sync::{Runner, Session, Step, ToolCommand, ToolError, ToolOutput};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Stand-in for `uv`: records every command and fakes the output the
/// pipeline reads back.
///
/// - `query-project` answers `<project dir name> 0.1.0`;
/// - `build-wheel` drops one wheel per call into `--out-dir`;
/// - the configured failing step exits 2 with a fixed stderr.
#[derive(Default)]
pub struct RecordingRunner {
    commands: RefCell<Vec<ToolCommand>>,
    fail_on: Option<Step>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(step: Step) -> Self {
        RecordingRunner {
            fail_on: Some(step),
            ..Self::default()
        }
    }

    pub fn commands(&self) -> Vec<ToolCommand> {
        self.commands.borrow().clone()
    }

    pub fn steps(&self) -> Vec<Step> {
        self.commands.borrow().iter().map(ToolCommand::step).collect()
    }

    pub fn last(&self, step: Step) -> ToolCommand {
        self.commands
            .borrow()
            .iter()
            .rev()
            .find(|c| c.step() == step)
            .cloned()
            .unwrap_or_else(|| panic!("no {step} command recorded"))
    }
}

impl Runner for RecordingRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        self.commands.borrow_mut().push(command.clone());

        if self.fail_on == Some(command.step()) {
            return Err(ToolError::Failed {
                step: command.step(),
                command: command.display_command(),
                code: Some(2),
                stderr: "error: simulated failure".into(),
            });
        }

        let stdout = match command.step() {
            Step::QueryProject => {
                let dir = command.arg_value("--project").unwrap_or_default();
                let name = Path::new(dir)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("{name} 0.1.0\n")
            }
            Step::BuildWheel => {
                let out_dir = Path::new(command.arg_value("--out-dir").unwrap_or_default());
                std::fs::create_dir_all(out_dir).expect("create out dir");
                std::fs::write(out_dir.join("demo-0.1.0-py3-none-any.whl"), "").expect("fake wheel");
                String::new()
            }
            _ => String::new(),
        };
        Ok(ToolOutput {
            stdout,
            stderr: String::new(),
        })
    }
}

pub fn demo_options() -> InitOptions {
    InitOptions {
        package_name: Some("demo".into()),
        python: Some(">=3.12".into()),
        ..InitOptions::default()
    }
}

/// A session rooted at `root` with `projects` (directories under `root`)
/// and `deps` registered in order.
pub fn demo_session(root: &Path, options: &InitOptions, projects: &[&str], deps: &[&str]) -> Session {
    let config = options.resolve(root).expect("resolve");
    let mut session = Session::new(config);
    {
        let mut contributor = session.contributor(root);
        for project in projects {
            contributor.register_project(format!("{project}/pyproject.toml"));
        }
        for dep in deps {
            contributor.register_dev_dependency(dep).expect("specifier");
        }
    }
    session
}

/// Read and parse the manifest at `path`.
pub fn read_manifest(path: &Path) -> toml::Table {
    let text = std::fs::read_to_string(path).expect("read manifest");
    text.parse().expect("valid TOML")
}

pub fn string_array(value: &toml::Value) -> Vec<String> {
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v.as_str().expect("string").to_owned())
        .collect()
}
