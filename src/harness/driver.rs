//! Tool driver: `<interpreter> -m mutmut run` inside the synthesized project.

use std::path::Path;

use mutcheck_core::vocab;

use super::env::EnvOverrides;
use super::error::{HarnessError, HarnessResult};
use super::process::{CommandSpec, OutputMode, ProcessRunner};

#[derive(Debug, Clone)]
pub struct ToolDriver {
    module: String,
    env: EnvOverrides,
    output: OutputMode,
}

impl ToolDriver {
    pub fn new(module: impl Into<String>, env: EnvOverrides) -> Self {
        Self {
            module: module.into(),
            env,
            output: OutputMode::Capture,
        }
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn command(&self, interpreter: &Path, project_root: &Path) -> CommandSpec {
        CommandSpec::new(interpreter.as_os_str())
            .args(["-m", self.module.as_str(), vocab::TOOL_RUN_SUBCOMMAND])
            .current_dir(project_root)
            .env(self.env.resolve())
            .output(self.output)
    }

    /// Run the tool to completion. Exit code zero is the only success; there is no retry.
    pub fn drive(&self, runner: &dyn ProcessRunner, interpreter: &Path, project_root: &Path) -> HarnessResult<()> {
        let output = runner.run(&self.command(interpreter, project_root))?;
        if output.success() {
            return Ok(());
        }
        Err(HarnessError::ToolExecution {
            module: self.module.clone(),
            status: output.status,
            output: output.captured,
        })
    }
}
