//! Environment provisioner: `uv venv -p <spec> <path>`.

use std::path::{Path, PathBuf};

use super::error::{HarnessError, HarnessResult};
use super::process::{CommandSpec, OutputMode, ProcessRunner};

/// Filesystem layout of a virtual environment's interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterLayout {
    /// `Scripts/python.exe`
    Windows,
    /// `bin/python`
    Posix,
}

impl InterpreterLayout {
    /// Layout of the platform this binary was built for.
    pub fn host() -> Self {
        if cfg!(windows) {
            InterpreterLayout::Windows
        } else {
            InterpreterLayout::Posix
        }
    }

    /// Interpreter path relative to the environment root.
    pub fn relative_interpreter(self) -> &'static Path {
        match self {
            InterpreterLayout::Windows => Path::new("Scripts/python.exe"),
            InterpreterLayout::Posix => Path::new("bin/python"),
        }
    }

    pub fn interpreter_in(self, env_root: &Path) -> PathBuf {
        env_root.join(self.relative_interpreter())
    }
}

/// An isolated interpreter environment created for a single case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedEnv {
    pub spec: String,
    pub root: PathBuf,
    pub interpreter: PathBuf,
}

/// Create interpreter environments with the provisioner program.
#[derive(Debug, Clone)]
pub struct Provisioner {
    program: PathBuf,
    layout: InterpreterLayout,
    output: OutputMode,
}

impl Provisioner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            layout: InterpreterLayout::host(),
            output: OutputMode::Capture,
        }
    }

    pub fn with_layout(mut self, layout: InterpreterLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the provisioning command. The ambient environment is inherited unchanged.
    pub fn command(&self, spec: &str, target: &Path) -> CommandSpec {
        CommandSpec::new(self.program.as_os_str())
            .args(["venv", "-p", spec])
            .arg(target.as_os_str())
            .output(self.output)
    }

    /// Provision an environment for `spec` rooted at `target`.
    ///
    /// ## Errors
    /// - [`HarnessError::Provisioning`] when the provisioner exits non-zero.
    /// - [`HarnessError::MissingInterpreter`] when it succeeds but leaves no interpreter behind.
    pub fn provision(&self, runner: &dyn ProcessRunner, spec: &str, target: &Path) -> HarnessResult<ProvisionedEnv> {
        let command = self.command(spec, target);
        let output = runner.run(&command)?;
        if !output.success() {
            return Err(HarnessError::Provisioning {
                spec: spec.to_string(),
                status: output.status,
                output: output.captured,
            });
        }

        let interpreter = self.layout.interpreter_in(target);
        if !interpreter.exists() {
            return Err(HarnessError::MissingInterpreter { interpreter });
        }

        Ok(ProvisionedEnv {
            spec: spec.to_string(),
            root: target.to_path_buf(),
            interpreter,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::harness::error::{CapturedOutput, ExitStatusText};
    use crate::harness::process::ProcessOutput;

    #[test]
    fn test_interpreter_layouts() {
        let root = Path::new("/work/.venv");
        assert_eq!(
            InterpreterLayout::Posix.interpreter_in(root),
            PathBuf::from("/work/.venv/bin/python")
        );
        assert_eq!(
            InterpreterLayout::Windows.interpreter_in(root),
            root.join("Scripts/python.exe")
        );
    }

    #[test]
    fn test_host_layout_matches_target() {
        let expected = if cfg!(windows) {
            InterpreterLayout::Windows
        } else {
            InterpreterLayout::Posix
        };
        assert_eq!(InterpreterLayout::host(), expected);
    }

    #[test]
    fn test_command_shape() {
        let provisioner = Provisioner::new("uv");
        let command = provisioner.command("3.14", Path::new("/work/.venv"));
        assert_eq!(command.program_name(), "uv");
        assert_eq!(command.arg_strings(), vec!["venv", "-p", "3.14", "/work/.venv"]);
        assert!(command.env.is_none());
        assert!(command.cwd.is_none());
    }

    /// Pretends to be `uv venv`: lays out an interpreter for the requested layout.
    struct FakeVenv(InterpreterLayout);

    impl ProcessRunner for FakeVenv {
        fn run(&self, command: &CommandSpec) -> HarnessResult<ProcessOutput> {
            let target = Path::new(command.args.last().unwrap());
            let interpreter = self.0.interpreter_in(target);
            std::fs::create_dir_all(interpreter.parent().unwrap()).unwrap();
            std::fs::write(&interpreter, "").unwrap();
            Ok(ProcessOutput {
                status: ExitStatusText::Code(0),
                captured: CapturedOutput::default(),
            })
        }
    }

    #[test]
    fn test_provision_with_explicit_layout() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".venv");
        let provisioner = Provisioner::new("/opt/uv").with_layout(InterpreterLayout::Windows);
        assert_eq!(provisioner.program(), Path::new("/opt/uv"));

        let env = provisioner
            .provision(&FakeVenv(InterpreterLayout::Windows), "3.14", &target)
            .unwrap();
        assert_eq!(env.spec, "3.14");
        assert_eq!(env.root, target);
        assert_eq!(env.interpreter, target.join("Scripts/python.exe"));
    }

    #[test]
    fn test_provision_layout_mismatch_is_missing_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let err = Provisioner::new("uv")
            .with_layout(InterpreterLayout::Posix)
            .provision(&FakeVenv(InterpreterLayout::Windows), "3.12", &dir.path().join(".venv"))
            .unwrap_err();
        assert!(matches!(err, HarnessError::MissingInterpreter { .. }));
    }
}
