//! Subprocess boundary.
//!
//! Every external program the harness touches goes through [`ProcessRunner`]. The default
//! [`SystemRunner`] spawns real processes; tests substitute a scripted runner so the pipeline can be
//! exercised without an interpreter, a network, or the provisioner.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::env::EnvMap;
use super::error::{CapturedOutput, ExitStatusText, HarnessError, HarnessResult};

/// How a step's stdout/stderr are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Capture output so it can be attached to a failure.
    #[default]
    Capture,
    /// Stream output to the terminal as it is produced.
    Inherit,
}

/// A fully described subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    /// Complete child environment. `None` inherits the ambient environment unchanged.
    pub env: Option<EnvMap>,
    pub output: OutputMode,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: None,
            output: OutputMode::Capture,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, env: EnvMap) -> Self {
        self.env = Some(env);
        self
    }

    pub fn output(mut self, mode: OutputMode) -> Self {
        self.output = mode;
        self
    }

    /// Program name as displayed in logs and errors.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Argument list as lossy strings (handy for assertions and logs).
    pub fn arg_strings(&self) -> Vec<String> {
        self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.contains(char::is_whitespace) {
                // Inline scripts are long; keep log lines readable.
                let first = arg.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
                write!(f, " '{}…'", first)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of a finished subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub status: ExitStatusText,
    pub captured: CapturedOutput,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == ExitStatusText::Code(0)
    }
}

/// Run subprocesses on behalf of the harness.
///
/// Implementations return `Err` only when the process could not be started at all; a process that
/// ran and exited non-zero is an `Ok` with an unsuccessful [`ProcessOutput`]. Stages decide what
/// a non-zero exit means.
pub trait ProcessRunner {
    fn run(&self, command: &CommandSpec) -> HarnessResult<ProcessOutput>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, command: &CommandSpec) -> HarnessResult<ProcessOutput> {
        (**self).run(command)
    }
}

/// Blocking `std::process::Command` execution (current behavior).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> HarnessResult<ProcessOutput> {
        tracing::debug!(command = %spec, cwd = ?spec.cwd, "spawning");

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        if let Some(env) = &spec.env {
            command.env_clear().envs(env);
        }

        let spawn_error = |source| HarnessError::Spawn {
            program: spec.program_name(),
            source,
        };

        match spec.output {
            OutputMode::Capture => {
                let output = command.stdin(Stdio::null()).output().map_err(spawn_error)?;
                Ok(ProcessOutput {
                    status: status_text(output.status),
                    captured: CapturedOutput {
                        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    },
                })
            }
            OutputMode::Inherit => {
                let status = command
                    .stdin(Stdio::null())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(spawn_error)?;
                Ok(ProcessOutput {
                    status: status_text(status),
                    captured: CapturedOutput::default(),
                })
            }
        }
    }
}

fn status_text(status: std::process::ExitStatus) -> ExitStatusText {
    match status.code() {
        Some(code) => ExitStatusText::Code(code),
        None => ExitStatusText::Signal,
    }
}
