//! Failure taxonomy for a harness case.
//!
//! Each subprocess stage has exactly one failure variant, and every one of them carries the
//! captured output of the step that failed. Nothing here is recoverable: the pipeline returns the
//! first error it sees.

use std::fmt;
use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use mutcheck_core::GateViolation;
use thiserror::Error;

/// Exit status of a finished subprocess, reduced to what reports need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatusText {
    Code(i32),
    /// Terminated without an exit code (e.g. killed by a signal).
    Signal,
}

impl fmt::Display for ExitStatusText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatusText::Code(code) => write!(f, "exit code {}", code),
            ExitStatusText::Signal => write!(f, "terminated by signal"),
        }
    }
}

/// Output captured from a subprocess. Empty when the step streamed to the terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn is_empty(&self) -> bool {
        self.stdout.trim().is_empty() && self.stderr.trim().is_empty()
    }
}

impl fmt::Display for CapturedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(no captured output)");
        }
        if !self.stdout.trim().is_empty() {
            writeln!(f, "--- stdout ---")?;
            writeln!(f, "{}", self.stdout.trim_end())?;
        }
        if !self.stderr.trim().is_empty() {
            writeln!(f, "--- stderr ---")?;
            write!(f, "{}", self.stderr.trim_end())?;
        }
        Ok(())
    }
}

/// Errors that end a harness case.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("provisioning a Python {spec} environment failed ({status})\n{output}")]
    #[diagnostic(
        code(mutcheck::provisioning),
        help("check that the provisioner can resolve Python {spec} (e.g. `uv python list`)")
    )]
    Provisioning {
        spec: String,
        status: ExitStatusText,
        output: CapturedOutput,
    },

    #[error("provisioner reported success but no interpreter exists at {}", interpreter.display())]
    #[diagnostic(code(mutcheck::provisioning))]
    MissingInterpreter { interpreter: PathBuf },

    #[error("installing {} failed ({status})\n{output}", manifest.display())]
    #[diagnostic(
        code(mutcheck::installation),
        help("pre-release interpreters often lack prebuilt wheels; inspect the resolver output above")
    )]
    Installation {
        manifest: PathBuf,
        status: ExitStatusText,
        output: CapturedOutput,
    },

    #[error("{dependency} compatibility gate failed ({status})\n{output}")]
    #[diagnostic(
        code(mutcheck::compatibility_gate),
        help("upgrade {dependency} to at least {minimum} before running the tool on this interpreter")
    )]
    CompatibilityGate {
        dependency: String,
        minimum: String,
        status: ExitStatusText,
        output: CapturedOutput,
    },

    #[error("{0}")]
    #[diagnostic(
        code(mutcheck::compatibility_gate),
        help("upgrade the dependency before running the tool on this interpreter")
    )]
    BelowMinimum(#[from] GateViolation),

    #[error("`{module} run` failed ({status})\n{output}")]
    #[diagnostic(
        code(mutcheck::tool_execution),
        help("a non-zero mutation run means either a harness setup defect or a tool regression")
    )]
    ToolExecution {
        module: String,
        status: ExitStatusText,
        output: CapturedOutput,
    },

    #[error("failed to start `{program}`: {source}")]
    #[diagnostic(code(mutcheck::spawn))]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    #[diagnostic(code(mutcheck::synthesis))]
    Synthesis {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("project directory {} already holds files; each case needs a fresh directory", path.display())]
    #[diagnostic(code(mutcheck::synthesis))]
    ProjectNotFresh { path: PathBuf },

    #[error("provisioner `{program}` was not found on PATH")]
    #[diagnostic(
        code(mutcheck::skipped),
        help("install uv (https://docs.astral.sh/uv/) or pass --provisioner")
    )]
    ProvisionerUnavailable { program: String },
}

impl HarnessError {
    /// Whether this error means "nothing to run here" rather than a failed case.
    pub fn is_skip(&self) -> bool {
        matches!(self, HarnessError::ProvisionerUnavailable { .. })
    }

    /// Render with code and help through miette's graphical handler.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match miette::GraphicalReportHandler::new().render_report(&mut out, self) {
            Ok(()) => out,
            Err(_) => self.to_string(),
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use mutcheck_core::VersionTriple;

    #[test]
    fn test_captured_output_display() {
        let out = CapturedOutput {
            stdout: "collected 4 items\n".to_string(),
            stderr: "boom\n".to_string(),
        };
        let text = out.to_string();
        assert!(text.contains("--- stdout ---\ncollected 4 items"));
        assert!(text.contains("--- stderr ---\nboom"));
        assert_eq!(CapturedOutput::default().to_string(), "(no captured output)");
    }

    #[test]
    fn test_provisioning_message_names_spec_and_status() {
        let err = HarnessError::Provisioning {
            spec: "3.14".to_string(),
            status: ExitStatusText::Code(2),
            output: CapturedOutput {
                stdout: String::new(),
                stderr: "No interpreter found for Python 3.14".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("provisioning a Python 3.14 environment failed (exit code 2)"));
        assert!(msg.contains("No interpreter found"));
    }

    #[test]
    fn test_below_minimum_converts_from_gate_violation() {
        let violation = GateViolation {
            dependency: "libcst".to_string(),
            reported: "1.7.0".to_string(),
            installed: VersionTriple::new(1, 7, 0),
            minimum: VersionTriple::new(1, 8, 0),
        };
        let err = HarnessError::from(violation);
        assert!(err.to_string().contains("libcst 1.7.0 is too old"));
        assert!(!err.is_skip());
    }

    #[test]
    fn test_unavailable_provisioner_is_skip() {
        let err = HarnessError::ProvisionerUnavailable {
            program: "uv".to_string(),
        };
        assert!(err.is_skip());
        let rendered = err.render();
        assert!(rendered.contains("mutcheck::skipped"), "{rendered}");
        assert!(rendered.contains("`uv` was not found"), "{rendered}");
    }
}
