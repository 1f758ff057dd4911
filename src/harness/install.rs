//! Dependency installer and the requirements manifest it consumes.

use std::fmt;
use std::path::{Path, PathBuf};

use super::absolute_path;
use super::config::HarnessConfig;
use super::env::EnvOverrides;
use super::error::{HarnessError, HarnessResult};
use super::process::{CommandSpec, OutputMode, ProcessRunner};

/// A single manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// `-e <path>`: a local source tree installed in editable mode.
    Editable(PathBuf),
    /// A requirement resolved from the package index (`pytest`, `mutmut>=3`).
    Named(String),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Editable(path) => write!(f, "-e {}", path.display()),
            Requirement::Named(name) => write!(f, "{}", name),
        }
    }
}

/// The requirements installed into a case's environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<Requirement>,
}

impl Manifest {
    pub fn new(entries: Vec<Requirement>) -> Self {
        Self { entries }
    }

    /// Build the manifest for a run.
    ///
    /// With a source root, the editable entry is the tool itself; without one, the tool is
    /// requested by name. The test runner is always appended. A relative source root is resolved
    /// against the current directory, since the manifest lives in the case's project directory.
    pub fn for_config(config: &HarnessConfig) -> Self {
        let mut entries = Vec::with_capacity(2);
        match &config.source_root {
            Some(root) => entries.push(Requirement::Editable(absolute_path(root))),
            None => entries.push(Requirement::Named(config.tool_module.clone())),
        }
        entries.push(Requirement::Named(config.test_runner.clone()));
        Self { entries }
    }

    pub fn entries(&self) -> &[Requirement] {
        &self.entries
    }

    /// Render as a `requirements.txt` body.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }
}

/// Install manifests into provisioned environments with `uv pip install`.
#[derive(Debug, Clone)]
pub struct Installer {
    program: PathBuf,
    env: EnvOverrides,
    output: OutputMode,
}

impl Installer {
    pub fn new(program: impl Into<PathBuf>, env: EnvOverrides) -> Self {
        Self {
            program: program.into(),
            env,
            output: OutputMode::Capture,
        }
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn command(&self, interpreter: &Path, manifest: &Path) -> CommandSpec {
        CommandSpec::new(self.program.as_os_str())
            .args(["pip", "install", "--python"])
            .arg(interpreter.as_os_str())
            .arg("-r")
            .arg(manifest.as_os_str())
            .env(self.env.resolve())
            .output(self.output)
    }

    /// Install every entry of the manifest at `manifest` into the environment owning `interpreter`.
    ///
    /// ## Errors
    /// - [`HarnessError::Installation`] when the installer exits non-zero.
    pub fn install(&self, runner: &dyn ProcessRunner, interpreter: &Path, manifest: &Path) -> HarnessResult<()> {
        let output = runner.run(&self.command(interpreter, manifest))?;
        if output.success() {
            Ok(())
        } else {
            Err(HarnessError::Installation {
                manifest: manifest.to_path_buf(),
                status: output.status,
                output: output.captured,
            })
        }
    }
}
