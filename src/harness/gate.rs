//! Compatibility gate: refuse to drive the tool when the gated dependency is too old.
//!
//! The tool rewrites source through a structural-analysis library whose grammar support trails
//! interpreter releases. Running an old release against new syntax fails deep inside a mutation
//! run with a parse error; checking the installed version first turns that into a clear
//! version-mismatch failure.
//!
//! The check runs twice over the same algorithm: once inside the provisioned interpreter (the
//! script exits non-zero when the version is too old) and once here on the version string the
//! script prints, via [`mutcheck_core::check_minimum`].

use std::path::Path;

use mutcheck_core::{VersionTriple, check_minimum};

use super::env::EnvOverrides;
use super::error::{HarnessError, HarnessResult};
use super::process::{CommandSpec, OutputMode, ProcessRunner};

/// Inline script executed by the provisioned interpreter.
///
/// Mirrors `mutcheck_core::version::parse_version`: leading ASCII digits per component, stop at the
/// first component without any, at most three components, zero-padded.
const GATE_SCRIPT_TEMPLATE: &str = r#"
import re
from importlib import metadata

dependency = {dependency_literal}
version_text = metadata.version(dependency)
numeric_parts = []
for part in version_text.split("."):
    digits = re.match(r"[0-9]+", part)
    if digits is None:
        break
    numeric_parts.append(int(digits.group(0)))
    if len(numeric_parts) == 3:
        break
while len(numeric_parts) < 3:
    numeric_parts.append(0)
minimum_version = {minimum_tuple}
if tuple(numeric_parts) < minimum_version:
    parsed = ".".join(str(part) for part in numeric_parts)
    required = ".".join(str(part) for part in minimum_version)
    raise SystemExit(
        f"{dependency} {version_text} is too old: parsed as {parsed}, but at least {required} is required"
    )
print(version_text)
"#;

/// Render the gate script for `dependency` and `minimum`.
pub fn render_gate_script(dependency: &str, minimum: VersionTriple) -> String {
    // A JSON string literal is also a valid Python string literal.
    let dependency_literal = serde_json::Value::String(dependency.to_string()).to_string();
    let minimum_tuple = format!("({}, {}, {})", minimum.major, minimum.minor, minimum.patch);
    GATE_SCRIPT_TEMPLATE
        .replace("{dependency_literal}", &dependency_literal)
        .replace("{minimum_tuple}", &minimum_tuple)
}

/// Query and gate the installed version of one dependency.
#[derive(Debug, Clone)]
pub struct CompatibilityGate {
    dependency: String,
    minimum: VersionTriple,
    env: EnvOverrides,
}

impl CompatibilityGate {
    pub fn new(dependency: impl Into<String>, minimum: VersionTriple, env: EnvOverrides) -> Self {
        Self {
            dependency: dependency.into(),
            minimum,
            env,
        }
    }

    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    pub fn minimum(&self) -> VersionTriple {
        self.minimum
    }

    /// Build the query command. Output is always captured: the reported version is parsed from it.
    pub fn command(&self, interpreter: &Path) -> CommandSpec {
        CommandSpec::new(interpreter.as_os_str())
            .arg("-c")
            .arg(render_gate_script(&self.dependency, self.minimum))
            .env(self.env.resolve())
            .output(OutputMode::Capture)
    }

    /// Run the gate inside the environment owning `interpreter`.
    ///
    /// ## Returns
    /// - The parsed installed version, when it is at least the minimum.
    ///
    /// ## Errors
    /// - [`HarnessError::CompatibilityGate`] when the script exits non-zero (too old, or not installed).
    /// - [`HarnessError::BelowMinimum`] when the printed version fails the check on this side.
    #[tracing::instrument(skip_all, fields(dependency = %self.dependency, minimum = %self.minimum))]
    pub fn check(&self, runner: &dyn ProcessRunner, interpreter: &Path) -> HarnessResult<VersionTriple> {
        let output = runner.run(&self.command(interpreter))?;
        if !output.success() {
            return Err(HarnessError::CompatibilityGate {
                dependency: self.dependency.clone(),
                minimum: self.minimum.to_string(),
                status: output.status,
                output: output.captured,
            });
        }

        let reported = output
            .captured
            .stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .unwrap_or("");
        let installed = check_minimum(&self.dependency, reported, self.minimum)?;
        tracing::info!(reported, %installed, "gate passed");
        Ok(installed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_script_embeds_dependency_and_minimum() {
        let script = render_gate_script("libcst", VersionTriple::new(1, 8, 0));
        assert!(script.contains("dependency = \"libcst\""));
        assert!(script.contains("minimum_version = (1, 8, 0)"));
        assert!(script.contains("metadata.version(dependency)"));
        assert!(script.contains("print(version_text)"));
    }

    #[test]
    fn test_script_keeps_python_fstring_placeholders() {
        let script = render_gate_script("libcst", VersionTriple::new(1, 8, 0));
        assert!(script.contains("f\"{dependency} {version_text} is too old"));
        assert!(script.contains("{required} is required"));
    }

    #[test]
    fn test_script_quotes_odd_dependency_names() {
        let script = render_gate_script("we\"ird", VersionTriple::new(0, 1, 0));
        assert!(script.contains(r#"dependency = "we\"ird""#));
    }

    #[test]
    fn test_gate_command_captures_output() {
        let gate = CompatibilityGate::new("libcst", VersionTriple::new(1, 8, 0), EnvOverrides::new());
        let command = gate.command(Path::new("/w/.venv/bin/python"));
        assert_eq!(command.program_name(), "/w/.venv/bin/python");
        assert_eq!(command.args[0], "-c");
        assert_eq!(command.output, OutputMode::Capture);
        assert!(command.env.is_some());
    }

    /// Host `python3` with `pip` installed, or `None` when either is missing.
    #[cfg(unix)]
    fn host_python_with_pip() -> Option<std::path::PathBuf> {
        let python = which::which("python3").ok()?;
        let status = std::process::Command::new(&python)
            .args(["-m", "pip", "--version"])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .ok()?;
        status.success().then_some(python)
    }

    #[cfg(unix)]
    #[test]
    fn test_script_runs_under_host_python() {
        use crate::harness::process::SystemRunner;
        use mutcheck_core::parse_version;

        let Some(python) = host_python_with_pip() else {
            eprintln!("skipping: no python3 with pip on PATH");
            return;
        };

        let passing = CompatibilityGate::new("pip", VersionTriple::new(0, 0, 1), EnvOverrides::new());
        assert_eq!(passing.dependency(), "pip");
        assert_eq!(passing.minimum(), VersionTriple::new(0, 0, 1));
        let output = SystemRunner.run(&passing.command(&python)).unwrap();
        assert!(output.success(), "{}", output.captured);
        let printed = output.captured.stdout.trim().to_string();
        assert!(!printed.is_empty());
        assert_eq!(passing.check(&SystemRunner, &python).unwrap(), parse_version(&printed));

        let failing = CompatibilityGate::new("pip", VersionTriple::new(9999, 0, 0), EnvOverrides::new());
        let err = failing.check(&SystemRunner, &python).unwrap_err();
        match &err {
            HarnessError::CompatibilityGate { status, output, .. } => {
                assert_ne!(*status, crate::harness::error::ExitStatusText::Code(0));
                assert!(output.stderr.contains(&format!("pip {} is too old", printed)), "{}", output);
                assert!(output.stderr.contains("at least 9999.0.0 is required"), "{}", output);
            }
            other => panic!("expected CompatibilityGate, got {:?}", other),
        }
    }
}
