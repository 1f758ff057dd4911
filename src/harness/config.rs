//! Harness configuration.
//!
//! Defaults come from `mutcheck_core::vocab`; the CLI overrides individual fields.

use std::path::PathBuf;

use mutcheck_core::VersionTriple;
use mutcheck_core::vocab;

use super::env::EnvOverrides;
use super::process::OutputMode;

/// Settings shared by every case in a run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Provisioner program (`uv`), looked up on PATH unless it is a path.
    pub provisioner: PathBuf,
    /// Source tree installed in editable mode. `None` installs the tool from the index by name.
    pub source_root: Option<PathBuf>,
    /// Lowest acceptable version of the gated dependency.
    pub minimum: VersionTriple,
    /// Distribution name of the gated dependency.
    pub gated_dependency: String,
    /// Module of the tool under test (`python -m <tool_module> run`).
    pub tool_module: String,
    /// Test runner requirement added to the manifest.
    pub test_runner: String,
    /// Command line the tool runs the demo suite with.
    pub runner_command: String,
    /// Output handling for the provisioning, install and tool steps.
    pub output: OutputMode,
    /// Extra overrides layered on top of the install/gate/tool environment.
    pub extra_env: EnvOverrides,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            provisioner: PathBuf::from(vocab::PROVISIONER_PROGRAM),
            source_root: None,
            minimum: vocab::GATED_DEPENDENCY_MINIMUM,
            gated_dependency: vocab::GATED_DEPENDENCY.to_string(),
            tool_module: vocab::TOOL_MODULE.to_string(),
            test_runner: vocab::TEST_RUNNER.to_string(),
            runner_command: vocab::TEST_RUNNER_COMMAND.to_string(),
            output: OutputMode::Capture,
            extra_env: EnvOverrides::new(),
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provisioner program
    pub fn with_provisioner(mut self, provisioner: impl Into<PathBuf>) -> Self {
        self.provisioner = provisioner.into();
        self
    }

    /// Install the package under test from this source tree (editable)
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    /// Set the minimum gated-dependency version
    pub fn with_minimum(mut self, minimum: VersionTriple) -> Self {
        self.minimum = minimum;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Add an environment override for every step after provisioning
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.extra_env = self.extra_env.with_var(key, value);
        self
    }

    /// Overrides used by the installer, the gate and the tool driver.
    ///
    /// The ABI3 forward-compatibility flag yields to an ambient value; extra overrides are forced.
    pub fn step_env(&self) -> EnvOverrides {
        EnvOverrides::new()
            .with_default(vocab::ABI3_FORWARD_COMPAT_ENV, vocab::ABI3_FORWARD_COMPAT_VALUE)
            .extend(&self.extra_env)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::harness::env::OverridePolicy;
    use std::ffi::OsStr;

    #[test]
    fn test_defaults_follow_vocab() {
        let config = HarnessConfig::default();
        assert_eq!(config.provisioner, PathBuf::from("uv"));
        assert_eq!(config.minimum, VersionTriple::new(1, 8, 0));
        assert_eq!(config.gated_dependency, "libcst");
        assert_eq!(config.tool_module, "mutmut");
        assert_eq!(config.runner_command, "pytest -q");
        assert!(config.source_root.is_none());
        assert_eq!(config.output, OutputMode::Capture);
    }

    #[test]
    fn test_step_env_carries_abi3_default() {
        let env = HarnessConfig::default().step_env();
        assert_eq!(
            env.get("PYO3_USE_ABI3_FORWARD_COMPATIBILITY"),
            Some((OsStr::new("1"), OverridePolicy::Default))
        );
    }

    #[test]
    fn test_extra_env_is_forced() {
        let env = HarnessConfig::default().with_env("PIP_NO_CACHE_DIR", "1").step_env();
        assert_eq!(
            env.get("PIP_NO_CACHE_DIR"),
            Some((OsStr::new("1"), OverridePolicy::Force))
        );
    }

    #[test]
    fn test_builders() {
        let config = HarnessConfig::new()
            .with_provisioner("/opt/uv/bin/uv")
            .with_source_root("/src/mutmut")
            .with_minimum(VersionTriple::new(1, 9, 0))
            .with_output(OutputMode::Inherit);
        assert_eq!(config.provisioner, PathBuf::from("/opt/uv/bin/uv"));
        assert_eq!(config.source_root, Some(PathBuf::from("/src/mutmut")));
        assert_eq!(config.minimum, VersionTriple::new(1, 9, 0));
        assert_eq!(config.output, OutputMode::Inherit);
    }
}
