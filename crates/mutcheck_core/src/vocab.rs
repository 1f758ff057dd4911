//! Canonical names the harness uses when talking to the outside world.
//!
//! Every program, module, package and environment variable the harness mentions is spelled here
//! once, so the provisioner, installer, gate, synthesizer and driver agree.

use crate::version::VersionTriple;

/// Program that provisions interpreter environments and installs packages into them.
pub const PROVISIONER_PROGRAM: &str = "uv";

/// Environment override that lets PyO3 extensions build against interpreters newer than their
/// declared ABI.
pub const ABI3_FORWARD_COMPAT_ENV: &str = "PYO3_USE_ABI3_FORWARD_COMPATIBILITY";

/// Value assigned to [`ABI3_FORWARD_COMPAT_ENV`].
pub const ABI3_FORWARD_COMPAT_VALUE: &str = "1";

/// Module name of the mutation-testing tool, run as `python -m <module> run`.
pub const TOOL_MODULE: &str = "mutmut";

/// Subcommand that performs a full mutation run.
pub const TOOL_RUN_SUBCOMMAND: &str = "run";

/// Test runner installed next to the tool.
pub const TEST_RUNNER: &str = "pytest";

/// Command line the tool uses to run the demo test suite.
pub const TEST_RUNNER_COMMAND: &str = "pytest -q";

/// Structural-analysis library the tool uses to rewrite source code.
pub const GATED_DEPENDENCY: &str = "libcst";

/// Oldest [`GATED_DEPENDENCY`] release that understands the newest supported grammar.
pub const GATED_DEPENDENCY_MINIMUM: VersionTriple = VersionTriple::new(1, 8, 0);

/// Distribution name written into the demo project's packaging descriptor.
pub const DEMO_PROJECT_NAME: &str = "demo-mutmut-project";

/// Import name of the demo package.
pub const DEMO_PACKAGE: &str = "demo_pkg";

/// Directory (relative to the project root) holding the demo tests.
pub const DEMO_TESTS_DIR: &str = "tests";

/// Directory name of the per-case virtual environment inside the project.
pub const VENV_DIR: &str = ".venv";

/// Prefix of each per-case project directory; the specifier's alphanumerics are appended.
pub const PROJECT_DIR_PREFIX: &str = "demo_mutmut_project_";

/// An interpreter version specifier the harness knows how to exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedSpec {
    /// Specifier passed to the provisioner (`-p <spec>`).
    pub spec: &'static str,
    /// Stable identifier used in reports and test names.
    pub id: &'static str,
    /// Short description for listings.
    pub channel: &'static str,
}

/// Interpreter releases exercised by default: the current stable line and the next one.
pub const SUPPORTED_SPECS: &[SupportedSpec] = &[
    SupportedSpec {
        spec: "3.12",
        id: "python312",
        channel: "stable",
    },
    SupportedSpec {
        spec: "3.14",
        id: "python314",
        channel: "next",
    },
];

/// Derive the case id for a specifier (`"3.14"` → `"python314"`).
///
/// Known specifiers use their registered id; anything else keeps only ASCII alphanumerics.
pub fn case_id(spec: &str) -> String {
    if let Some(known) = SUPPORTED_SPECS.iter().find(|s| s.spec == spec) {
        return known.id.to_string();
    }
    let compact: String = spec.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    format!("python{}", compact)
}

/// Directory name of the per-case demo project (`"3.14"` → `"demo_mutmut_project_314"`).
pub fn project_dir_name(spec: &str) -> String {
    let compact: String = spec.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    format!("{}{}", PROJECT_DIR_PREFIX, compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_id_known_specs() {
        assert_eq!(case_id("3.12"), "python312");
        assert_eq!(case_id("3.14"), "python314");
    }

    #[test]
    fn test_case_id_unknown_spec() {
        assert_eq!(case_id("3.13t"), "python313t");
        assert_eq!(case_id("pypy@3.10"), "pythonpypy310");
    }

    #[test]
    fn test_project_dir_name() {
        assert_eq!(project_dir_name("3.14"), "demo_mutmut_project_314");
        assert_eq!(project_dir_name("../3.12"), "demo_mutmut_project_312");
    }

    #[test]
    fn test_supported_specs_are_ordered_and_unique() {
        let specs: Vec<_> = SUPPORTED_SPECS.iter().map(|s| s.spec).collect();
        assert_eq!(specs, vec!["3.12", "3.14"]);
        assert_ne!(SUPPORTED_SPECS[0].id, SUPPORTED_SPECS[1].id);
    }
}
