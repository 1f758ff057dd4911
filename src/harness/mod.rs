//! Compatibility pipeline for one interpreter specifier at a time.
//!
//! ## Stages
//!
//! `Start → Provisioned → Installed → GateChecked → Synthesized → Driven`
//!
//! - `Provisioned`: fresh project directory, `uv venv -p <spec> <project>/.venv`
//! - `Installed`: `pyproject.toml` + `requirements.txt` written, `uv pip install -r requirements.txt`
//! - `GateChecked`: gated dependency version queried and compared against the minimum
//! - `Synthesized`: demo package, tests and tool configuration written
//! - `Driven`: `python -m mutmut run` exits zero
//!
//! Each stage runs only when the previous one succeeded. The first failure ends the case; there is
//! no retry and no recovery.
//!
//! ## Modules
//!
//! - `process` - subprocess boundary (`ProcessRunner`) and its real implementation
//! - `env` - per-step environment overrides, never touching the host process
//! - `provision`, `install`, `gate`, `project`, `driver` - one module per stage
//! - `report` - case/run reporting

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod config;
pub mod driver;
pub mod env;
pub mod error;
pub mod gate;
pub mod install;
pub mod process;
pub mod project;
pub mod provision;
pub mod report;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use mutcheck_core::VersionTriple;
use mutcheck_core::vocab;

pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use process::{CommandSpec, OutputMode, ProcessOutput, ProcessRunner, SystemRunner};
pub use report::{CaseReporter, ConsoleReporter, JsonReporter, NullReporter};

use driver::ToolDriver;
use gate::CompatibilityGate;
use install::{Installer, Manifest};
use project::ProjectSynthesizer;
use provision::Provisioner;

// ============================================================================
// Case state machine
// ============================================================================

/// Pipeline position of a case. Each variant names the state reached after the matching step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Start,
    Provisioned,
    Installed,
    GateChecked,
    Synthesized,
    Driven,
}

impl Stage {
    /// Stages reached by a passing case, in order.
    pub const PIPELINE: [Stage; 5] = [
        Stage::Provisioned,
        Stage::Installed,
        Stage::GateChecked,
        Stage::Synthesized,
        Stage::Driven,
    ];

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Start => Some(Stage::Provisioned),
            Stage::Provisioned => Some(Stage::Installed),
            Stage::Installed => Some(Stage::GateChecked),
            Stage::GateChecked => Some(Stage::Synthesized),
            Stage::Synthesized => Some(Stage::Driven),
            Stage::Driven => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Provisioned => "provisioned",
            Stage::Installed => "installed",
            Stage::GateChecked => "gate-checked",
            Stage::Synthesized => "synthesized",
            Stage::Driven => "driven",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final verdict of a case.
#[derive(Debug)]
pub enum Verdict {
    Pass,
    /// `failed_at` is the stage the case was trying to reach.
    Fail { failed_at: Stage, error: HarnessError },
}

/// Everything known about a finished case.
#[derive(Debug)]
pub struct CaseReport {
    pub spec: String,
    pub case_id: String,
    pub project_dir: PathBuf,
    /// Last stage reached; `Driven` for a passing case.
    pub reached: Stage,
    /// Gated dependency version observed by the gate, once it ran.
    pub gated_version: Option<VersionTriple>,
    pub verdict: Verdict,
    pub duration: Duration,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        matches!(self.verdict, Verdict::Pass)
    }

    pub fn failed_at(&self) -> Option<Stage> {
        match &self.verdict {
            Verdict::Pass => None,
            Verdict::Fail { failed_at, .. } => Some(*failed_at),
        }
    }

    pub fn error(&self) -> Option<&HarnessError> {
        match &self.verdict {
            Verdict::Pass => None,
            Verdict::Fail { error, .. } => Some(error),
        }
    }

}

/// Aggregate of a multi-case run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<CaseReport>,
    pub duration: Duration,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// Where case project directories live.
#[derive(Debug, Clone)]
pub enum Workspace {
    /// A fresh temporary directory per case, deleted afterwards unless `keep` is set.
    Temp { keep: bool },
    /// Cases go into `<dir>/demo_mutmut_project_<spec>`, which must not already hold files.
    Dir(PathBuf),
}

impl Default for Workspace {
    fn default() -> Self {
        Workspace::Temp { keep: false }
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Resolve `path` against the current directory without touching the filesystem.
///
/// Falls back to `path` unchanged when the current directory cannot be read; the first stage that
/// uses it then fails with the underlying error.
pub fn absolute_path(path: &Path) -> PathBuf {
    match std::path::absolute(path) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not resolve path");
            path.to_path_buf()
        }
    }
}

/// Drives cases through the pipeline with a given [`ProcessRunner`].
pub struct CompatHarness<R: ProcessRunner = SystemRunner> {
    config: HarnessConfig,
    runner: R,
}

impl CompatHarness<SystemRunner> {
    pub fn new(config: HarnessConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

/// Tracks how far a case got while it runs.
struct CaseProgress<'s, 'r> {
    spec: &'s str,
    reached: Stage,
    gated_version: Option<VersionTriple>,
    reporter: &'r mut dyn CaseReporter,
}

impl CaseProgress<'_, '_> {
    fn advance(&mut self, stage: Stage) {
        debug_assert_eq!(self.reached.next(), Some(stage));
        self.reached = stage;
        tracing::info!(stage = %stage, "stage complete");
        self.reporter.on_stage_complete(self.spec, stage);
    }
}

impl<R: ProcessRunner> CompatHarness<R> {
    pub fn with_runner(config: HarnessConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Resolve the provisioner on PATH.
    ///
    /// ## Errors
    /// - [`HarnessError::ProvisionerUnavailable`]: the whole harness should be skipped.
    pub fn locate_provisioner(&self) -> HarnessResult<PathBuf> {
        which::which(&self.config.provisioner).map_err(|_| HarnessError::ProvisionerUnavailable {
            program: self.config.provisioner.display().to_string(),
        })
    }

    /// Run one case inside `project_dir`, which must be absent or empty.
    ///
    /// A relative `project_dir` is resolved against the current directory first: the tool runs
    /// with the project as its working directory, so the interpreter path must not be relative.
    #[tracing::instrument(skip(self, project_dir, reporter), fields(case = %vocab::case_id(spec)))]
    pub fn run_case(&self, spec: &str, project_dir: &Path, reporter: &mut dyn CaseReporter) -> CaseReport {
        let started = Instant::now();
        reporter.on_case_start(spec);
        let project_dir = absolute_path(project_dir);
        let project_dir = project_dir.as_path();

        let mut progress = CaseProgress {
            spec,
            reached: Stage::Start,
            gated_version: None,
            reporter,
        };
        let outcome = self.execute(spec, project_dir, &mut progress);

        let verdict = match outcome {
            Ok(()) => Verdict::Pass,
            Err(error) => {
                let failed_at = progress.reached.next().unwrap_or(Stage::Driven);
                tracing::warn!(stage = %failed_at, error = %error, "case failed");
                Verdict::Fail { failed_at, error }
            }
        };
        let report = CaseReport {
            spec: spec.to_string(),
            case_id: vocab::case_id(spec),
            project_dir: project_dir.to_path_buf(),
            reached: progress.reached,
            gated_version: progress.gated_version,
            verdict,
            duration: started.elapsed(),
        };
        progress.reporter.on_case_complete(&report);
        report
    }

    fn execute(&self, spec: &str, project_dir: &Path, progress: &mut CaseProgress<'_, '_>) -> HarnessResult<()> {
        let config = &self.config;
        let step_env = config.step_env();
        let synthesizer = ProjectSynthesizer::new(project_dir, spec)
            .with_tool_module(&config.tool_module)
            .with_test_runner(&config.test_runner, &config.runner_command);

        // Start → Provisioned
        synthesizer.prepare()?;
        let env = Provisioner::new(&config.provisioner)
            .with_output(config.output)
            .provision(&self.runner, spec, &project_dir.join(vocab::VENV_DIR))?;
        progress.advance(Stage::Provisioned);

        // Provisioned → Installed
        synthesizer.write_descriptor()?;
        let manifest_path = synthesizer.write_manifest(&Manifest::for_config(config))?;
        Installer::new(&config.provisioner, step_env.clone())
            .with_output(config.output)
            .install(&self.runner, &env.interpreter, &manifest_path)?;
        progress.advance(Stage::Installed);

        // Installed → GateChecked
        let gate = CompatibilityGate::new(&config.gated_dependency, config.minimum, step_env.clone());
        progress.gated_version = Some(gate.check(&self.runner, &env.interpreter)?);
        progress.advance(Stage::GateChecked);

        // GateChecked → Synthesized
        synthesizer.write_sources()?;
        progress.advance(Stage::Synthesized);

        // Synthesized → Driven
        ToolDriver::new(&config.tool_module, step_env)
            .with_output(config.output)
            .drive(&self.runner, &env.interpreter, project_dir)?;
        progress.advance(Stage::Driven);

        Ok(())
    }

    /// Run every specifier in order.
    ///
    /// ## Errors
    /// - [`HarnessError::ProvisionerUnavailable`] before any case runs, when the provisioner is missing.
    pub fn run_all(
        &self,
        specs: &[String],
        workspace: &Workspace,
        reporter: &mut dyn CaseReporter,
        stop_on_fail: bool,
    ) -> HarnessResult<RunSummary> {
        let provisioner = self.locate_provisioner()?;
        tracing::debug!(provisioner = %provisioner.display(), "provisioner located");

        let started = Instant::now();
        reporter.on_run_start(specs);
        let mut summary = RunSummary::default();

        for spec in specs {
            let report = match workspace {
                Workspace::Dir(base) => self.run_case(spec, &base.join(vocab::project_dir_name(spec)), reporter),
                Workspace::Temp { keep } => self.run_in_temp_dir(spec, *keep, reporter),
            };
            let failed = !report.passed();
            summary.reports.push(report);
            if failed && stop_on_fail {
                tracing::info!("stopping after first failure");
                break;
            }
        }

        summary.duration = started.elapsed();
        reporter.on_run_complete(&summary);
        Ok(summary)
    }

    fn run_in_temp_dir(&self, spec: &str, keep: bool, reporter: &mut dyn CaseReporter) -> CaseReport {
        let tmp = match tempfile::Builder::new().prefix("mutcheck-").tempdir() {
            Ok(tmp) => tmp,
            Err(source) => {
                reporter.on_case_start(spec);
                let report = CaseReport {
                    spec: spec.to_string(),
                    case_id: vocab::case_id(spec),
                    project_dir: std::env::temp_dir(),
                    reached: Stage::Start,
                    gated_version: None,
                    verdict: Verdict::Fail {
                        failed_at: Stage::Provisioned,
                        error: HarnessError::Synthesis {
                            path: std::env::temp_dir(),
                            source,
                        },
                    },
                    duration: Duration::ZERO,
                };
                reporter.on_case_complete(&report);
                return report;
            }
        };

        let project_dir = tmp.path().join(vocab::project_dir_name(spec));
        let report = self.run_case(spec, &project_dir, reporter);
        if keep {
            let kept = tmp.keep();
            tracing::info!(path = %kept.display(), "kept case directory");
        }
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_chain() {
        let mut stage = Stage::Start;
        let mut seen = Vec::new();
        while let Some(next) = stage.next() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen, Stage::PIPELINE.to_vec());
    }

    #[test]
    fn test_stage_names() {
        let names: Vec<_> = Stage::PIPELINE.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec!["provisioned", "installed", "gate-checked", "synthesized", "driven"]
        );
    }

    #[test]
    fn test_missing_provisioner_is_reported_as_skip() {
        let config = HarnessConfig::default().with_provisioner("mutcheck-no-such-provisioner");
        let harness = CompatHarness::new(config);
        let err = harness
            .run_all(&["3.12".to_string()], &Workspace::default(), &mut NullReporter, false)
            .unwrap_err();
        assert!(err.is_skip());
    }

    #[test]
    fn test_summary_counts() {
        let pass = CaseReport {
            spec: "3.12".into(),
            case_id: "python312".into(),
            project_dir: PathBuf::from("/tmp/a"),
            reached: Stage::Driven,
            gated_version: Some(VersionTriple::new(1, 8, 2)),
            verdict: Verdict::Pass,
            duration: Duration::ZERO,
        };
        let fail = CaseReport {
            spec: "3.14".into(),
            case_id: "python314".into(),
            project_dir: PathBuf::from("/tmp/b"),
            reached: Stage::Installed,
            gated_version: None,
            verdict: Verdict::Fail {
                failed_at: Stage::GateChecked,
                error: HarnessError::ProjectNotFresh { path: "/tmp/b".into() },
            },
            duration: Duration::ZERO,
        };
        let summary = RunSummary {
            reports: vec![pass, fail],
            duration: Duration::ZERO,
        };
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.passed(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.all_passed());
        assert_eq!(summary.reports[1].failed_at(), Some(Stage::GateChecked));
    }
}
