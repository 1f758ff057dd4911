//! Case reporting.
//!
//! The harness calls a [`CaseReporter`] at every state change, which keeps output format
//! (pytest-like console lines, JSON for CI) separate from execution.

use std::io::{self, Write};

use serde_json::json;

use super::{CaseReport, RunSummary, Stage, Verdict};

/// Trait for reporting harness progress.
pub trait CaseReporter {
    /// Called once before the first case
    fn on_run_start(&mut self, _specs: &[String]) {}

    /// Called when a case begins
    fn on_case_start(&mut self, spec: &str);

    /// Called after each successful stage transition
    fn on_stage_complete(&mut self, _spec: &str, _stage: Stage) {}

    /// Called when a case passes or fails
    fn on_case_complete(&mut self, report: &CaseReport);

    /// Called after the last case
    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl CaseReporter for NullReporter {
    fn on_case_start(&mut self, _spec: &str) {}
    fn on_case_complete(&mut self, _report: &CaseReport) {}
    fn on_run_complete(&mut self, _summary: &RunSummary) {}
}

/// Default console reporter (pytest-style, on stderr)
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl CaseReporter for ConsoleReporter {
    fn on_case_start(&mut self, spec: &str) {
        eprint!("{} ... ", mutcheck_core::vocab::case_id(spec));
        if self.verbose {
            eprintln!();
        }
    }

    fn on_stage_complete(&mut self, _spec: &str, stage: Stage) {
        if self.verbose {
            eprintln!("  \x1b[2m✓ {}\x1b[0m", stage);
        }
    }

    fn on_case_complete(&mut self, report: &CaseReport) {
        let elapsed = report.duration.as_secs_f64();
        match &report.verdict {
            Verdict::Pass => {
                let gate = report
                    .gated_version
                    .map(|v| format!(", gate {}", v))
                    .unwrap_or_default();
                eprintln!("\x1b[32mPASSED\x1b[0m ({:.1}s{})", elapsed, gate);
            }
            Verdict::Fail { failed_at, error } => {
                eprintln!("\x1b[31mFAILED\x1b[0m at {} ({:.1}s)", failed_at, elapsed);
                eprintln!("{}", error.render());
            }
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        eprintln!();
        let mut parts = Vec::new();
        if summary.passed() > 0 {
            parts.push(format!("\x1b[32m{} passed\x1b[0m", summary.passed()));
        }
        if summary.failed() > 0 {
            parts.push(format!("\x1b[31m{} failed\x1b[0m", summary.failed()));
        }
        if parts.is_empty() {
            parts.push("no cases run".to_string());
        }
        eprintln!(
            "====== {} in {:.2}s ======",
            parts.join(", "),
            summary.duration.as_secs_f64()
        );
    }
}

/// Newline-delimited JSON reporter: one object per finished case, then a summary object.
pub struct JsonReporter<W: Write = io::Stdout> {
    out: W,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, value: serde_json::Value) {
        if let Err(e) = writeln!(self.out, "{}", value) {
            tracing::warn!(error = %e, "failed to write JSON report line");
        }
    }
}

/// JSON form of a finished case.
pub fn case_json(report: &CaseReport) -> serde_json::Value {
    let (verdict, failed_at, error) = match &report.verdict {
        Verdict::Pass => ("pass", None, None),
        Verdict::Fail { failed_at, error } => ("fail", Some(failed_at.as_str()), Some(error.to_string())),
    };
    let completed: Vec<&str> = Stage::PIPELINE
        .iter()
        .filter(|s| **s <= report.reached)
        .map(|s| s.as_str())
        .collect();
    json!({
        "event": "case",
        "spec": report.spec,
        "case_id": report.case_id,
        "project_dir": report.project_dir.display().to_string(),
        "verdict": verdict,
        "completed": completed,
        "failed_at": failed_at,
        "gated_version": report.gated_version.map(|v| v.to_string()),
        "duration_ms": report.duration.as_millis() as u64,
        "error": error,
    })
}

impl<W: Write> CaseReporter for JsonReporter<W> {
    fn on_case_start(&mut self, _spec: &str) {}

    fn on_case_complete(&mut self, report: &CaseReport) {
        self.emit(case_json(report));
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        self.emit(json!({
            "event": "summary",
            "total": summary.total(),
            "passed": summary.passed(),
            "failed": summary.failed(),
            "duration_ms": summary.duration.as_millis() as u64,
        }));
    }
}
