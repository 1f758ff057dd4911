//! Real end-to-end runs: `uv` provisions each interpreter, mutmut is installed and run for real.
//!
//! Slow and network-bound, so ignored by default:
//!
//! ```text
//! MUTCHECK_SOURCE_ROOT=/path/to/mutmut cargo test --test e2e_mutmut -- --ignored
//! ```
//!
//! Without `MUTCHECK_SOURCE_ROOT` mutmut is installed from the package index. Each case is skipped
//! when `uv` is not on PATH.

use std::env;

use mutcheck::harness::{CompatHarness, HarnessConfig, NullReporter, Stage};
use mutcheck_core::vocab;

fn harness() -> Option<CompatHarness> {
    if which::which(vocab::PROVISIONER_PROGRAM).is_err() {
        eprintln!("skipping: `{}` is not on PATH", vocab::PROVISIONER_PROGRAM);
        return None;
    }
    let mut config = HarnessConfig::default();
    if let Some(root) = env::var_os("MUTCHECK_SOURCE_ROOT") {
        config = config.with_source_root(root);
    }
    Some(CompatHarness::new(config))
}

fn run_spec(spec: &str) {
    let Some(harness) = harness() else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let report = harness.run_case(spec, &dir.path().join(vocab::project_dir_name(spec)), &mut NullReporter);

    if let Some(err) = report.error() {
        panic!("{} failed at {:?}:\n{}", report.case_id, report.failed_at(), err.render());
    }
    assert_eq!(report.reached, Stage::Driven);
    assert!(report.gated_version.is_some_and(|v| v.satisfies(vocab::GATED_DEPENDENCY_MINIMUM)));
}

#[test]
#[ignore = "provisions real interpreters and installs from the network"]
fn python312() {
    run_spec("3.12");
}

#[test]
#[ignore = "provisions real interpreters and installs from the network"]
fn python314() {
    run_spec("3.14");
}
