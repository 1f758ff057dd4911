#![forbid(unsafe_code)]
//! mutcheck - end-to-end compatibility harness for the `mutmut` mutation-testing tool
//!
//! For each Python interpreter specifier the harness provisions an isolated environment with
//! `uv`, installs the tool, checks that `libcst` is recent enough for the interpreter, writes a
//! tiny demo project and runs `python -m mutmut run` against it.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `harness` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod harness;
pub mod version;

pub use harness::{
    CaseReport, CompatHarness, HarnessConfig, HarnessError, HarnessResult, RunSummary, Stage, Verdict, Workspace,
};
pub use mutcheck_core::{GateViolation, VersionTriple, check_minimum, parse_version};
