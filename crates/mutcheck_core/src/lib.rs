//! Provide pure helpers and canonical vocabulary for the mutcheck compatibility harness.
//!
//! This crate is intentionally small and dependency-free. It holds the pieces of the harness that
//! can be reasoned about without spawning a single process:
//! - version-string parsing and the minimum-version gate ([`version`]),
//! - the well-known program, module and package names the harness talks to ([`vocab`]),
//! - the demo function and its fixed test table, used to check mutation sensitivity ([`demo`]).
//!
//! ## Notes
//!
//! - This is a "semantic core" crate: **no IO**, no global state, no subprocess types.
//! - The inline interpreter script rendered by the harness mirrors [`version::parse_version`]; the two must
//!   stay in lockstep.

pub mod demo;
pub mod version;
pub mod vocab;

pub use version::{GateViolation, VersionTriple, check_minimum, parse_version};
