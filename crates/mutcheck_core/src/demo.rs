//! The demo function and the fixed table that tests it.
//!
//! The synthesized project ships a single `add(left, right)` function and a parametrized test over
//! [`DEMO_CASES`]. A mutation run is only meaningful if the table actually kills mutants, so this
//! module models the operator swaps a mutation tool typically applies to `left + right` and checks
//! which of them the table detects.

/// One row of the parametrized demo test: `add(left, right) == expected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoCase {
    pub left: i64,
    pub right: i64,
    pub expected: i64,
}

impl DemoCase {
    pub const fn new(left: i64, right: i64, expected: i64) -> Self {
        Self { left, right, expected }
    }
}

/// The fixed cases written into `tests/test_add.py`, in order.
pub const DEMO_CASES: [DemoCase; 4] = [
    DemoCase::new(0, 0, 0),
    DemoCase::new(1, 2, 3),
    DemoCase::new(-3, 5, 2),
    DemoCase::new(10, -4, 6),
];

/// Body of `add` as written, and the operator swaps a mutation tool applies to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoOp {
    Add,
    Sub,
    Mul,
    /// `left` alone (right operand dropped).
    Left,
    /// `right` alone (left operand dropped).
    Right,
}

impl DemoOp {
    /// The original, unmutated body.
    pub const ORIGINAL: DemoOp = DemoOp::Add;

    /// Mutants of [`DemoOp::ORIGINAL`].
    pub const MUTANTS: [DemoOp; 4] = [DemoOp::Sub, DemoOp::Mul, DemoOp::Left, DemoOp::Right];

    pub fn apply(self, left: i64, right: i64) -> i64 {
        match self {
            DemoOp::Add => left.wrapping_add(right),
            DemoOp::Sub => left.wrapping_sub(right),
            DemoOp::Mul => left.wrapping_mul(right),
            DemoOp::Left => left,
            DemoOp::Right => right,
        }
    }

    /// Python expression for the function body.
    pub fn python_expr(self) -> &'static str {
        match self {
            DemoOp::Add => "left + right",
            DemoOp::Sub => "left - right",
            DemoOp::Mul => "left * right",
            DemoOp::Left => "left",
            DemoOp::Right => "right",
        }
    }
}

/// Return the cases that fail when `add` is implemented by `op`.
pub fn failing_cases(op: DemoOp) -> Vec<DemoCase> {
    DEMO_CASES
        .iter()
        .copied()
        .filter(|case| op.apply(case.left, case.right) != case.expected)
        .collect()
}

/// Check whether the demo table kills the mutant `op` (at least one case fails).
pub fn is_killed(op: DemoOp) -> bool {
    !failing_cases(op).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_passes_every_case() {
        assert!(failing_cases(DemoOp::ORIGINAL).is_empty());
    }

    #[test]
    fn test_subtraction_mutant_is_killed() {
        let failing = failing_cases(DemoOp::Sub);
        assert!(!failing.is_empty());
        assert!(failing.contains(&DemoCase::new(1, 2, 3)));
    }

    #[test]
    fn test_every_mutant_is_killed() {
        for op in DemoOp::MUTANTS {
            assert!(is_killed(op), "mutant {:?} survives the demo table", op);
        }
    }

    #[test]
    fn test_case_table_is_fixed() {
        let rows: Vec<_> = DEMO_CASES.iter().map(|c| (c.left, c.right, c.expected)).collect();
        assert_eq!(rows, vec![(0, 0, 0), (1, 2, 3), (-3, 5, 2), (10, -4, 6)]);
    }
}
