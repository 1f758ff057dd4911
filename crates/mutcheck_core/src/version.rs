//! Parse dependency version strings and enforce the minimum-version gate.
//!
//! The harness asks a freshly provisioned interpreter which version of a dependency it installed,
//! then refuses to go any further when that version predates what the target interpreter needs.
//!
//! ## Notes
//! - **Parsing is total**: every input maps to a [`VersionTriple`]. Garbage maps to `0.0.0`, which fails any
//!   non-zero gate.
//! - **Leading digits only**: `"0rc1"` contributes `0`, not `1` or `01`.
//! - **Early stop**: the scan ends at the first component without leading digits (`"1.dev3.4"` is `1.0.0`).
//! - **Saturation**: absurdly long digit runs clamp to `u64::MAX` instead of failing.

use std::fmt;
use std::str::FromStr;

/// Represent a three-component numeric version (`major.minor.patch`).
///
/// Ordering is lexicographic over the components, most significant first, which is exactly
/// tuple ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionTriple {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionTriple {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// Return the components as a plain tuple.
    pub const fn as_tuple(self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }

    /// Check whether this version is at least `minimum`.
    ///
    /// ## Examples
    /// ```rust
    /// use mutcheck_core::VersionTriple;
    ///
    /// let minimum = VersionTriple::new(1, 8, 0);
    /// assert!(VersionTriple::new(1, 8, 0).satisfies(minimum));
    /// assert!(!VersionTriple::new(1, 7, 9).satisfies(minimum));
    /// ```
    pub fn satisfies(self, minimum: VersionTriple) -> bool {
        self >= minimum
    }
}

impl From<(u64, u64, u64)> for VersionTriple {
    fn from((major, minor, patch): (u64, u64, u64)) -> Self {
        Self::new(major, minor, patch)
    }
}

impl fmt::Display for VersionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Describe why a strict version string (e.g. a `--minimum` flag) was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseVersionError {
    Empty,
    TooManyComponents(usize),
    InvalidComponent(String),
}

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseVersionError::Empty => write!(f, "version string is empty"),
            ParseVersionError::TooManyComponents(n) => {
                write!(f, "expected at most 3 version components, found {}", n)
            }
            ParseVersionError::InvalidComponent(c) => {
                write!(f, "version component '{}' is not a decimal number", c)
            }
        }
    }
}

impl std::error::Error for ParseVersionError {}

/// Strict parsing: `"1"`, `"1.8"` and `"1.8.0"` are accepted, anything else is an error.
///
/// Use [`parse_version`] for reported package versions, which may carry pre-release suffixes.
impl FromStr for VersionTriple {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseVersionError::Empty);
        }
        let components: Vec<&str> = s.split('.').collect();
        if components.len() > 3 {
            return Err(ParseVersionError::TooManyComponents(components.len()));
        }
        let mut parts = [0u64; 3];
        for (slot, component) in parts.iter_mut().zip(&components) {
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseVersionError::InvalidComponent(component.to_string()));
            }
            *slot = component
                .parse()
                .map_err(|_| ParseVersionError::InvalidComponent(component.to_string()))?;
        }
        Ok(VersionTriple::new(parts[0], parts[1], parts[2]))
    }
}

/// Parse a reported package version into a [`VersionTriple`].
///
/// ## Parameters
/// - `text`: the version string as reported by package metadata (for example `1.8.0`, `1.8.0rc1`, `2`).
///
/// ## Returns
/// - (`VersionTriple`): the leading numeric components, zero-padded to three.
///
/// ## Examples
/// ```rust
/// use mutcheck_core::{parse_version, VersionTriple};
///
/// assert_eq!(parse_version("1.8.0"), VersionTriple::new(1, 8, 0));
/// assert_eq!(parse_version("1.8"), VersionTriple::new(1, 8, 0));
/// assert_eq!(parse_version("1.9.0rc1"), VersionTriple::new(1, 9, 0));
/// assert_eq!(parse_version("dev"), VersionTriple::new(0, 0, 0));
/// ```
pub fn parse_version(text: &str) -> VersionTriple {
    let mut parts = [0u64; 3];
    for (slot, component) in parts.iter_mut().zip(text.split('.')) {
        let digits = leading_digits(component);
        if digits.is_empty() {
            break;
        }
        *slot = saturating_decimal(digits);
    }
    VersionTriple::new(parts[0], parts[1], parts[2])
}

fn leading_digits(component: &str) -> &str {
    let end = component
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(component.len());
    &component[..end]
}

fn saturating_decimal(digits: &str) -> u64 {
    digits.bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    })
}

/// Report that an installed dependency is older than the gate allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateViolation {
    /// Distribution name of the gated dependency (e.g. `libcst`).
    pub dependency: String,
    /// The version string exactly as the interpreter reported it.
    pub reported: String,
    pub installed: VersionTriple,
    pub minimum: VersionTriple,
}

impl fmt::Display for GateViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} is too old: parsed as {}, but at least {} is required",
            self.dependency, self.reported, self.installed, self.minimum
        )
    }
}

impl std::error::Error for GateViolation {}

/// Parse `reported` and check it against `minimum`.
///
/// ## Returns
/// - `Ok(VersionTriple)`: the parsed version, when it is at least `minimum`.
/// - `Err(GateViolation)`: when the parsed version sorts strictly below `minimum`.
pub fn check_minimum(dependency: &str, reported: &str, minimum: VersionTriple) -> Result<VersionTriple, GateViolation> {
    let installed = parse_version(reported);
    if installed.satisfies(minimum) {
        Ok(installed)
    } else {
        Err(GateViolation {
            dependency: dependency.to_string(),
            reported: reported.to_string(),
            installed,
            minimum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: VersionTriple = VersionTriple::new(1, 8, 0);

    #[test]
    fn test_parse_full_version() {
        assert_eq!(parse_version("1.8.0"), VersionTriple::new(1, 8, 0));
        assert_eq!(parse_version("10.20.30"), VersionTriple::new(10, 20, 30));
    }

    #[test]
    fn test_parse_pads_missing_components() {
        assert_eq!(parse_version("2"), VersionTriple::new(2, 0, 0));
        assert_eq!(parse_version("1.8"), VersionTriple::new(1, 8, 0));
    }

    #[test]
    fn test_parse_ignores_extra_components() {
        assert_eq!(parse_version("1.8.0.post1"), VersionTriple::new(1, 8, 0));
        assert_eq!(parse_version("1.2.3.4.5"), VersionTriple::new(1, 2, 3));
    }

    #[test]
    fn test_parse_takes_leading_digits_only() {
        assert_eq!(parse_version("1.9.0rc1"), VersionTriple::new(1, 9, 0));
        assert_eq!(parse_version("1.8.0a2"), VersionTriple::new(1, 8, 0));
        assert_eq!(parse_version("3.14b1"), VersionTriple::new(3, 14, 0));
    }

    #[test]
    fn test_parse_stops_at_first_non_numeric_component() {
        assert_eq!(parse_version("1.dev3.4"), VersionTriple::new(1, 0, 0));
        assert_eq!(parse_version("1.8.x"), VersionTriple::new(1, 8, 0));
    }

    #[test]
    fn test_parse_non_numeric_first_component_is_zero() {
        assert_eq!(parse_version(""), VersionTriple::new(0, 0, 0));
        assert_eq!(parse_version("dev"), VersionTriple::new(0, 0, 0));
        assert_eq!(parse_version("v1.8.0"), VersionTriple::new(0, 0, 0));
        assert_eq!(parse_version(".1.2"), VersionTriple::new(0, 0, 0));
    }

    #[test]
    fn test_parse_saturates_huge_components() {
        let huge = "99999999999999999999999999.1";
        assert_eq!(parse_version(huge), VersionTriple::new(u64::MAX, 1, 0));
    }

    #[test]
    fn test_tuple_ordering() {
        assert!(VersionTriple::new(1, 8, 0) < VersionTriple::new(1, 8, 1));
        assert!(VersionTriple::new(1, 7, 9) < VersionTriple::new(1, 8, 0));
        assert!(VersionTriple::new(2, 0, 0) > VersionTriple::new(1, 99, 99));
        assert_eq!(VersionTriple::new(1, 8, 0).cmp(&MIN), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_gate_accepts_equal_and_newer() {
        assert_eq!(check_minimum("libcst", "1.8.0", MIN), Ok(VersionTriple::new(1, 8, 0)));
        assert_eq!(check_minimum("libcst", "1.8.1", MIN), Ok(VersionTriple::new(1, 8, 1)));
        assert_eq!(check_minimum("libcst", "2.0", MIN), Ok(VersionTriple::new(2, 0, 0)));
    }

    #[test]
    fn test_gate_rejects_older() {
        let err = check_minimum("libcst", "1.7.9", MIN).unwrap_err();
        assert_eq!(err.installed, VersionTriple::new(1, 7, 9));
        assert_eq!(err.minimum, MIN);
        let msg = err.to_string();
        assert!(msg.contains("libcst 1.7.9"), "{msg}");
        assert!(msg.contains("1.8.0"), "{msg}");
    }

    #[test]
    fn test_gate_rejects_unparseable() {
        let err = check_minimum("libcst", "unknown", MIN).unwrap_err();
        assert_eq!(err.installed, VersionTriple::default());
    }

    #[test]
    fn test_from_str_strict() {
        assert_eq!("1.8.0".parse::<VersionTriple>(), Ok(VersionTriple::new(1, 8, 0)));
        assert_eq!("1.8".parse::<VersionTriple>(), Ok(VersionTriple::new(1, 8, 0)));
        assert_eq!(" 3 ".parse::<VersionTriple>(), Ok(VersionTriple::new(3, 0, 0)));
        assert_eq!("".parse::<VersionTriple>(), Err(ParseVersionError::Empty));
        assert_eq!(
            "1.2.3.4".parse::<VersionTriple>(),
            Err(ParseVersionError::TooManyComponents(4))
        );
        assert_eq!(
            "1.8rc1".parse::<VersionTriple>(),
            Err(ParseVersionError::InvalidComponent("8rc1".to_string()))
        );
        assert_eq!(
            "1..0".parse::<VersionTriple>(),
            Err(ParseVersionError::InvalidComponent(String::new()))
        );
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let v = VersionTriple::new(1, 8, 0);
        assert_eq!(v.to_string(), "1.8.0");
        assert_eq!(parse_version(&v.to_string()), v);
    }

    mod strict_parse {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn accepts_dotted_decimals(parts in prop::collection::vec(0u64..100_000, 1..=3)) {
                let text = parts.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
                let parsed: VersionTriple = text.parse().unwrap();
                prop_assert_eq!(parsed, parse_version(&text));
            }

            #[test]
            fn rejects_any_letter(prefix in "[0-9]{1,3}", letter in "[a-z]") {
                let text = format!("{}.{}", prefix, letter);
                prop_assert!(text.parse::<VersionTriple>().is_err());
            }
        }
    }
}
