//! Version parsing and version constraint arithmetic.
//!
//! A [`VersionConstraint`] is kept as a normalized union of disjoint version
//! intervals, so [`VersionConstraint::merge`] is an exact intersection: it is
//! commutative and associative, and it fails only when no version can satisfy
//! both operands.
//!
//! Supported syntax:
//!
//! - operator specifiers joined by `,` (all must match): `>=1.0,<2.0`, `!=1.1`
//! - caret and tilde requirements: `^3.0`, `~1.2`
//! - interval ranges, unioned when several are listed: `[1.0,2.0)`, `(,1.5)`,
//!   `[1.0]`, `[1.0,2.0),[3.0,4.0)`
//! - `*` for any version
//! - a bare version such as `1.0`, meaning "1.0 or later"
//!
//! # Examples
//!
//! ```
//! use extplan_model::version::{VersionConstraint, parse_version};
//!
//! let a = VersionConstraint::parse(">=1.0,<2.0").unwrap();
//! let b = VersionConstraint::parse(">=1.5").unwrap();
//! let merged = a.merge(&b).unwrap();
//!
//! assert_eq!(merged, VersionConstraint::parse("[1.5,2.0)").unwrap());
//! assert!(merged.is_compatible(&parse_version("1.7").unwrap()));
//! assert!(!merged.is_compatible(&parse_version("1.2").unwrap()));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, IncompatibleVersionConstraint, Result};

/// Parse a version, zero-padding `major` and `major.minor` forms.
///
/// - `"3"` -> `3.0.0`
/// - `"3.12"` -> `3.12.0`
/// - `"3.12.1-rc.1"` -> `3.12.1-rc.1`
pub fn parse_version(s: &str) -> Result<Version> {
    parse_version_parts(s).map(|(version, _)| version)
}

/// Parse a version and report how many numeric components were written.
fn parse_version_parts(s: &str) -> Result<(Version, usize)> {
    let s = s.trim();
    let split = s.find(|c: char| c == '-' || c == '+').unwrap_or(s.len());
    let (numeric, suffix) = s.split_at(split);
    let components = numeric.split('.').count();
    let padded = match components {
        1 => format!("{numeric}.0.0{suffix}"),
        2 => format!("{numeric}.0{suffix}"),
        _ => s.to_string(),
    };

    Version::parse(&padded)
        .map(|version| (version, components))
        .map_err(|source| Error::InvalidVersion {
            version: s.to_string(),
            source,
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Bound {
    Unbounded,
    Inclusive(Version),
    Exclusive(Version),
}

impl Bound {
    fn version(&self) -> Option<&Version> {
        match self {
            Bound::Unbounded => None,
            Bound::Inclusive(v) | Bound::Exclusive(v) => Some(v),
        }
    }

    fn is_exclusive(&self) -> bool {
        matches!(self, Bound::Exclusive(_))
    }
}

/// Order lower bounds by how early they start admitting versions.
fn cmp_lower(a: &Bound, b: &Bound) -> Ordering {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ordering::Equal,
        (Bound::Unbounded, _) => Ordering::Less,
        (_, Bound::Unbounded) => Ordering::Greater,
        _ => a
            .version()
            .cmp(&b.version())
            .then_with(|| a.is_exclusive().cmp(&b.is_exclusive())),
    }
}

/// Order upper bounds by how late they stop admitting versions.
fn cmp_upper(a: &Bound, b: &Bound) -> Ordering {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ordering::Equal,
        (Bound::Unbounded, _) => Ordering::Greater,
        (_, Bound::Unbounded) => Ordering::Less,
        _ => a
            .version()
            .cmp(&b.version())
            .then_with(|| b.is_exclusive().cmp(&a.is_exclusive())),
    }
}

/// Whether an interval ending at `upper` overlaps or abuts one starting at `lower`.
fn touches(upper: &Bound, lower: &Bound) -> bool {
    match (upper, lower) {
        (Bound::Unbounded, _) | (_, Bound::Unbounded) => true,
        (Bound::Exclusive(u), Bound::Exclusive(l)) => l < u,
        (
            Bound::Inclusive(u) | Bound::Exclusive(u),
            Bound::Inclusive(l) | Bound::Exclusive(l),
        ) => l <= u,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Interval {
    lower: Bound,
    upper: Bound,
}

impl Interval {
    fn any() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    fn exact(version: Version) -> Self {
        Self {
            lower: Bound::Inclusive(version.clone()),
            upper: Bound::Inclusive(version),
        }
    }

    fn contains(&self, version: &Version) -> bool {
        let above_lower = match &self.lower {
            Bound::Unbounded => true,
            Bound::Inclusive(l) => version >= l,
            Bound::Exclusive(l) => version > l,
        };
        let below_upper = match &self.upper {
            Bound::Unbounded => true,
            Bound::Inclusive(u) => version <= u,
            Bound::Exclusive(u) => version < u,
        };
        above_lower && below_upper
    }

    fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Inclusive(l), Bound::Inclusive(u)) => l > u,
            (
                Bound::Inclusive(l) | Bound::Exclusive(l),
                Bound::Inclusive(u) | Bound::Exclusive(u),
            ) => l >= u,
            _ => false,
        }
    }

    fn intersect(&self, other: &Self) -> Option<Self> {
        let lower = if cmp_lower(&self.lower, &other.lower) == Ordering::Less {
            other.lower.clone()
        } else {
            self.lower.clone()
        };
        let upper = if cmp_upper(&self.upper, &other.upper) == Ordering::Greater {
            other.upper.clone()
        } else {
            self.upper.clone()
        };
        let candidate = Self { lower, upper };
        (!candidate.is_empty()).then_some(candidate)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Bound::Inclusive(l), Bound::Inclusive(u)) = (&self.lower, &self.upper) {
            if l == u {
                return write!(f, "[{l}]");
            }
        }
        match &self.lower {
            Bound::Unbounded => f.write_str("(")?,
            Bound::Inclusive(l) => write!(f, "[{l}")?,
            Bound::Exclusive(l) => write!(f, "({l}")?,
        }
        f.write_str(",")?;
        match &self.upper {
            Bound::Unbounded => f.write_str(")"),
            Bound::Inclusive(u) => write!(f, "{u}]"),
            Bound::Exclusive(u) => write!(f, "{u})"),
        }
    }
}

/// Sort, drop empty intervals and coalesce overlapping or adjacent ones.
fn normalize(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.retain(|i| !i.is_empty());
    intervals.sort_by(|a, b| cmp_lower(&a.lower, &b.lower));

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for next in intervals {
        if let Some(last) = merged.last_mut() {
            if touches(&last.upper, &next.lower) {
                if cmp_upper(&next.upper, &last.upper) == Ordering::Greater {
                    last.upper = next.upper;
                }
                continue;
            }
        }
        merged.push(next);
    }
    merged
}

fn intersect_all(left: &[Interval], right: &[Interval]) -> Vec<Interval> {
    let mut parts = Vec::new();
    for a in left {
        for b in right {
            if let Some(i) = a.intersect(b) {
                parts.push(i);
            }
        }
    }
    normalize(parts)
}

/// A set of acceptable versions.
///
/// Equality is structural on the normalized interval set, so `>=1.5,<2.0`
/// and `[1.5,2.0)` compare equal.
#[derive(Debug, Clone)]
pub struct VersionConstraint {
    intervals: Vec<Interval>,
    /// The original constraint string for display, if parsed.
    raw: Option<String>,
}

impl PartialEq for VersionConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.intervals == other.intervals
    }
}

impl Eq for VersionConstraint {}

impl VersionConstraint {
    /// A constraint accepting every version.
    pub fn any() -> Self {
        Self {
            intervals: vec![Interval::any()],
            raw: None,
        }
    }

    /// A constraint accepting exactly `version`.
    pub fn exact(version: Version) -> Self {
        Self {
            intervals: vec![Interval::exact(version)],
            raw: None,
        }
    }

    /// Parse a version constraint string. See the module docs for the syntax.
    pub fn parse(constraint: &str) -> Result<Self> {
        let raw = constraint.trim();
        if raw.is_empty() {
            return Err(Error::VersionConstraintParse {
                constraint: constraint.to_string(),
                reason: "empty constraint".to_string(),
            });
        }

        let intervals = if raw.starts_with('[') || raw.starts_with('(') {
            normalize(parse_ranges(raw)?)
        } else {
            parse_specifiers(raw)?
        };

        if intervals.is_empty() {
            return Err(Error::VersionConstraintParse {
                constraint: raw.to_string(),
                reason: "constraint matches no version".to_string(),
            });
        }

        Ok(Self {
            intervals,
            raw: Some(raw.to_string()),
        })
    }

    /// Check whether `version` satisfies this constraint.
    pub fn is_compatible(&self, version: &Version) -> bool {
        self.intervals.iter().any(|i| i.contains(version))
    }

    /// Whether every version satisfies this constraint.
    pub fn is_any(&self) -> bool {
        self.intervals == [Interval::any()]
    }

    /// Intersect two constraints.
    ///
    /// Neither operand is modified. Fails when no version satisfies both.
    pub fn merge(
        &self,
        other: &Self,
    ) -> std::result::Result<Self, IncompatibleVersionConstraint> {
        if self == other {
            return Ok(self.clone());
        }

        let intervals = intersect_all(&self.intervals, &other.intervals);
        if intervals.is_empty() {
            return Err(IncompatibleVersionConstraint {
                left: self.clone(),
                right: other.clone(),
            });
        }

        Ok(Self {
            intervals,
            raw: None,
        })
    }

    /// Render the normalized interval form, ignoring the original text.
    pub fn canonical(&self) -> String {
        if self.is_any() {
            return "*".to_string();
        }
        self.intervals
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(raw) => f.write_str(raw),
            None => f.write_str(&self.canonical()),
        }
    }
}

impl FromStr for VersionConstraint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for VersionConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionConstraint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn constraint_error(constraint: &str, reason: impl Into<String>) -> Error {
    Error::VersionConstraintParse {
        constraint: constraint.to_string(),
        reason: reason.into(),
    }
}

fn constraint_version(constraint: &str, text: &str) -> Result<(Version, usize)> {
    let text = text.trim();
    parse_version_parts(text)
        .map_err(|_| constraint_error(constraint, format!("invalid version: {text}")))
}

/// Parse `[a,b)`-style ranges, possibly several separated by commas.
fn parse_ranges(raw: &str) -> Result<Vec<Interval>> {
    let mut intervals = Vec::new();
    let mut rest = raw;

    while !rest.is_empty() {
        let open = match rest.chars().next() {
            Some(c @ ('[' | '(')) => c,
            _ => return Err(constraint_error(raw, "expected '[' or '(' to open a range")),
        };
        let close_at = rest
            .find(|c: char| c == ']' || c == ')')
            .ok_or_else(|| constraint_error(raw, "unterminated range"))?;
        let close = if rest.as_bytes()[close_at] == b']' { ']' } else { ')' };

        intervals.push(parse_range(raw, open, &rest[1..close_at], close)?);

        rest = rest[close_at + 1..].trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start();
            if rest.is_empty() {
                return Err(constraint_error(raw, "trailing ',' after range"));
            }
        } else if !rest.is_empty() {
            return Err(constraint_error(raw, "expected ',' between ranges"));
        }
    }

    Ok(intervals)
}

fn parse_range(raw: &str, open: char, body: &str, close: char) -> Result<Interval> {
    let Some((lo, hi)) = body.split_once(',') else {
        if open != '[' || close != ']' {
            return Err(constraint_error(raw, "a single-version range must be written [v]"));
        }
        let (version, _) = constraint_version(raw, body)?;
        return Ok(Interval::exact(version));
    };

    let lower = match lo.trim() {
        "" => Bound::Unbounded,
        text => {
            let (v, _) = constraint_version(raw, text)?;
            if open == '[' { Bound::Inclusive(v) } else { Bound::Exclusive(v) }
        }
    };
    let upper = match hi.trim() {
        "" => Bound::Unbounded,
        text => {
            let (v, _) = constraint_version(raw, text)?;
            if close == ']' { Bound::Inclusive(v) } else { Bound::Exclusive(v) }
        }
    };

    Ok(Interval { lower, upper })
}

/// Parse comma-joined operator specifiers; all of them must hold.
fn parse_specifiers(raw: &str) -> Result<Vec<Interval>> {
    let mut accepted = vec![Interval::any()];
    for part in raw.split(',').map(str::trim) {
        if part.is_empty() {
            continue;
        }
        accepted = intersect_all(&accepted, &parse_specifier(part)?);
    }
    Ok(accepted)
}

fn parse_specifier(part: &str) -> Result<Vec<Interval>> {
    if part == "*" {
        return Ok(vec![Interval::any()]);
    }

    if let Some(rest) = part.strip_prefix('^') {
        let (v, components) = constraint_version(part, rest)?;
        let upper = caret_upper(&v, components);
        return Ok(vec![Interval {
            lower: Bound::Inclusive(v),
            upper: Bound::Exclusive(upper),
        }]);
    }
    if let Some(rest) = part.strip_prefix('~') {
        let (v, components) = constraint_version(part, rest)?;
        let upper = if components == 1 {
            Version::new(v.major + 1, 0, 0)
        } else {
            Version::new(v.major, v.minor + 1, 0)
        };
        return Ok(vec![Interval {
            lower: Bound::Inclusive(v),
            upper: Bound::Exclusive(upper),
        }]);
    }

    let (op, rest) = [">=", "<=", "!=", "==", ">", "<", "="]
        .iter()
        .find_map(|op| part.strip_prefix(*op).map(|rest| (*op, rest)))
        .unwrap_or(("", part));
    let (v, _) = constraint_version(part, rest)?;

    let intervals = match op {
        ">=" | "" => vec![Interval {
            lower: Bound::Inclusive(v),
            upper: Bound::Unbounded,
        }],
        ">" => vec![Interval {
            lower: Bound::Exclusive(v),
            upper: Bound::Unbounded,
        }],
        "<=" => vec![Interval {
            lower: Bound::Unbounded,
            upper: Bound::Inclusive(v),
        }],
        "<" => vec![Interval {
            lower: Bound::Unbounded,
            upper: Bound::Exclusive(v),
        }],
        "!=" => vec![
            Interval {
                lower: Bound::Unbounded,
                upper: Bound::Exclusive(v.clone()),
            },
            Interval {
                lower: Bound::Exclusive(v),
                upper: Bound::Unbounded,
            },
        ],
        _ => vec![Interval::exact(v)],
    };
    Ok(intervals)
}

/// Upper bound of a caret requirement, following Cargo's rules.
fn caret_upper(v: &Version, components: usize) -> Version {
    if v.major > 0 || components == 1 {
        Version::new(v.major + 1, 0, 0)
    } else if v.minor > 0 || components == 2 {
        Version::new(0, v.minor + 1, 0)
    } else {
        Version::new(0, 0, v.patch + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(s: &str) -> Version {
        parse_version(s).unwrap()
    }

    fn c(s: &str) -> VersionConstraint {
        VersionConstraint::parse(s).unwrap()
    }

    // --- parse_version ---

    #[rstest]
    #[case("3", Version::new(3, 0, 0))]
    #[case("3.12", Version::new(3, 12, 0))]
    #[case("3.12.1", Version::new(3, 12, 1))]
    #[case("  1.0  ", Version::new(1, 0, 0))]
    fn test_parse_version_pads_components(#[case] input: &str, #[case] expected: Version) {
        assert_eq!(parse_version(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_version_keeps_prerelease() {
        let parsed = parse_version("2.0-rc.1").unwrap();
        assert_eq!(parsed.to_string(), "2.0.0-rc.1");
    }

    #[test]
    fn test_parse_version_rejects_garbage() {
        assert!(matches!(
            parse_version("abc"),
            Err(Error::InvalidVersion { .. })
        ));
        assert!(parse_version("").is_err());
    }

    // --- parse ---

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case(">=abc")]
    #[case("[1.0,2.0")]
    #[case("[1.0,2.0)x")]
    #[case("(1.0)")]
    #[case("[1.0,2.0),")]
    #[case(">2.0,<1.0")]
    fn test_parse_rejects(#[case] input: &str) {
        assert!(
            VersionConstraint::parse(input).is_err(),
            "'{input}' should be rejected"
        );
    }

    #[rstest]
    #[case(">=3.12", "3.12.0", true)]
    #[case(">=3.12", "3.11.9", false)]
    #[case("<3.13", "3.12.9", true)]
    #[case("<3.13", "3.13.0", false)]
    #[case(">=3.10,<3.13", "3.12.5", true)]
    #[case(">=3.10,<3.13", "3.13.0", false)]
    #[case("==3.12.0", "3.12.0", true)]
    #[case("==3.12.0", "3.12.1", false)]
    #[case("!=3.11.0", "3.11.0", false)]
    #[case("!=3.11.0", "3.12.0", true)]
    #[case("^3.0", "3.9.9", true)]
    #[case("^3.0", "4.0.0", false)]
    #[case("^0.2.3", "0.2.9", true)]
    #[case("^0.2.3", "0.3.0", false)]
    #[case("~1.2", "1.2.7", true)]
    #[case("~1.2", "1.3.0", false)]
    #[case("~1", "1.9.0", true)]
    #[case("[1.0,2.0)", "1.0.0", true)]
    #[case("[1.0,2.0)", "2.0.0", false)]
    #[case("(1.0,2.0]", "1.0.0", false)]
    #[case("(1.0,2.0]", "2.0.0", true)]
    #[case("(,1.5)", "0.1.0", true)]
    #[case("[2.0,)", "9.0.0", true)]
    #[case("[1.0]", "1.0.0", true)]
    #[case("[1.0]", "1.0.1", false)]
    #[case("[1.0,2.0),[3.0,4.0)", "3.5.0", true)]
    #[case("[1.0,2.0),[3.0,4.0)", "2.5.0", false)]
    #[case("1.0", "7.0.0", true)]
    #[case("1.0", "0.9.0", false)]
    #[case("*", "0.0.1", true)]
    fn test_is_compatible(#[case] constraint: &str, #[case] version: &str, #[case] expected: bool) {
        assert_eq!(
            c(constraint).is_compatible(&v(version)),
            expected,
            "{constraint} vs {version}"
        );
    }

    #[test]
    fn test_equivalent_syntaxes_compare_equal() {
        assert_eq!(c(">=1.5,<2.0"), c("[1.5,2.0)"));
        assert_eq!(c("^1.0"), c("[1.0,2.0)"));
        assert_eq!(c("[1.0,2.0],[2.0,3.0)"), c("[1.0,3.0)"));
        assert_ne!(c("[1.0,2.0),(2.0,3.0)"), c("[1.0,3.0)"));
    }

    // --- merge ---

    #[test]
    fn test_merge_overlapping_ranges_is_intersection() {
        let merged = c(">=1.0,<2.0").merge(&c(">=1.5")).unwrap();
        assert_eq!(merged, c("[1.5,2.0)"));
        assert_eq!(merged.to_string(), "[1.5.0,2.0.0)");
    }

    #[test]
    fn test_merge_disjoint_ranges_fails() {
        let left = c("[1.0,2.0)");
        let right = c("[2.0,3.0)");
        let err = left.merge(&right).unwrap_err();
        assert_eq!(err.left, left);
        assert_eq!(err.right, right);
    }

    #[test]
    fn test_merge_touching_exclusive_bounds_fails() {
        assert!(c("<1.5").merge(&c(">1.5")).is_err());
        assert_eq!(c("<=1.5").merge(&c(">=1.5")).unwrap(), c("[1.5]"));
    }

    #[test]
    fn test_merge_with_union_keeps_matching_parts() {
        let merged = c("[1.0,2.0),[3.0,4.0)").merge(&c(">=1.5,<3.5")).unwrap();
        assert_eq!(merged, c("[1.5,2.0),[3.0,3.5)"));
    }

    #[test]
    fn test_merge_does_not_mutate_operands() {
        let left = c("^1.0");
        let right = c(">=1.2");
        let _ = left.merge(&right).unwrap();
        assert_eq!(left.to_string(), "^1.0");
        assert_eq!(right.to_string(), ">=1.2");
    }

    #[test]
    fn test_any_is_merge_identity() {
        let constraint = c("[1.0,2.0)");
        assert_eq!(VersionConstraint::any().merge(&constraint).unwrap(), constraint);
        assert!(VersionConstraint::any().is_any());
        assert_eq!(VersionConstraint::any().to_string(), "*");
    }

    // --- Display / serde ---

    #[test]
    fn test_display_keeps_original_text() {
        assert_eq!(c(">=3.10,<3.13").to_string(), ">=3.10,<3.13");
    }

    #[test]
    fn test_canonical_form() {
        assert_eq!(c(">=1.0,<2.0").canonical(), "[1.0.0,2.0.0)");
        assert_eq!(c("<1.0").canonical(), "(,1.0.0)");
        assert_eq!(c("!=1.0").canonical(), "(,1.0.0),(1.0.0,)");
        assert_eq!(VersionConstraint::exact(v("1.2")).canonical(), "[1.2.0]");
    }

    #[test]
    fn test_serde_uses_string_form() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            constraint: VersionConstraint,
        }

        let holder: Holder = toml::from_str(r#"constraint = "[1.0,2.0)""#).unwrap();
        assert_eq!(holder.constraint, c(">=1.0,<2.0"));
        let out = toml::to_string(&holder).unwrap();
        assert!(out.contains(r#"constraint = "[1.0,2.0)""#), "got: {out}");

        let bad: std::result::Result<Holder, _> = toml::from_str(r#"constraint = ">=nope""#);
        assert!(bad.is_err());
    }
}
