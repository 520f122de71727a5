//! Interval-based dependency constraint algebra.

use std::{cmp::Ordering, fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::VersionError,
    version::Version,
};

/// One of the five interval comparators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl Comparator {
    fn permits_equality(self) -> bool {
        matches!(self, Comparator::Le | Comparator::Ge | Comparator::Eq)
    }

    fn as_str(self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Eq => "==",
            Comparator::Ge => ">=",
            Comparator::Gt => ">",
        }
    }
}

/// A reference to a revision-control repository backing a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub url: String,
    pub revision: String,
}

/// A single interval-bound dependency constraint, plus the orthogonal
/// attributes recipes attach to a dependency entry.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub lower: (Comparator, Version),
    pub upper: (Comparator, Version),
    pub path: Option<PathBuf>,
    pub repository: Option<RepositoryRef>,
    pub sub_configuration: Option<String>,
    pub optional: bool,
    pub default: bool,
}

impl Constraint {
    /// The always-satisfied constraint produced by `"*"`.
    pub fn unbounded() -> Self {
        Constraint {
            lower: (Comparator::Ge, Version::min_semantic()),
            upper: (Comparator::Le, Version::max_semantic()),
            path: None,
            repository: None,
            sub_configuration: None,
            optional: false,
            default: false,
        }
    }

    /// An exact pin to a single version.
    pub fn exact(version: Version) -> Self {
        Constraint {
            lower: (Comparator::Ge, version.clone()),
            upper: (Comparator::Le, version),
            path: None,
            repository: None,
            sub_configuration: None,
            optional: false,
            default: false,
        }
    }

    /// An exact pin to a branch.
    pub fn branch(name: &str) -> Self {
        let v = Version::Branch(name.to_string());
        Constraint {
            lower: (Comparator::Ge, v.clone()),
            upper: (Comparator::Le, v),
            path: None,
            repository: None,
            sub_configuration: None,
            optional: false,
            default: false,
        }
    }

    pub fn is_branch(&self) -> bool {
        self.lower.1.is_branch()
    }

    /// Parses the textual constraint grammar:
    ///
    /// - `"*"` — unbounded
    /// - `"==x"`, `">=x"`, `"<=x"`, `"<x"`, `">x"` — single-bound forms
    /// - `">=a <=b"` — explicit two-part range
    /// - `"~>x.y.z"` — compatible-range sugar, expands to `>=x.y.z <x.(y+1).0`
    /// - `"~branch"` — pin to a branch
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let err = || VersionError::MalformedConstraint(input.to_string());

        if trimmed.is_empty() {
            return Err(err());
        }

        if trimmed == "*" {
            return Ok(Constraint::unbounded());
        }

        if let Some(rest) = trimmed.strip_prefix("~>") {
            let version = Version::parse(rest).map_err(|_| err())?;
            let base = version.as_semantic().ok_or_else(err)?;
            let upper = Version::Semantic(crate::version::SemanticVersion {
                major: base.major,
                minor: base.minor + 1,
                patch: 0,
                pre_release: Vec::new(),
                build: Vec::new(),
            });
            return Ok(Constraint {
                lower: (Comparator::Ge, version),
                upper: (Comparator::Lt, upper),
                path: None,
                repository: None,
                sub_configuration: None,
                optional: false,
                default: false,
            });
        }

        if let Some(rest) = trimmed.strip_prefix('~') {
            if rest.is_empty() {
                return Err(err());
            }
            return Ok(Constraint::branch(rest));
        }

        if let Some((left, right)) = trimmed.split_once(' ') {
            let left = left.trim();
            let right = right.trim();
            if left.is_empty() || right.is_empty() {
                return Err(err());
            }
            let (cmp_a, ver_a) = parse_bound(left).ok_or_else(err)?;
            let (cmp_b, ver_b) = parse_bound(right).ok_or_else(err)?;
            return Ok(Constraint {
                lower: (cmp_a, ver_a),
                upper: (cmp_b, ver_b),
                path: None,
                repository: None,
                sub_configuration: None,
                optional: false,
                default: false,
            });
        }

        let (cmp, version) = parse_bound(trimmed).ok_or_else(err)?;
        if version.is_branch() && cmp != Comparator::Eq {
            return Err(err());
        }

        Ok(match cmp {
            Comparator::Eq => Constraint {
                lower: (Comparator::Ge, version.clone()),
                upper: (Comparator::Le, version),
                path: None,
                repository: None,
                sub_configuration: None,
                optional: false,
                default: false,
            },
            Comparator::Le => Constraint {
                lower: (Comparator::Ge, Version::min_semantic()),
                upper: (Comparator::Le, version),
                path: None,
                repository: None,
                sub_configuration: None,
                optional: false,
                default: false,
            },
            Comparator::Lt => Constraint {
                lower: (Comparator::Ge, Version::min_semantic()),
                upper: (Comparator::Lt, version),
                path: None,
                repository: None,
                sub_configuration: None,
                optional: false,
                default: false,
            },
            Comparator::Ge => Constraint {
                lower: (Comparator::Ge, version),
                upper: (Comparator::Le, Version::max_semantic()),
                path: None,
                repository: None,
                sub_configuration: None,
                optional: false,
                default: false,
            },
            Comparator::Gt => Constraint {
                lower: (Comparator::Gt, version),
                upper: (Comparator::Le, Version::max_semantic()),
                path: None,
                repository: None,
                sub_configuration: None,
                optional: false,
                default: false,
            },
        })
    }

    /// `valid() ⇔ (both endpoints equal) ∨ (lower < upper ∧ each comparator
    /// permits the boundary it names)`. Branch constraints are valid iff
    /// both endpoints name the same branch.
    pub fn valid(&self) -> bool {
        match self.lower.1.compare(&self.upper.1) {
            Ok(Ordering::Less) => true,
            Ok(Ordering::Equal) => self.lower.0.permits_equality() && self.upper.0.permits_equality(),
            Ok(Ordering::Greater) => false,
            Err(_) => false,
        }
    }

    /// Does `version` fall inside this constraint's interval?
    pub fn matches(&self, version: &Version) -> bool {
        if self.is_branch() {
            return match (self.lower.1.as_branch(), version.as_branch()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
        }

        if version.is_branch() {
            return false;
        }

        let lower_ok = match version.compare(&self.lower.1) {
            Ok(ord) => satisfies(self.lower.0, ord, true),
            Err(_) => false,
        };
        let upper_ok = match version.compare(&self.upper.1) {
            Ok(ord) => satisfies(self.upper.0, ord, false),
            Err(_) => false,
        };
        lower_ok && upper_ok
    }

    /// The explicitly-invalid sentinel produced when merging incompatible
    /// branch constraints.
    pub fn invalid_sentinel() -> Self {
        Constraint {
            lower: (Comparator::Ge, Version::parse("1.0.0").unwrap()),
            upper: (Comparator::Le, Version::parse("0.0.0").unwrap()),
            path: None,
            repository: None,
            sub_configuration: None,
            optional: false,
            default: false,
        }
    }

    /// Intersects two constraints. The result may be invalid (see [`valid`](Self::valid));
    /// callers that need a hard failure should use [`Constraint::merge_checked`].
    pub fn merge(&self, other: &Constraint) -> Constraint {
        let optional = self.optional && other.optional;
        let default = self.default && other.default;
        let sub_configuration = other.sub_configuration.clone().or_else(|| self.sub_configuration.clone());
        let path = self.path.clone().or_else(|| other.path.clone());
        let repository = self.repository.clone().or_else(|| other.repository.clone());

        if self.is_branch() || other.is_branch() {
            let merged = match (self.lower.1.as_branch(), other.lower.1.as_branch()) {
                (Some(a), Some(b)) if a == b => Constraint::branch(a),
                _ => Constraint::invalid_sentinel(),
            };
            return Constraint {
                optional,
                default,
                sub_configuration,
                path,
                repository,
                ..merged
            };
        }

        let lower = pick_lower(&self.lower, &other.lower);
        let upper = pick_upper(&self.upper, &other.upper);

        Constraint {
            lower,
            upper,
            path,
            repository,
            sub_configuration,
            optional,
            default,
        }
    }

    /// Like [`merge`](Self::merge), but fails with
    /// [`VersionError::IncompatibleConstraints`] instead of returning an
    /// invalid interval.
    pub fn merge_checked(&self, other: &Constraint) -> Result<Constraint, VersionError> {
        let merged = self.merge(other);
        if merged.valid() {
            Ok(merged)
        } else {
            Err(VersionError::IncompatibleConstraints {
                lhs: self.to_string(),
                rhs: other.to_string(),
            })
        }
    }
}

fn satisfies(cmp: Comparator, ord: Ordering, is_lower: bool) -> bool {
    (match cmp {
        Comparator::Eq => ord == Ordering::Equal,
        Comparator::Ge => ord != Ordering::Less,
        Comparator::Gt => ord == Ordering::Greater,
        Comparator::Le => ord != Ordering::Greater,
        Comparator::Lt => ord == Ordering::Less,
    })
    // `is_lower` kept for symmetry/documentation; comparators are already
    // oriented relative to the bound they describe.
    && { let _ = is_lower; true }
}

fn pick_lower(a: &(Comparator, Version), b: &(Comparator, Version)) -> (Comparator, Version) {
    match a.1.compare(&b.1) {
        Ok(Ordering::Greater) => a.clone(),
        Ok(Ordering::Less) => b.clone(),
        Ok(Ordering::Equal) => {
            if stricter_lower(a.0, b.0) {
                (a.0, a.1.clone())
            } else {
                (b.0, b.1.clone())
            }
        }
        Err(_) => a.clone(),
    }
}

fn pick_upper(a: &(Comparator, Version), b: &(Comparator, Version)) -> (Comparator, Version) {
    match a.1.compare(&b.1) {
        Ok(Ordering::Less) => a.clone(),
        Ok(Ordering::Greater) => b.clone(),
        Ok(Ordering::Equal) => {
            if stricter_upper(a.0, b.0) {
                (a.0, a.1.clone())
            } else {
                (b.0, b.1.clone())
            }
        }
        Err(_) => a.clone(),
    }
}

/// `>` is stricter than `>=` at an equal lower bound.
fn stricter_lower(a: Comparator, b: Comparator) -> bool {
    matches!(a, Comparator::Gt) && !matches!(b, Comparator::Gt)
}

/// `<` is stricter than `<=` at an equal upper bound.
fn stricter_upper(a: Comparator, b: Comparator) -> bool {
    matches!(a, Comparator::Lt) && !matches!(b, Comparator::Lt)
}

fn parse_bound(text: &str) -> Option<(Comparator, Version)> {
    let (cmp, rest) = if let Some(r) = text.strip_prefix(">=") {
        (Comparator::Ge, r)
    } else if let Some(r) = text.strip_prefix("<=") {
        (Comparator::Le, r)
    } else if let Some(r) = text.strip_prefix("==") {
        (Comparator::Eq, r)
    } else if let Some(r) = text.strip_prefix('>') {
        (Comparator::Gt, r)
    } else if let Some(r) = text.strip_prefix('<') {
        (Comparator::Lt, r)
    } else {
        (Comparator::Eq, text)
    };

    let version = Version::parse(rest.trim()).ok()?;
    Some((cmp, version))
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_branch() {
            return write!(f, "{}", self.lower.1);
        }
        write!(
            f,
            "{}{} {}{}",
            self.lower.0.as_str(),
            self.lower.1,
            self.upper.0.as_str(),
            self.upper.1
        )
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.lower.0 == other.lower.0
            && self.lower.1 == other.lower.1
            && self.upper.0 == other.upper.0
            && self.upper.1 == other.upper.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unbounded() {
        let c = Constraint::parse("*").unwrap();
        assert!(c.valid());
        assert!(c.matches(&Version::parse("0.0.1").unwrap()));
        assert!(c.matches(&Version::parse("999.0.0").unwrap()));
    }

    #[test]
    fn parses_exact_and_normalizes() {
        let c = Constraint::parse("==1.2.3").unwrap();
        assert_eq!(c.lower.0, Comparator::Ge);
        assert_eq!(c.upper.0, Comparator::Le);
        assert!(c.matches(&Version::parse("1.2.3").unwrap()));
        assert!(!c.matches(&Version::parse("1.2.4").unwrap()));
    }

    #[test]
    fn parses_two_part_range() {
        let c = Constraint::parse(">=1.0.0 <2.0.0").unwrap();
        assert!(c.matches(&Version::parse("1.5.0").unwrap()));
        assert!(!c.matches(&Version::parse("2.0.0").unwrap()));
        assert!(c.matches(&Version::parse("1.0.0").unwrap()));
    }

    #[test]
    fn expands_compatible_range_sugar() {
        let c = Constraint::parse("~>1.2.3").unwrap();
        assert!(c.matches(&Version::parse("1.2.3").unwrap()));
        assert!(c.matches(&Version::parse("1.2.9").unwrap()));
        assert!(!c.matches(&Version::parse("1.3.0").unwrap()));
    }

    #[test]
    fn parses_branch_constraint() {
        let c = Constraint::parse("~master").unwrap();
        assert!(c.is_branch());
        assert!(c.matches(&Version::master()));
        assert!(!c.matches(&Version::parse("1.0.0").unwrap()));
    }

    #[test]
    fn rejects_branch_with_numeric_comparator() {
        assert!(Constraint::parse(">=~master").is_err());
    }

    #[test]
    fn merge_intersects_overlapping_ranges() {
        let a = Constraint::parse(">=1.0.0 <3.0.0").unwrap();
        let b = Constraint::parse(">=2.0.0 <4.0.0").unwrap();
        let merged = a.merge(&b);
        assert!(merged.valid());
        assert!(merged.matches(&Version::parse("2.5.0").unwrap()));
        assert!(!merged.matches(&Version::parse("1.5.0").unwrap()));
        assert!(!merged.matches(&Version::parse("3.5.0").unwrap()));
    }

    #[test]
    fn merge_disjoint_is_invalid() {
        let a = Constraint::parse(">=2.0.0").unwrap();
        let b = Constraint::parse("<=1.0.0").unwrap();
        let merged = a.merge(&b);
        assert!(!merged.valid());
        assert!(a.merge_checked(&b).is_err());
    }

    #[test]
    fn merge_conflicting_branches_is_invalid() {
        let a = Constraint::parse("~master").unwrap();
        let b = Constraint::parse("~develop").unwrap();
        let merged = a.merge(&b);
        assert!(!merged.valid());
    }

    #[test]
    fn merge_is_idempotent_and_commutative() {
        let a = Constraint::parse(">=1.0.0 <2.0.0").unwrap();
        assert_eq!(a.merge(&a), a);

        let b = Constraint::parse(">=0.5.0 <1.5.0").unwrap();
        let ab = a.merge(&b);
        let ba = b.merge(&a);
        assert_eq!(ab.lower, ba.lower);
        assert_eq!(ab.upper, ba.upper);
    }

    #[test]
    fn merge_preserves_semantics_of_matches() {
        let a = Constraint::parse(">=1.0.0 <5.0.0").unwrap();
        let b = Constraint::parse(">=2.0.0 <3.0.0").unwrap();
        let merged = a.merge(&b);
        assert!(merged.valid());
        for v in ["1.5.0", "2.0.0", "2.9.9", "3.0.0", "0.5.0"] {
            let version = Version::parse(v).unwrap();
            assert_eq!(
                merged.matches(&version),
                a.matches(&version) && b.matches(&version),
                "mismatch at {v}"
            );
        }
    }

    #[test]
    fn optional_flags_combine_conjunctively() {
        let mut a = Constraint::parse(">=1.0.0").unwrap();
        a.optional = true;
        let mut b = Constraint::parse(">=1.0.0").unwrap();
        b.optional = true;
        assert!(a.merge(&b).optional);

        b.optional = false;
        assert!(!a.merge(&b).optional);
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(Constraint::parse("").is_err());
        assert!(Constraint::parse("banana").is_err());
    }
}
