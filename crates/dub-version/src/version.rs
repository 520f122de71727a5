//! Version model: SemVer-shaped numeric versions plus branch pseudo-versions.

use std::{cmp::Ordering, fmt};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::VersionError;

/// Marker character that introduces a branch pseudo-version, e.g. `~master`.
pub const BRANCH_MARKER: char = '~';

/// The distinguished default branch name.
pub const MASTER_BRANCH: &str = "master";

/// A parsed version: either a SemVer-shaped release or a branch pseudo-version.
#[derive(Debug, Clone)]
pub enum Version {
    Semantic(SemanticVersion),
    Branch(String),
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(de::Error::custom)
    }
}

/// A SemVer-shaped version: `major.minor.patch[-pre.release][+build.meta]`.
///
/// Build metadata is retained for round-tripping but never participates in
/// ordering or equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Vec<String>,
    pub build: Vec<String>,
}

impl Version {
    /// Parses a version string via a five-state scanner:
    ///
    /// 1..3 accept `major`, `.minor`, `.patch`; state 3 may move to state 4 on
    /// `-` or state 5 on `+`. States 4..5 accept dot-separated identifiers;
    /// state 4 may move to state 5 on `+`.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VersionError::MalformedVersion(input.to_string()));
        }

        if let Some(rest) = trimmed.strip_prefix(BRANCH_MARKER) {
            if rest.is_empty() {
                return Err(VersionError::MalformedVersion(input.to_string()));
            }
            return Ok(Version::Branch(rest.to_string()));
        }

        SemanticVersion::parse(trimmed)
            .map(Version::Semantic)
            .map_err(|_| VersionError::MalformedVersion(input.to_string()))
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Version::Branch(_))
    }

    pub fn as_branch(&self) -> Option<&str> {
        match self {
            Version::Branch(name) => Some(name.as_str()),
            Version::Semantic(_) => None,
        }
    }

    pub fn as_semantic(&self) -> Option<&SemanticVersion> {
        match self {
            Version::Semantic(v) => Some(v),
            Version::Branch(_) => None,
        }
    }

    /// True for semantic versions carrying a pre-release component (e.g.
    /// `1.0.0-beta.1`). Branch pseudo-versions are never pre-releases.
    pub fn is_prerelease(&self) -> bool {
        self.as_semantic().is_some_and(|v| !v.pre_release.is_empty())
    }

    pub fn master() -> Self {
        Version::Branch(MASTER_BRANCH.to_string())
    }

    /// Smallest representable semantic version, used as the implicit lower
    /// bound of an unbounded constraint.
    pub fn min_semantic() -> Self {
        Version::Semantic(SemanticVersion {
            major: 0,
            minor: 0,
            patch: 0,
            pre_release: Vec::new(),
            build: Vec::new(),
        })
    }

    /// Sentinel standing in for "no upper bound".
    pub fn max_semantic() -> Self {
        Version::Semantic(SemanticVersion {
            major: u64::MAX,
            minor: u64::MAX,
            patch: u64::MAX,
            pre_release: Vec::new(),
            build: Vec::new(),
        })
    }

    /// Fallible ordering. Branch versions only ever compare against an
    /// identical branch; every other cross-kind or cross-branch comparison
    /// fails with [`VersionError::IncomparableVersion`].
    pub fn compare(&self, other: &Version) -> Result<Ordering, VersionError> {
        match (self, other) {
            (Version::Semantic(a), Version::Semantic(b)) => Ok(a.compare(b)),
            (Version::Branch(a), Version::Branch(b)) if a == b => Ok(Ordering::Equal),
            _ => Err(VersionError::IncomparableVersion {
                lhs: self.to_string(),
                rhs: other.to_string(),
            }),
        }
    }
}

impl SemanticVersion {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Major,
            Minor,
            Patch,
            PreRelease,
            Build,
        }

        let err = || VersionError::MalformedVersion(input.to_string());

        let mut state = State::Major;
        let mut numeric = [0u64; 3];
        let mut numeric_idx = 0usize;
        let mut pre_release = Vec::new();
        let mut build = Vec::new();
        let mut segment = String::new();

        let finish_numeric_segment = |segment: &mut String,
                                       numeric: &mut [u64; 3],
                                       idx: &mut usize|
         -> Result<(), VersionError> {
            if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit()) {
                return Err(err());
            }
            numeric[*idx] = segment.parse::<u64>().map_err(|_| err())?;
            *idx += 1;
            segment.clear();
            Ok(())
        };

        let finish_identifier_segment = |segment: &mut String,
                                          out: &mut Vec<String>|
         -> Result<(), VersionError> {
            if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                return Err(err());
            }
            out.push(std::mem::take(segment));
            Ok(())
        };

        let mut chars = input.chars().peekable();
        while let Some(c) = chars.next() {
            match state {
                State::Major | State::Minor | State::Patch => match c {
                    '.' if state != State::Patch => {
                        finish_numeric_segment(&mut segment, &mut numeric, &mut numeric_idx)?;
                        state = if state == State::Major {
                            State::Minor
                        } else {
                            State::Patch
                        };
                    }
                    '-' if state == State::Patch => {
                        finish_numeric_segment(&mut segment, &mut numeric, &mut numeric_idx)?;
                        state = State::PreRelease;
                    }
                    '+' if state == State::Patch => {
                        finish_numeric_segment(&mut segment, &mut numeric, &mut numeric_idx)?;
                        state = State::Build;
                    }
                    c if c.is_ascii_digit() => segment.push(c),
                    _ => return Err(err()),
                },
                State::PreRelease => match c {
                    '.' => finish_identifier_segment(&mut segment, &mut pre_release)?,
                    '+' => {
                        finish_identifier_segment(&mut segment, &mut pre_release)?;
                        state = State::Build;
                    }
                    c if c.is_ascii_alphanumeric() || c == '-' => segment.push(c),
                    _ => return Err(err()),
                },
                State::Build => match c {
                    '.' => finish_identifier_segment(&mut segment, &mut build)?,
                    c if c.is_ascii_alphanumeric() || c == '-' => segment.push(c),
                    _ => return Err(err()),
                },
            }
        }

        match state {
            State::Major | State::Minor => return Err(err()),
            State::Patch => finish_numeric_segment(&mut segment, &mut numeric, &mut numeric_idx)?,
            State::PreRelease => finish_identifier_segment(&mut segment, &mut pre_release)?,
            State::Build => finish_identifier_segment(&mut segment, &mut build)?,
        }

        if numeric_idx != 3 {
            return Err(err());
        }

        Ok(SemanticVersion {
            major: numeric[0],
            minor: numeric[1],
            patch: numeric[2],
            pre_release,
            build,
        })
    }

    /// Total order over numeric versions: compare the `major.minor.patch`
    /// triplet, then the pre-release identifier list (absence of a
    /// pre-release sorts above any pre-release at an equal triplet), with
    /// build metadata ignored entirely.
    pub fn compare(&self, other: &SemanticVersion) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (self.pre_release.is_empty(), other.pre_release.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare_identifier_lists(&self.pre_release, &other.pre_release),
            })
    }
}

fn compare_identifier_lists(a: &[String], b: &[String]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = compare_identifier(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_identifier(a: &str, b: &str) -> Ordering {
    let both_numeric = !a.is_empty()
        && !b.is_empty()
        && a.chars().all(|c| c.is_ascii_digit())
        && b.chars().all(|c| c.is_ascii_digit());
    if both_numeric {
        let (na, nb) = (a.parse::<u128>().unwrap_or(0), b.parse::<u128>().unwrap_or(0));
        na.cmp(&nb)
    } else {
        a.cmp(b)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.compare(other), Ok(Ordering::Equal))
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Semantic(v) => write!(f, "{v}"),
            Version::Branch(name) => write!(f, "{BRANCH_MARKER}{name}"),
        }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre_release.is_empty() {
            write!(f, "-{}", self.pre_release.join("."))?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build.join("."))?;
        }
        Ok(())
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_version() {
        let v = Version::parse("1.2.3").unwrap();
        match v {
            Version::Semantic(s) => {
                assert_eq!((s.major, s.minor, s.patch), (1, 2, 3));
                assert!(s.pre_release.is_empty());
                assert!(s.build.is_empty());
            }
            _ => panic!("expected semantic version"),
        }
    }

    #[test]
    fn parses_prerelease_and_build() {
        let v = Version::parse("2.0.0-rc.2+metadata.1").unwrap();
        let s = v.as_semantic().unwrap();
        assert_eq!(s.pre_release, vec!["rc".to_string(), "2".to_string()]);
        assert_eq!(s.build, vec!["metadata".to_string(), "1".to_string()]);
    }

    #[test]
    fn parses_branch() {
        let v = Version::parse("~feature/x").unwrap();
        assert_eq!(v.as_branch(), Some("feature/x"));
    }

    #[test]
    fn rejects_empty_and_truncated() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("1.2").is_err());
        assert!(Version::parse("1.2.").is_err());
        assert!(Version::parse("1.2.3-").is_err());
        assert!(Version::parse("~").is_err());
        assert!(Version::parse("1.2.3.4").is_err());
        assert!(Version::parse("a.b.c").is_err());
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(Version::parse("1.2.3#").is_err());
        assert!(Version::parse("1.2.3-rc!1").is_err());
    }

    #[test]
    fn prerelease_ordering_matches_examples() {
        let ordered = [
            "2.0.0-rc.2",
            "2.0.0-rc.3",
            "2.0.0-rc.10",
            "2.0.0",
        ];
        let parsed: Vec<_> = ordered.iter().map(|s| Version::parse(s).unwrap()).collect();
        for w in parsed.windows(2) {
            assert_eq!(w[0].compare(&w[1]).unwrap(), Ordering::Less, "{} < {}", w[0], w[1]);
        }
    }

    #[test]
    fn alpha_numeric_prerelease_ordering() {
        let ordered = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
        ];
        let parsed: Vec<_> = ordered.iter().map(|s| Version::parse(s).unwrap()).collect();
        for w in parsed.windows(2) {
            assert_eq!(w[0].compare(&w[1]).unwrap(), Ordering::Less, "{} < {}", w[0], w[1]);
        }
    }

    #[test]
    fn build_metadata_ignored_for_equality_and_order() {
        let a = Version::parse("2.0.0-rc.2+metadata").unwrap();
        let b = Version::parse("2.0.0-rc.2").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.compare(&b).unwrap(), Ordering::Equal);
    }

    #[test]
    fn branch_equals_only_itself() {
        let a = Version::parse("~master").unwrap();
        let b = Version::parse("~master").unwrap();
        let c = Version::parse("~develop").unwrap();
        assert_eq!(a.compare(&b).unwrap(), Ordering::Equal);
        assert!(a.compare(&c).is_err());
    }

    #[test]
    fn branch_vs_numeric_is_incomparable() {
        let a = Version::master();
        let b = Version::parse("1.0.0").unwrap();
        assert!(a.compare(&b).is_err());
        assert!(b.compare(&a).is_err());
        assert_ne!(a, b);
    }

    #[test]
    fn roundtrip_stringify_parse() {
        for s in ["1.2.3", "1.2.3-rc.1", "1.2.3+build", "1.2.3-rc.1+build.2", "~master"] {
            let v = Version::parse(s).unwrap();
            let again = Version::parse(&v.to_string()).unwrap();
            assert_eq!(v, again);
        }
    }
}
