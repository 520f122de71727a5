//! Cache tiers and the directory layout within each.

use std::path::{Path, PathBuf};

use dub_version::Version;

/// One of the four locations at which a package may be cached or
/// locally registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Project-local vendor directory (`.package-cache/` under the project root).
    /// Packages installed here are never auto-removed by the manager.
    Local,
    /// Per-user cache, shared across the user's projects.
    User,
    /// System-wide cache, shared across all users.
    System,
    /// Scratch tier for a single resolution run; cleared between invocations.
    Temporary,
}

impl Tier {
    pub fn all() -> [Tier; 4] {
        [Tier::System, Tier::User, Tier::Local, Tier::Temporary]
    }

    /// Search precedence when a name is ambiguous across tiers: most
    /// specific to the current project first.
    pub fn search_order() -> [Tier; 4] {
        [Tier::Local, Tier::Temporary, Tier::User, Tier::System]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Local => "local",
            Tier::User => "user",
            Tier::System => "system",
            Tier::Temporary => "temporary",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The on-disk roots for every tier, resolved once at manager construction.
#[derive(Debug, Clone)]
pub struct TierRoots {
    pub system: PathBuf,
    pub user: PathBuf,
    pub local: PathBuf,
    pub temporary: PathBuf,
}

impl TierRoots {
    /// Standard roots derived from XDG locations and the project root,
    /// mirroring `dub`'s own system/user/local split.
    pub fn standard(project_root: &Path) -> Self {
        TierRoots {
            system: PathBuf::from("/var/lib/dub"),
            user: dub_utils::path::default_package_cache_dir(),
            local: project_root.join(".package-cache"),
            temporary: std::env::temp_dir().join("dub-tmp"),
        }
    }

    pub fn root_for(&self, tier: Tier) -> &Path {
        match tier {
            Tier::System => &self.system,
            Tier::User => &self.user,
            Tier::Local => &self.local,
            Tier::Temporary => &self.temporary,
        }
    }
}

/// Sanitizes a version for use as a path segment: strips the leading `~`
/// branch marker (if any) and replaces `+` build-metadata separators with
/// `_`.
pub fn sanitize_version(version: &Version) -> String {
    version.to_string().trim_start_matches(dub_version::BRANCH_MARKER).replace('+', "_")
}

/// `<tier>/packages/<name>-<sanitized-ver>`, the container directory for
/// one cached package version. The package's actual content (recipe,
/// sources) lives one level deeper, under [`content_dir`].
pub fn package_dir(root: &Path, name: &str, version: &Version) -> PathBuf {
    root.join("packages").join(format!("{name}-{}", sanitize_version(version)))
}

/// `<tier>/packages/<name>-<sanitized-ver>/<name>`: the package's isolated
/// import root inside its container directory. The extra `<name>` level
/// prevents a `../` entry in a git-style archive layout from writing
/// outside the package's own tree.
pub fn content_dir(root: &Path, name: &str, version: &Version) -> PathBuf {
    package_dir(root, name, version).join(name)
}

pub fn packages_root(root: &Path) -> PathBuf {
    root.join("packages")
}

/// Locates the single content directory nested inside a `<name>-<ver>`
/// container, or `None` if the container is empty or still mid-extraction.
pub fn find_content_dir(container: &Path) -> Option<PathBuf> {
    std::fs::read_dir(container)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| path.is_dir())
}

pub fn local_packages_file(root: &Path) -> PathBuf {
    root.join("local-packages.json")
}

pub fn overrides_file(root: &Path) -> PathBuf {
    root.join("overrides.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_branch_markers_and_build_metadata() {
        let branch = Version::parse("~feature-foo").unwrap();
        assert_eq!(sanitize_version(&branch), "feature-foo");

        let semantic = Version::parse("1.0.0+build.5").unwrap();
        assert_eq!(sanitize_version(&semantic), "1.0.0_build.5");
    }

    #[test]
    fn search_order_prefers_local_first() {
        assert_eq!(Tier::search_order()[0], Tier::Local);
    }
}
