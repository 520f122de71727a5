//! Platform descriptors and build-setting suffix matching.

/// Describes the target the build is being composed for.
#[derive(Debug, Clone)]
pub struct BuildPlatform {
    pub platforms: Vec<String>,
    pub architectures: Vec<String>,
    pub compiler: String,
    pub compiler_binary: String,
    pub frontend_version: u32,
}

impl BuildPlatform {
    pub fn new(platforms: Vec<String>, architectures: Vec<String>, compiler: impl Into<String>) -> Self {
        let compiler = compiler.into();
        BuildPlatform {
            platforms,
            architectures,
            compiler_binary: compiler.clone(),
            compiler,
            frontend_version: 0,
        }
    }

    /// Does `component` name a platform, architecture, or compiler this
    /// descriptor carries?
    fn matches_component(&self, component: &str) -> bool {
        self.platforms.iter().any(|p| p == component)
            || self.architectures.iter().any(|a| a == component)
            || self.compiler == component
    }
}

/// A parsed `-<os>?-<arch>?-<compiler>?` suffix fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSuffix {
    components: Vec<String>,
}

impl PlatformSuffix {
    /// Splits a build-setting key of the shape `<name>[-<suffix>]` into
    /// `(name, suffix)`. Suffix components are whatever hyphen-separated
    /// segments follow the base name; each is later checked for platform
    /// membership rather than positionally typed, since the recipe grammar
    /// doesn't require os/arch/compiler to appear in a fixed slot once split.
    pub fn split_key(key: &str) -> (&str, PlatformSuffix) {
        let mut parts = key.splitn(2, '-');
        let name = parts.next().unwrap_or(key);
        let suffix = parts
            .next()
            .map(|rest| PlatformSuffix {
                components: rest.split('-').map(str::to_string).collect(),
            })
            .unwrap_or_default();
        (name, suffix)
    }

    /// The empty suffix always matches; otherwise every component named in
    /// the suffix must be present in the platform descriptor.
    pub fn matches(&self, platform: &BuildPlatform) -> bool {
        self.components.iter().all(|c| platform.matches_component(c))
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux_dmd() -> BuildPlatform {
        BuildPlatform::new(vec!["linux".into(), "posix".into()], vec!["x86_64".into()], "dmd")
    }

    #[test]
    fn splits_bare_key() {
        let (name, suffix) = PlatformSuffix::split_key("dflags");
        assert_eq!(name, "dflags");
        assert!(suffix.is_empty());
    }

    #[test]
    fn splits_suffixed_key() {
        let (name, suffix) = PlatformSuffix::split_key("dflags-linux-dmd");
        assert_eq!(name, "dflags");
        assert!(!suffix.is_empty());
        assert!(suffix.matches(&linux_dmd()));
    }

    #[test]
    fn empty_suffix_always_matches() {
        let (_, suffix) = PlatformSuffix::split_key("libs");
        assert!(suffix.matches(&linux_dmd()));
    }

    #[test]
    fn suffix_rejects_non_matching_platform() {
        let (_, suffix) = PlatformSuffix::split_key("dflags-windows");
        assert!(!suffix.matches(&linux_dmd()));
    }

    #[test]
    fn suffix_with_arch_and_compiler_all_must_match() {
        let (_, suffix) = PlatformSuffix::split_key("dflags-linux-x86_64-dmd");
        assert!(suffix.matches(&linux_dmd()));

        let (_, suffix) = PlatformSuffix::split_key("dflags-linux-arm64-dmd");
        assert!(!suffix.matches(&linux_dmd()));
    }
}
