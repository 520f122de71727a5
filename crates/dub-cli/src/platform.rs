//! Builds the effective [`BuildPlatform`] for a command invocation and
//! matches a recipe configuration's platform filter against it.

use dub_recipe::BuildPlatform;

use crate::config::Config;

pub fn build_platform(config: &Config) -> BuildPlatform {
    BuildPlatform::new(
        config.default_platforms.clone(),
        config.default_architectures.clone(),
        config.default_compiler.clone(),
    )
}

/// A configuration with an empty `platforms` list applies unconditionally.
/// Otherwise it applies if any listed filter names a platform, architecture,
/// or compiler the target [`BuildPlatform`] carries.
pub fn configuration_matches(filters: &[String], platform: &BuildPlatform) -> bool {
    filters.is_empty()
        || filters.iter().any(|filter| {
            platform.platforms.iter().any(|p| p == filter)
                || platform.architectures.iter().any(|a| a == filter)
                || platform.compiler == *filter
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform() -> BuildPlatform {
        BuildPlatform::new(vec!["linux".into(), "posix".into()], vec!["x86_64".into()], "ldc2")
    }

    #[test]
    fn empty_filter_always_matches() {
        assert!(configuration_matches(&[], &platform()));
    }

    #[test]
    fn matches_platform_architecture_or_compiler_name() {
        assert!(configuration_matches(&["linux".to_string()], &platform()));
        assert!(configuration_matches(&["x86_64".to_string()], &platform()));
        assert!(configuration_matches(&["ldc2".to_string()], &platform()));
    }

    #[test]
    fn rejects_unrelated_filter() {
        assert!(!configuration_matches(&["windows".to_string()], &platform()));
    }
}
