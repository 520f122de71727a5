//! Built-in build-type flag overlays (`debug`, `release`, `unittest`, …),
//! applied last on top of a composed [`dub_recipe::BuildSettings`] unless
//! the recipe opted out with `noDefaultFlags`.

use crate::error::{BuildError, BuildResult};
use dub_recipe::BuildSettings;

/// Looks up the built-in dflags for a named build type.
pub fn overlay_flags(build_type: &str) -> BuildResult<&'static [&'static str]> {
    match build_type {
        "debug" => Ok(&["-debug", "-g"]),
        "release" => Ok(&["-release", "-O", "-inline", "-boundscheck=off"]),
        "release-debug" => Ok(&["-release", "-O", "-inline", "-g"]),
        "release-nobounds" => Ok(&["-release", "-O", "-inline", "-boundscheck=off"]),
        "unittest" => Ok(&["-unittest", "-g"]),
        "profile" => Ok(&["-profile", "-release", "-g", "-inline"]),
        "docs" | "ddox" => Ok(&["-c", "-o-"]),
        "cov" | "unittest-cov" => Ok(&["-cov"]),
        "plain" => Ok(&[]),
        other => Err(BuildError::UnknownBuildType(other.to_string())),
    }
}

/// Applies the build-type overlay to `settings` in place, unless the
/// recipe requested `noDefaultFlags`.
pub fn apply_overlay(settings: &mut BuildSettings, build_type: &str) -> BuildResult<()> {
    if settings.no_default_flags {
        return Ok(());
    }
    let flags = overlay_flags(build_type)?;
    settings.dflags.extend(flags.iter().map(|f| f.to_string()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_overlay_appends_debug_flags() {
        let mut settings = BuildSettings::default();
        apply_overlay(&mut settings, "debug").unwrap();
        assert!(settings.dflags.contains(&"-debug".to_string()));
    }

    #[test]
    fn no_default_flags_suppresses_the_overlay() {
        let mut settings = BuildSettings { no_default_flags: true, ..Default::default() };
        apply_overlay(&mut settings, "release").unwrap();
        assert!(settings.dflags.is_empty());
    }

    #[test]
    fn unknown_build_type_is_rejected() {
        let mut settings = BuildSettings::default();
        assert!(apply_overlay(&mut settings, "nonexistent").is_err());
    }
}
