//! Target-type invariants enforced across the whole composed build.

use dub_recipe::TargetType;

use crate::error::{BuildError, BuildResult};

/// Enforces that the root's target is buildable and that at most one
/// package in the resolved set produces an executable.
pub fn validate_target_types(root_target: TargetType, package_targets: &[(String, TargetType)]) -> BuildResult<()> {
    if matches!(root_target, TargetType::None | TargetType::SourceLibrary) {
        return Err(BuildError::InvalidRootTargetType);
    }

    let executables: Vec<String> = package_targets
        .iter()
        .filter(|(_, t)| *t == TargetType::Executable)
        .map(|(name, _)| name.clone())
        .collect();

    if executables.len() > 1 {
        return Err(BuildError::MultipleExecutables(executables));
    }

    Ok(())
}
