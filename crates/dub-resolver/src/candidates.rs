//! Per-package candidate version enumeration.

use dub_version::Version;

/// Builds the ordered candidate list for one package name, per the
/// resolver's candidate-enumeration rule: a selections pin short-circuits
/// everything else unless `upgrade` is set; otherwise the union of local
/// and registry versions is deduplicated, sorted descending, and (unless
/// `allow_prerelease`) has its pre-release versions pushed to the tail so
/// they're only tried once every stable candidate is exhausted.
pub fn enumerate(
    pinned: Option<&Version>,
    upgrade: bool,
    local_versions: &[Version],
    registry_versions: &[Version],
    allow_prerelease: bool,
) -> Vec<Version> {
    if !upgrade {
        if let Some(pin) = pinned {
            return vec![pin.clone()];
        }
    }

    let mut merged: Vec<Version> = Vec::new();
    for version in local_versions.iter().chain(registry_versions.iter()) {
        if !merged.iter().any(|v| v.compare(version).is_ok_and(|o| o == std::cmp::Ordering::Equal)) {
            merged.push(version.clone());
        }
    }

    merged.sort_by(|a, b| b.compare(a).unwrap_or(std::cmp::Ordering::Equal));

    if !allow_prerelease {
        let (stable, prerelease): (Vec<_>, Vec<_>) = merged.into_iter().partition(|v| !v.is_prerelease());
        merged = stable;
        merged.extend(prerelease);
    }

    merged
}

/// Returns the first registry supplier's non-empty version list, trying
/// each in order (a supplier error is treated as "contributed nothing").
pub fn first_nonempty<E>(suppliers: impl IntoIterator<Item = Result<Vec<Version>, E>>) -> Vec<Version> {
    for result in suppliers {
        if let Ok(versions) = result {
            if !versions.is_empty() {
                return versions;
            }
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn pin_short_circuits_without_upgrade() {
        let pin = v("1.0.0");
        let result = enumerate(Some(&pin), false, &[v("2.0.0")], &[v("3.0.0")], true);
        assert_eq!(result, vec![pin]);
    }

    #[test]
    fn upgrade_ignores_pin() {
        let pin = v("1.0.0");
        let result = enumerate(Some(&pin), true, &[v("2.0.0")], &[], true);
        assert_eq!(result, vec![v("2.0.0")]);
    }

    #[test]
    fn deduplicates_and_sorts_descending() {
        let result = enumerate(None, false, &[v("1.0.0"), v("2.0.0")], &[v("2.0.0"), v("1.5.0")], true);
        assert_eq!(result, vec![v("2.0.0"), v("1.5.0"), v("1.0.0")]);
    }

    #[test]
    fn prereleases_move_to_tail_unless_allowed() {
        let result = enumerate(None, false, &[v("2.0.0-beta.1"), v("1.0.0")], &[], false);
        assert_eq!(result, vec![v("1.0.0"), v("2.0.0-beta.1")]);
    }

    #[test]
    fn prereleases_stay_in_sorted_position_when_allowed() {
        let result = enumerate(None, false, &[v("2.0.0-beta.1"), v("1.0.0")], &[], true);
        assert_eq!(result, vec![v("2.0.0-beta.1"), v("1.0.0")]);
    }

    #[test]
    fn first_nonempty_skips_failing_and_empty_suppliers() {
        let suppliers: Vec<Result<Vec<Version>, String>> =
            vec![Err("down".to_string()), Ok(vec![]), Ok(vec![v("1.0.0")]), Ok(vec![v("9.9.9")])];
        assert_eq!(first_nonempty(suppliers), vec![v("1.0.0")]);
    }
}
