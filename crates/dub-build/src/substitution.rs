//! `$NAME` / `${NAME}` / `$$` variable substitution in build-setting
//! string values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Variable values available to one package's substitution pass.
pub struct VariableContext<'a> {
    pub package_dir: &'a Path,
    pub root_package_dir: &'a Path,
    /// `<PKGNAME>_PACKAGE_DIR` entries, keyed by the package's own name
    /// (case as declared; matched case-insensitively against the
    /// upper-cased, `-`-to-`_` variable name).
    pub package_dirs_by_name: &'a BTreeMap<String, PathBuf>,
    pub arch: &'a str,
    pub platform: &'a str,
    pub platform_posix: &'a str,
    pub build_type: &'a str,
    pub dflags: &'a str,
    pub lflags: &'a str,
}

impl<'a> VariableContext<'a> {
    fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "PACKAGE_DIR" => Some(self.package_dir.display().to_string()),
            "ROOT_PACKAGE_DIR" => Some(self.root_package_dir.display().to_string()),
            "ARCH" => Some(self.arch.to_string()),
            "PLATFORM" => Some(self.platform.to_string()),
            "PLATFORM_POSIX" => Some(self.platform_posix.to_string()),
            "BUILD_TYPE" => Some(self.build_type.to_string()),
            "DFLAGS" => Some(self.dflags.to_string()),
            "LFLAGS" => Some(self.lflags.to_string()),
            _ => {
                if let Some(suffix) = name.strip_suffix("_PACKAGE_DIR") {
                    let wanted = suffix.to_ascii_lowercase().replace('_', "-");
                    return self
                        .package_dirs_by_name
                        .iter()
                        .find(|(pkg, _)| pkg.to_ascii_lowercase() == wanted)
                        .map(|(_, dir)| dir.display().to_string());
                }
                std::env::var(name).ok()
            }
        }
    }
}

/// Expands every `$NAME`, `${NAME}`, and `$$` occurrence in `value`.
/// Unrecognized and unset variables expand to the empty string, matching
/// the reference tool's permissive behavior for optional environment
/// overrides.
pub fn substitute(value: &str, vars: &VariableContext) -> String {
    let mut out = String::with_capacity(value.len());
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'$' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'$' {
                i += 1;
            }
            out.push_str(&value[start..i]);
            continue;
        }

        if i + 1 < bytes.len() && bytes[i + 1] == b'$' {
            out.push('$');
            i += 2;
            continue;
        }

        if i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            if let Some(end) = value[i + 2..].find('}') {
                let name = &value[i + 2..i + 2 + end];
                out.push_str(&vars.lookup(name).unwrap_or_default());
                i = i + 2 + end + 1;
                continue;
            }
        }

        if i + 1 < bytes.len() && (bytes[i + 1].is_ascii_alphabetic() || bytes[i + 1] == b'_') {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
                end += 1;
            }
            let name = &value[start..end];
            out.push_str(&vars.lookup(name).unwrap_or_default());
            i = end;
            continue;
        }

        // Lone `$` with nothing recognizable following it: keep literally.
        out.push('$');
        i += 1;
    }
    out
}

/// Substitutes every string in `values` in place, anchoring any resulting
/// relative path to `vars.package_dir` when `anchor_paths` is set.
pub fn substitute_all(values: &[String], vars: &VariableContext, anchor_paths: bool) -> Vec<String> {
    values
        .iter()
        .map(|v| {
            let expanded = substitute(v, vars);
            if anchor_paths && !Path::new(&expanded).is_absolute() {
                vars.package_dir.join(&expanded).display().to_string()
            } else {
                expanded
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(package_dir: &'a Path, root_dir: &'a Path, names: &'a BTreeMap<String, PathBuf>) -> VariableContext<'a> {
        VariableContext {
            package_dir,
            root_package_dir: root_dir,
            package_dirs_by_name: names,
            arch: "x86_64",
            platform: "linux",
            platform_posix: "posix",
            build_type: "debug",
            dflags: "-g",
            lflags: "",
        }
    }

    #[test]
    fn expands_bare_and_braced_forms() {
        let names = BTreeMap::new();
        let pkg = PathBuf::from("/pkg");
        let root = PathBuf::from("/root");
        let vars = context(&pkg, &root, &names);
        assert_eq!(substitute("$PLATFORM-${ARCH}", &vars), "linux-x86_64");
    }

    #[test]
    fn doubled_dollar_is_literal() {
        let names = BTreeMap::new();
        let pkg = PathBuf::from("/pkg");
        let root = PathBuf::from("/root");
        let vars = context(&pkg, &root, &names);
        assert_eq!(substitute("price: $$5", &vars), "price: $5");
    }

    #[test]
    fn resolves_named_package_dir_variables() {
        let mut names = BTreeMap::new();
        names.insert("my-lib".to_string(), PathBuf::from("/cache/my-lib-1.0.0"));
        let pkg = PathBuf::from("/pkg");
        let root = PathBuf::from("/root");
        let vars = context(&pkg, &root, &names);
        assert_eq!(substitute("$MY_LIB_PACKAGE_DIR/source", &vars), "/cache/my-lib-1.0.0/source");
    }

    #[test]
    fn unknown_variable_expands_to_empty() {
        let names = BTreeMap::new();
        let pkg = PathBuf::from("/pkg");
        let root = PathBuf::from("/root");
        let vars = context(&pkg, &root, &names);
        assert_eq!(substitute("[$NOT_A_REAL_VAR]", &vars), "[]");
    }

    #[test]
    fn relative_paths_anchor_to_package_dir() {
        let names = BTreeMap::new();
        let pkg = PathBuf::from("/pkg");
        let root = PathBuf::from("/root");
        let vars = context(&pkg, &root, &names);
        let result = substitute_all(&["source/foo.d".to_string()], &vars, true);
        assert_eq!(result, vec!["/pkg/source/foo.d".to_string()]);
    }
}
