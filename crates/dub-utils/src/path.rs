use std::{env, path::PathBuf};

use crate::error::{PathError, PathResult};

/// Resolves a path string that may contain `$VAR`/`${VAR}` environment
/// variables or a leading `~`, returning an absolute path.
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    let path = path.trim();
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let resolved = expand_variables(path)?;
    let path_buf = PathBuf::from(resolved);

    if path_buf.is_absolute() {
        Ok(path_buf)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path_buf))
            .map_err(|source| PathError::FailedToGetCurrentDir { source })
    }
}

/// The user's home directory, from `$HOME`.
pub fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

/// `$XDG_CONFIG_HOME`, defaulting to `$HOME/.config`.
pub fn xdg_config_home() -> PathBuf {
    env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// `$XDG_DATA_HOME`, defaulting to `$HOME/.local/share`.
pub fn xdg_data_home() -> PathBuf {
    env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// `$XDG_CACHE_HOME`, defaulting to `$HOME/.cache`.
pub fn xdg_cache_home() -> PathBuf {
    env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".cache"))
}

/// Default root of dub's multi-tier package cache: `<xdg-data>/dub/packages`.
pub fn default_package_cache_dir() -> PathBuf {
    xdg_data_home().join("dub").join("packages")
}

/// Default dub config file location: `<xdg-config>/dub/config.toml`.
pub fn default_config_path() -> PathBuf {
    xdg_config_home().join("dub").join("config.toml")
}

fn expand_variables(path: &str) -> PathResult<String> {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let var_name = consume_until(&mut chars, '}')?;
                    expand_env_var(&var_name, &mut result, path)?;
                } else {
                    let var_name = consume_var_name(&mut chars);
                    if var_name.is_empty() {
                        result.push('$');
                    } else {
                        expand_env_var(&var_name, &mut result, path)?;
                    }
                }
            }
            '~' if result.is_empty() => result.push_str(&home_dir().to_string_lossy()),
            _ => result.push(c),
        }
    }

    Ok(result)
}

fn consume_until(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    delimiter: char,
) -> PathResult<String> {
    let mut var_name = String::new();
    for c in chars.by_ref() {
        if c == delimiter {
            return Ok(var_name);
        }
        var_name.push(c);
    }
    Err(PathError::UnclosedVariable {
        input: format!("${{{var_name}"),
    })
}

fn consume_var_name(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut var_name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            var_name.push(chars.next().unwrap());
        } else {
            break;
        }
    }
    var_name
}

fn expand_env_var(var_name: &str, result: &mut String, original: &str) -> PathResult<()> {
    match var_name {
        "HOME" => result.push_str(&home_dir().to_string_lossy()),
        "XDG_CONFIG_HOME" => result.push_str(&xdg_config_home().to_string_lossy()),
        "XDG_DATA_HOME" => result.push_str(&xdg_data_home().to_string_lossy()),
        "XDG_CACHE_HOME" => result.push_str(&xdg_cache_home().to_string_lossy()),
        _ => {
            let value = env::var(var_name).map_err(|_| PathError::MissingEnvVar {
                input: original.into(),
                var: var_name.into(),
            })?;
            result.push_str(&value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn resolves_absolute_relative_and_tilde_paths() {
        env::set_var("HOME", "/tmp/home");

        assert!(resolve_path("").is_err());
        assert_eq!(
            resolve_path("/absolute/path").unwrap(),
            PathBuf::from("/absolute/path")
        );

        let expected_relative = env::current_dir().unwrap().join("relative/path");
        assert_eq!(resolve_path("relative/path").unwrap(), expected_relative);

        let home = home_dir();
        assert_eq!(resolve_path("~/path").unwrap(), home.join("path"));

        env::remove_var("HOME");
    }

    #[test]
    #[serial]
    fn expands_env_vars_with_and_without_braces() {
        env::set_var("DUB_TEST_VAR", "value");
        assert_eq!(
            expand_variables("$DUB_TEST_VAR/path").unwrap(),
            "value/path"
        );
        assert_eq!(
            expand_variables("${DUB_TEST_VAR}/path").unwrap(),
            "value/path"
        );
        env::remove_var("DUB_TEST_VAR");
    }

    #[test]
    fn rejects_unclosed_and_missing_variables() {
        assert!(expand_variables("${VAR").is_err());
        assert!(expand_variables("$THIS_DOES_NOT_EXIST").is_err());
    }

    #[test]
    #[serial]
    fn derives_default_cache_and_config_locations() {
        env::set_var("XDG_DATA_HOME", "/tmp/data");
        env::set_var("XDG_CONFIG_HOME", "/tmp/config");
        assert_eq!(
            default_package_cache_dir(),
            PathBuf::from("/tmp/data/dub/packages")
        );
        assert_eq!(
            default_config_path(),
            PathBuf::from("/tmp/config/dub/config.toml")
        );
        env::remove_var("XDG_DATA_HOME");
        env::remove_var("XDG_CONFIG_HOME");
    }
}
