//! Process-wide settings, built once from defaults, an optional TOML file,
//! environment variables, and explicit CLI overrides (highest precedence
//! last) — never read back out of a module-level global by business logic.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dub_registry::{FallbackSupplier, HttpClientConfig, HttpSupplier, RegistrySupplier};
use dub_utils::StrictnessPolicy;
use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::error::{CliError, CliResult};

const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry base URLs, tried in order (fallback chain).
    pub registries: Vec<String>,
    /// Platforms the default build targets (e.g. `["linux", "posix"]`).
    pub default_platforms: Vec<String>,
    pub default_architectures: Vec<String>,
    pub default_compiler: String,
    pub network_timeout_secs: u64,
    pub unknown_recipe_fields: StrictnessPolicyConfig,
    pub cache_lock_timeout_secs: u64,
}

/// A TOML/serde-friendly mirror of [`StrictnessPolicy`] (kept distinct so
/// dub-utils doesn't need a `Serialize`/`Deserialize` dependency on its own
/// central enum purely for this one config field).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrictnessPolicyConfig {
    Ignore,
    Warn,
    Reject,
}

impl From<StrictnessPolicyConfig> for StrictnessPolicy {
    fn from(value: StrictnessPolicyConfig) -> Self {
        match value {
            StrictnessPolicyConfig::Ignore => StrictnessPolicy::Ignore,
            StrictnessPolicyConfig::Warn => StrictnessPolicy::Warn,
            StrictnessPolicyConfig::Reject => StrictnessPolicy::Reject,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            registries: vec!["https://registry.dub.example.com".to_string()],
            default_platforms: vec!["linux".to_string(), "posix".to_string()],
            default_architectures: vec!["x86_64".to_string()],
            default_compiler: "ldc2".to_string(),
            network_timeout_secs: 15,
            unknown_recipe_fields: StrictnessPolicyConfig::Warn,
            cache_lock_timeout_secs: DEFAULT_LOCK_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Builds the effective configuration: defaults, then an optional TOML
    /// file (explicit `--config` path, else the XDG config-dir default),
    /// then environment variables, then CLI flags — each layer only
    /// overriding the fields it actually sets.
    pub fn load(args: &Args) -> CliResult<Self> {
        let mut config = Config::default();

        let config_path = args.config.clone().unwrap_or_else(dub_utils::path::default_config_path);
        if let Some(file_config) = read_config_file(&config_path)? {
            config = file_config;
        }

        if let Ok(registry) = std::env::var("DUB_REGISTRY") {
            config.registries = registry.split(',').map(|s| s.trim().to_string()).collect();
        }

        Ok(config)
    }

    pub fn strictness_policy(&self) -> StrictnessPolicy {
        self.unknown_recipe_fields.into()
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout_secs)
    }

    pub fn cache_lock_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_lock_timeout_secs)
    }

    /// Builds the fallback chain of HTTP suppliers over `self.registries`,
    /// tried in the configured order.
    pub fn build_registry(&self) -> CliResult<FallbackSupplier> {
        let suppliers: Vec<Box<dyn RegistrySupplier>> = self
            .registries
            .iter()
            .map(|endpoint| {
                let client = HttpClientConfig { user_agent: "dub/0.1".to_string(), timeout: self.network_timeout() };
                HttpSupplier::with_config(endpoint.clone(), client).map(|s| Box::new(s) as Box<dyn RegistrySupplier>)
            })
            .collect::<Result<_, _>>()?;
        Ok(FallbackSupplier::new(suppliers))
    }
}

fn read_config_file(path: &Path) -> CliResult<Option<Config>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(CliError::ConfigUnreadable { path: path.to_path_buf(), source }),
    };
    let config = toml::from_str(&contents)
        .map_err(|source| CliError::ConfigMalformed { path: path.to_path_buf(), source })?;
    Ok(Some(config))
}
