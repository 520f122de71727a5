//! An HTTP-backed [`RegistrySupplier`], modeled as a registry index served
//! under a base URL: `{base}/api/packages/{name}/info`,
//! `{base}/api/packages/{name}/{version}.zip`, `{base}/api/packages/search?q=`.

use std::{path::PathBuf, time::Duration};

use dub_recipe::Recipe;
use dub_version::{Constraint, Version};
use serde::Deserialize;
use ureq::Agent;

use crate::{
    error::{RegistryError, RegistryResult},
    supplier::{PackageSummary, RegistrySupplier},
};

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "dub/0.1".into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl HttpClientConfig {
    fn build(&self) -> Agent {
        ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .user_agent(self.user_agent.clone())
            .build()
            .into()
    }
}

#[derive(Deserialize)]
struct VersionInfo {
    version: String,
}

#[derive(Deserialize)]
struct PackageInfo {
    versions: Vec<VersionInfo>,
}

#[derive(Deserialize)]
struct SearchHit {
    name: String,
    version: String,
    #[serde(default)]
    description: String,
}

/// Fetches package metadata and archives from a single HTTP registry endpoint.
pub struct HttpSupplier {
    base_url: String,
    agent: Agent,
}

impl HttpSupplier {
    pub fn new(base_url: impl Into<String>) -> RegistryResult<Self> {
        Self::with_config(base_url, HttpClientConfig::default())
    }

    pub fn with_config(base_url: impl Into<String>, config: HttpClientConfig) -> RegistryResult<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url).map_err(|_| RegistryError::InvalidUrl(base_url.clone()))?;
        Ok(Self { base_url, agent: config.build() })
    }

    fn pick_version(&self, name: &str, constraint: &Constraint, allow_prerelease: bool) -> RegistryResult<Version> {
        let mut versions = self.list_versions(name)?;
        versions.retain(|v| constraint.matches(v) && (allow_prerelease || !v.is_prerelease()));
        versions
            .into_iter()
            .max_by(|a, b| a.compare(b).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }
}

impl RegistrySupplier for HttpSupplier {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    fn list_versions(&self, name: &str) -> RegistryResult<Vec<Version>> {
        let url = format!("{}/api/packages/{name}/info", self.base_url);
        let info: PackageInfo = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| RegistryError::SupplierUnavailable {
                endpoint: self.base_url.clone(),
                reason: err.to_string(),
            })?
            .body_mut()
            .read_json()
            .map_err(|err| RegistryError::MalformedResponse(err.to_string()))?;

        info.versions
            .into_iter()
            .map(|entry| Version::parse(&entry.version).map_err(RegistryError::from))
            .collect()
    }

    fn fetch_recipe(&self, name: &str, constraint: &Constraint, allow_prerelease: bool) -> RegistryResult<Recipe> {
        let version = self.pick_version(name, constraint, allow_prerelease)?;
        let url = format!("{}/api/packages/{name}/{version}/dub.json", self.base_url);
        let mut response = self.agent.get(&url).call().map_err(|err| RegistryError::SupplierUnavailable {
            endpoint: self.base_url.clone(),
            reason: err.to_string(),
        })?;
        let mut body = String::new();
        std::io::Read::read_to_string(&mut response.body_mut().as_reader(), &mut body)
            .map_err(|err| RegistryError::MalformedResponse(err.to_string()))?;

        dub_recipe::parse_json(&body, dub_utils::StrictnessPolicy::Warn).map_err(RegistryError::from)
    }

    fn fetch_archive(&self, name: &str, constraint: &Constraint, allow_prerelease: bool) -> RegistryResult<PathBuf> {
        let version = self.pick_version(name, constraint, allow_prerelease)?;
        let url = format!("{}/api/packages/{name}/{version}.zip", self.base_url);
        let mut response = self.agent.get(&url).call().map_err(|err| RegistryError::SupplierUnavailable {
            endpoint: self.base_url.clone(),
            reason: err.to_string(),
        })?;

        let dest = std::env::temp_dir().join(format!("dub-{name}-{version}.zip"));
        let mut file = std::fs::File::create(&dest)
            .map_err(|err| RegistryError::MalformedResponse(format!("cannot create {}: {err}", dest.display())))?;
        let mut reader = response.body_mut().as_reader();
        std::io::copy(&mut reader, &mut file).map_err(|err| RegistryError::MalformedResponse(err.to_string()))?;
        Ok(dest)
    }

    fn search(&self, query: &str) -> RegistryResult<Vec<PackageSummary>> {
        let url = format!("{}/api/packages/search?q={}", self.base_url, urlencode(query));
        let hits: Vec<SearchHit> = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| RegistryError::SupplierUnavailable {
                endpoint: self.base_url.clone(),
                reason: err.to_string(),
            })?
            .body_mut()
            .read_json()
            .map_err(|err| RegistryError::MalformedResponse(err.to_string()))?;

        Ok(hits
            .into_iter()
            .map(|hit| PackageSummary { name: hit.name, version: hit.version, description: hit.description })
            .collect())
    }
}

fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base_url() {
        assert!(HttpSupplier::new("not a url").is_err());
    }

    #[test]
    fn urlencodes_reserved_characters() {
        assert_eq!(urlencode("a b/c"), "a%20b%2Fc");
        assert_eq!(urlencode("simple-name_1.0~x"), "simple-name_1.0~x");
    }
}
