//! `dub fetch`: pulls one package into the cache directly, independent of
//! any project's dependency graph.

use std::cmp::Ordering;
use std::path::Path;

use dub_manager::{PackageManager, Tier};
use dub_registry::RegistrySupplier;
use dub_version::Constraint;
use tracing::info;

use crate::config::Config;
use crate::error::CliResult;
use crate::sink::{DiagnosticEvent, Sink, TracingSink};

pub fn run(root_dir: &Path, config: Config, name: &str, constraint: Option<&str>) -> CliResult<()> {
    let sink = TracingSink;
    let constraint = match constraint {
        Some(c) => Constraint::parse(c)?,
        None => Constraint::unbounded(),
    };

    let mut manager = PackageManager::new(root_dir)?;
    let registry = config.build_registry()?;

    let versions = registry.list_versions(name)?;
    let mut matching: Vec<_> = versions.into_iter().filter(|v| constraint.matches(v)).collect();
    matching.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));
    let version = matching.into_iter().next_back().ok_or_else(|| dub_registry::RegistryError::NotFound(name.to_string()))?;

    if manager.get_package(name, &version, None).is_some() {
        info!(package = name, %version, "already cached, nothing to fetch");
        return Ok(());
    }

    sink.emit(DiagnosticEvent::FetchStarted { name: name.to_string(), version: version.clone() });
    let zip_path = registry.fetch_archive(name, &constraint, false)?;
    manager.store_fetched_package(Tier::User, name, &version, &zip_path)?;
    sink.emit(DiagnosticEvent::FetchCompleted { name: name.to_string(), version: version.clone() });

    info!(package = name, %version, "fetched");
    Ok(())
}
