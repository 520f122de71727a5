//! `dub upgrade`: re-resolves every dependency to its newest matching
//! version, optionally without persisting the result.

use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::error::CliResult;
use crate::project::Project;
use crate::sink::TracingSink;

pub fn run(root_dir: &Path, config: Config, select: bool, print_upgrades_only: bool) -> CliResult<()> {
    let sink = TracingSink;
    let mut project = Project::load(root_dir, config)?;

    let previous: Vec<(String, String)> = project
        .root
        .all_dependencies()
        .into_iter()
        .filter_map(|dep| {
            let name = dep.name.split(':').next().unwrap_or(&dep.name).to_string();
            project.selections.get(&name).ok().map(|pin| (name, format!("{pin:?}")))
        })
        .collect();

    let resolved = project.resolve_without_persisting(true, false, &sink)?;

    for (name, resolved_pin) in &resolved.packages {
        let was = previous.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str()).unwrap_or("(none)");
        info!(package = name, from = was, to = ?resolved_pin, "upgrade candidate");
    }

    if print_upgrades_only || !select {
        return Ok(());
    }

    project.persist_selections(&resolved)?;
    Ok(())
}
