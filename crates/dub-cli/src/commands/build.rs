use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::error::CliResult;
use crate::project::Project;
use crate::sink::TracingSink;

pub fn run(root_dir: &Path, config: Config, upgrade: bool, pre_release: bool, build_type: &str) -> CliResult<()> {
    let sink = TracingSink;
    let mut project = Project::load(root_dir, config)?;

    let resolved = project.resolve(upgrade, pre_release, &sink)?;
    info!(package_count = resolved.packages.len(), "dependencies resolved");

    let packages = project.load_all_packages(&resolved, pre_release, &sink)?;
    let configurations = project.build_config_graph(&packages, &sink)?;
    let settings = project.compose_build(&packages, &configurations, build_type, &sink)?;

    info!(
        target_type = ?settings.target_type,
        source_files = settings.source_files.len(),
        dflags = settings.dflags.len(),
        lflags = settings.lflags.len(),
        "build plan composed"
    );

    Ok(())
}
