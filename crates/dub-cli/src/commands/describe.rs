//! `dub describe`: reports the root package's resolved configuration
//! without driving a full resolution (uses whatever is already pinned).

use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::error::CliResult;
use crate::platform::build_platform;
use crate::project::Project;
use crate::sink::TracingSink;

pub fn run(root_dir: &Path, config: Config) -> CliResult<()> {
    let sink = TracingSink;
    let mut project = Project::load(root_dir, config)?;

    let resolved = project.resolve(false, false, &sink)?;
    let packages = project.load_all_packages(&resolved, false, &sink)?;
    let configurations = project.build_config_graph(&packages, &sink)?;

    let platform = build_platform(&project.config);
    let root_name = project.root.recipe.name.clone();
    let root_config = configurations.get(&root_name).cloned().unwrap_or_else(|| "library".to_string());
    let description = project.root.describe(&platform, &root_config)?;

    info!(
        name = %description.name,
        version = %description.version,
        configuration = %description.configuration,
        target_type = ?description.target_type,
        dependency_count = description.dependencies.len(),
        source_file_count = description.source_files.len(),
        "package description"
    );

    Ok(())
}
