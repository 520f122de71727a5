use std::env;

use clap::Parser;
use cli::{Args, Commands};
use config::Config;
use dub_utils::{IoOperation, IoResultExt};
use error::CliResult;
use logging::setup_logging;
use tracing::error;

mod build_source;
mod cli;
mod commands;
mod confgraph_source;
mod config;
mod error;
mod logging;
mod platform;
mod project;
mod provider;
mod sink;

async fn handle_cli(args: Args) -> CliResult<()> {
    let config = Config::load(&args)?;
    let root_dir = match &args.root {
        Some(root) => root.clone(),
        None => env::current_dir().with_path(".", IoOperation::ReadFile)?,
    };

    match args.command {
        Commands::Build { upgrade, pre_release, build_type } => {
            commands::build::run(&root_dir, config, upgrade, pre_release, &build_type)?;
        }
        Commands::Fetch { name, constraint } => {
            commands::fetch::run(&root_dir, config, &name, constraint.as_deref())?;
        }
        Commands::Upgrade { select, print_upgrades_only } => {
            commands::upgrade::run(&root_dir, config, select, print_upgrades_only)?;
        }
        Commands::Describe => {
            commands::describe::run(&root_dir, config)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logging(&args);

    if let Err(err) = handle_cli(args).await {
        let code = err.exit_code();
        error!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
