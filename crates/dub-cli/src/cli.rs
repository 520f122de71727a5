use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all but error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit structured JSON log lines instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    /// Override the config file location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve dependencies, compose the build plan, and report it
    Build {
        /// Re-resolve ignoring the current selections pins
        #[arg(long)]
        upgrade: bool,

        /// Allow pre-release candidates during resolution
        #[arg(long)]
        pre_release: bool,

        /// Build type overlay to apply (debug, release, ...)
        #[arg(long, default_value = "debug")]
        build_type: String,
    },

    /// Fetch one package into the cache without touching the project's dependency graph
    Fetch {
        /// Package name
        name: String,
        /// Version constraint (defaults to the newest available)
        constraint: Option<String>,
    },

    /// Re-resolve every dependency to its newest matching version
    Upgrade {
        /// Persist the new resolution into dub.selections.json
        #[arg(long)]
        select: bool,

        /// Report available upgrades without writing any changes
        #[arg(long)]
        print_upgrades_only: bool,
    },

    /// Print a structured description of the root package at its resolved configuration
    Describe,
}
