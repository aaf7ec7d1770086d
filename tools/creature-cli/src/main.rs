//! creature - build, validate and inspect creature blueprints
//!
//! # Commands
//!
//! - `creature build <blueprint.json>` - Build the creature mesh and write OBJ or JSON
//! - `creature check <paths...>` - Validate blueprint files or directories
//! - `creature parts <blueprint.json>` - List body parts and their chains
//!
//! # Config (creature.toml)
//!
//! ```toml
//! [build]
//! format = "obj"          # or "json"
//! sides = 12              # for parts that do not set `sides`
//! export_normals = true
//! export_uvs = true
//!
//! [log]
//! filter = "creature_anatomy=debug"
//! ```

mod build;
mod check;
mod config;
mod parts;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "creature")]
#[command(about = "Procedural creature mesh tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./creature.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a creature mesh from a blueprint
    Build(build::BuildArgs),

    /// Validate blueprints without building
    Check(check::CheckArgs),

    /// List a blueprint's body parts
    Parts(parts::PartsArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;
    init_logging(cli.verbose, config.log.filter.as_deref());

    match cli.command {
        Commands::Build(args) => build::execute(args, &config.build),
        Commands::Check(args) => check::execute(args),
        Commands::Parts(args) => parts::execute(args),
    }
}

fn init_logging(verbose: bool, extra: Option<&str>) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in extra.into_iter().flat_map(|f| f.split(',')) {
        let directive = directive.trim();
        if directive.is_empty() {
            continue;
        }
        match directive.parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(err) => eprintln!("Ignoring log filter '{}': {}", directive, err),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
