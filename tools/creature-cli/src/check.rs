//! Check command - validate blueprint files without building

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use creature_anatomy::{BehaviorRegistry, SpeciesBlueprint, validate_blueprint};
use walkdir::WalkDir;

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// Blueprint files or directories of `*.json` blueprints
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Outcome for one file
pub struct CheckResult {
    pub path: PathBuf,
    /// Load error or validation issues; empty when the blueprint is clean
    pub problems: Vec<String>,
}

impl CheckResult {
    pub fn ok(&self) -> bool {
        self.problems.is_empty()
    }
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let files = collect_blueprints(&args.paths)?;
    if files.is_empty() {
        anyhow::bail!("No blueprint files found");
    }

    let registry = BehaviorRegistry::default();
    let results: Vec<CheckResult> = files.iter().map(|p| check_file(p, &registry)).collect();

    for result in &results {
        if result.ok() {
            println!("[OK]   {}", result.path.display());
        } else {
            println!("[FAIL] {}", result.path.display());
            for problem in &result.problems {
                println!("         - {}", problem);
            }
        }
    }

    let failed = results.iter().filter(|r| !r.ok()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} blueprints failed validation", failed, results.len());
    }
    println!("All {} blueprints are valid", results.len());
    Ok(())
}

/// Expand directories to their `*.json` files, sorted; files pass through
pub fn collect_blueprints(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(path).follow_links(true) {
                let entry = entry?;
                let is_json = entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
                if entry.file_type().is_file() && is_json {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            files.extend(found);
        } else if path.exists() {
            files.push(path.clone());
        } else {
            anyhow::bail!("Path not found: {}", path.display());
        }
    }
    Ok(files)
}

pub fn check_file(path: &Path, registry: &BehaviorRegistry) -> CheckResult {
    let problems = match SpeciesBlueprint::load(path) {
        Ok(blueprint) => validate_blueprint(&blueprint, &registry.keys())
            .iter()
            .map(ToString::to_string)
            .collect(),
        Err(err) => vec![err.to_string()],
    };
    tracing::debug!("{}: {} problems", path.display(), problems.len());
    CheckResult {
        path: path.to_path_buf(),
        problems,
    }
}
