//! Build command - blueprint to mesh file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use creature_anatomy::{
    BodyPartDecl, BuildReport, CreatureAssembler, CreatureMesh, SpeciesBlueprint, write_obj,
    write_skinned_json,
};
use serde_json::Value;

use crate::config::{BuildConfig, OutputFormat};

/// Arguments for the build command
#[derive(Args)]
pub struct BuildArgs {
    /// Blueprint JSON file
    pub blueprint: PathBuf,

    /// Output file (defaults to the blueprint path with the format's extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (overrides the config file)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Only build the named body part (repeatable)
    #[arg(long)]
    pub isolate: Vec<String>,
}

pub fn execute(args: BuildArgs, config: &BuildConfig) -> Result<()> {
    let mut blueprint = SpeciesBlueprint::load(&args.blueprint)
        .with_context(|| format!("Failed to load blueprint {}", args.blueprint.display()))?;
    if let Some(sides) = config.sides {
        apply_default_sides(&mut blueprint, sides);
    }

    let assembler = CreatureAssembler::new().with_isolate(args.isolate.iter().cloned());
    let creature = assembler
        .build_blueprint(&blueprint)
        .with_context(|| format!("Failed to build {}", args.blueprint.display()))?;

    let name = display_name(&blueprint, &args.blueprint);
    print_report(&name, &creature.mesh, &creature.report);

    let format = args.format.unwrap_or(config.format);
    let output = args
        .output
        .unwrap_or_else(|| default_output(&args.blueprint, format));

    let mut mesh = creature.mesh;
    if !config.export_normals {
        mesh.geometry.normals.clear();
    }
    if !config.export_uvs {
        mesh.geometry.uvs.clear();
    }

    match format {
        OutputFormat::Obj => write_obj(&mesh, &output, &name),
        OutputFormat::Json => write_skinned_json(&mesh, &output),
    }
    .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Wrote {}", output.display());
    Ok(())
}

/// Give every part without an explicit `sides` option the configured count
///
/// Rewritten parts go to `bodyPartsV2`, which overrides same-named parts.
pub fn apply_default_sides(blueprint: &mut SpeciesBlueprint, sides: u32) {
    let overridden: Vec<BodyPartDecl> = blueprint
        .body_part_decls()
        .into_iter()
        .filter_map(|mut decl| {
            if decl.options.is_null() {
                decl.options = Value::Object(Default::default());
            }
            // Malformed options are reported by the assembler as-is
            let Value::Object(map) = &mut decl.options else {
                return None;
            };
            if map.contains_key("sides") {
                return None;
            }
            map.insert("sides".into(), sides.into());
            Some(decl)
        })
        .collect();

    for decl in overridden {
        match blueprint
            .body_parts_v2
            .iter_mut()
            .find(|p| p.name == decl.name)
        {
            Some(existing) => *existing = decl,
            None => blueprint.body_parts_v2.push(decl),
        }
    }
}

fn display_name(blueprint: &SpeciesBlueprint, path: &Path) -> String {
    if !blueprint.meta.name.is_empty() {
        return blueprint.meta.name.clone();
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "creature".to_string())
}

fn default_output(blueprint: &Path, format: OutputFormat) -> PathBuf {
    blueprint.with_extension(format.extension())
}

fn print_report(name: &str, mesh: &CreatureMesh, report: &BuildReport) {
    println!(
        "{}: {} parts, {} vertices, {} triangles, {} joints",
        name,
        report.parts.len(),
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.joint_count()
    );
    for part in &report.parts {
        let marker = if part.placeholder { " (placeholder)" } else { "" };
        println!(
            "  {:<14} {:<6} {:<14} {:>6} vertices{}",
            part.name, part.generator, part.chain, part.vertex_count, marker
        );
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
}
