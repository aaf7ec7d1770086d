//! Parts command - list a blueprint's body parts

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use creature_anatomy::{GeneratorKind, SpeciesBlueprint};

/// Arguments for the parts command
#[derive(Args)]
pub struct PartsArgs {
    /// Blueprint JSON file
    pub blueprint: PathBuf,
}

/// One listed part
#[derive(Debug, PartialEq)]
pub struct PartRow {
    pub name: String,
    /// Canonical generator name, or the declared one if unknown
    pub generator: String,
    pub known_generator: bool,
    pub chain: String,
    /// Chain bones present in the skeleton; `None` when the chain is undeclared
    pub resolved_bones: Option<usize>,
    pub chain_bones: usize,
}

pub fn execute(args: PartsArgs) -> Result<()> {
    let blueprint = SpeciesBlueprint::load(&args.blueprint)
        .with_context(|| format!("Failed to load blueprint {}", args.blueprint.display()))?;
    let rows = part_rows(&blueprint);

    println!("{} body parts", rows.len());
    println!("  {:<14} {:<10} {:<14} bones", "part", "generator", "chain");
    for row in &rows {
        let generator = if row.known_generator {
            row.generator.clone()
        } else {
            format!("{}?", row.generator)
        };
        let bones = match row.resolved_bones {
            Some(resolved) => format!("{}/{}", resolved, row.chain_bones),
            None => "-".to_string(),
        };
        println!("  {:<14} {:<10} {:<14} {}", row.name, generator, row.chain, bones);
    }
    Ok(())
}

pub fn part_rows(blueprint: &SpeciesBlueprint) -> Vec<PartRow> {
    let chains = blueprint.chain_set();
    let bones = blueprint.bones();
    blueprint
        .body_part_decls()
        .into_iter()
        .map(|decl| {
            let kind = GeneratorKind::from_key(&decl.generator);
            let chain = chains.get(&decl.chain);
            PartRow {
                generator: kind
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| decl.generator.clone()),
                known_generator: kind.is_some(),
                resolved_bones: chain.map(|c| {
                    c.bones
                        .iter()
                        .filter(|name| bones.iter().any(|b| &b.name == *name))
                        .count()
                }),
                chain_bones: chain.map_or(0, |c| c.bones.len()),
                name: decl.name,
                chain: decl.chain,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_part_rows() {
        let blueprint = SpeciesBlueprint::from_json(
            &json!({
                "skeleton": { "bones": [
                    { "name": "a", "parent": "", "position": [0, 0, 0] },
                    { "name": "b", "parent": "a", "position": [0, 0, 1] }
                ]},
                "chains": { "spine": ["a", "gone", "b"] },
                "bodyParts": {
                    "torso": { "generator": "torsoGenerator", "chain": "spine" },
                    "tail": { "generator": "squiggle" }
                }
            })
            .to_string(),
        )
        .unwrap();

        let rows = part_rows(&blueprint);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].generator, "torso");
        assert!(rows[0].known_generator);
        assert_eq!(rows[0].resolved_bones, Some(2));
        assert_eq!(rows[0].chain_bones, 3);

        assert_eq!(rows[1].name, "tail");
        assert_eq!(rows[1].chain, "tail");
        assert!(!rows[1].known_generator);
        assert_eq!(rows[1].resolved_bones, None);
    }
}
