//! Blueprint diagnostics
//!
//! Walks a whole blueprint and lists every reference that would not resolve
//! and every option that is out of range. The assembler never depends on
//! this pass; it degrades on its own.

use std::fmt;

use hashbrown::{HashMap, HashSet};
use serde::Serialize;
use serde_json::Value;

use crate::blueprint::{BodyPartDecl, SpeciesBlueprint};
use crate::generators::GeneratorKind;

/// Options that must be non-negative numbers when present
const NON_NEGATIVE_OPTIONS: [&str; 12] = [
    "radius",
    "radiusTop",
    "radiusBottom",
    "baseRadius",
    "midRadius",
    "tipRadius",
    "flatten",
    "yOffset",
    "rumpBulgeDepth",
    "extraMargin",
    "lengthScale",
    "lowPolyWeldTolerance",
];

/// One problem found in a blueprint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    DuplicateBone { bone: String },
    DuplicateChain { chain: String },
    DuplicatePart { part: String },
    DanglingParent { bone: String, parent: String },
    UnknownChainBone { chain: String, bone: String },
    UnknownChain { part: String, chain: String },
    UnknownGenerator { part: String, generator: String },
    NegativeOption { part: String, option: String },
    TooFewSides { part: String, sides: f64 },
    UnknownBehavior { gait: String },
    UnknownIsolatedPart { part: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateBone { bone } => write!(f, "bone '{bone}' is declared more than once"),
            Self::DuplicateChain { chain } => {
                write!(f, "chainsV2 declares chain '{chain}' more than once")
            }
            Self::DuplicatePart { part } => {
                write!(f, "bodyPartsV2 declares body part '{part}' more than once")
            }
            Self::DanglingParent { bone, parent } => {
                write!(f, "bone '{bone}' has unknown parent '{parent}'")
            }
            Self::UnknownChainBone { chain, bone } => {
                write!(f, "chain '{chain}' references unknown bone '{bone}'")
            }
            Self::UnknownChain { part, chain } => {
                write!(f, "body part '{part}' chain '{chain}' not found")
            }
            Self::UnknownGenerator { part, generator } => {
                write!(f, "body part '{part}' uses unknown generator '{generator}'")
            }
            Self::NegativeOption { part, option } => {
                write!(f, "body part '{part}' option '{option}' must be a non-negative number")
            }
            Self::TooFewSides { part, sides } => {
                write!(f, "body part '{part}' option 'sides' = {sides} must be >= 3")
            }
            Self::UnknownBehavior { gait } => {
                write!(f, "behavior gait '{gait}' is not in the behavior registry")
            }
            Self::UnknownIsolatedPart { part } => {
                write!(f, "debug.isolatePart references unknown body part '{part}'")
            }
        }
    }
}

/// Every issue in `blueprint`, in document order
///
/// `known_behaviors` is the list of registry keys a gait may name.
pub fn validate_blueprint(
    blueprint: &SpeciesBlueprint,
    known_behaviors: &[&str],
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let bones = blueprint.bones();

    let seen = name_counts(bones.iter().map(|b| b.name.as_str()));
    for bone in repeated(bones.iter().map(|b| b.name.as_str())) {
        issues.push(ValidationIssue::DuplicateBone { bone });
    }
    for bone in &bones {
        if let Some(parent) = bone.parent.as_deref().filter(|p| !p.is_empty()) {
            if !seen.contains_key(parent) {
                issues.push(ValidationIssue::DanglingParent {
                    bone: bone.name.clone(),
                    parent: parent.to_string(),
                });
            }
        }
    }

    for chain in repeated(blueprint.chains_v2.iter().map(|c| c.name.as_str())) {
        issues.push(ValidationIssue::DuplicateChain { chain });
    }
    let chains = blueprint.chain_set();
    for chain in chains.iter() {
        for bone in &chain.bones {
            if !seen.contains_key(bone.as_str()) {
                issues.push(ValidationIssue::UnknownChainBone {
                    chain: chain.name.clone(),
                    bone: bone.clone(),
                });
            }
        }
    }

    for part in repeated(blueprint.body_parts_v2.iter().map(|p| p.name.as_str())) {
        issues.push(ValidationIssue::DuplicatePart { part });
    }
    let parts = blueprint.body_part_decls();
    for part in &parts {
        if !chains.contains(&part.chain) {
            issues.push(ValidationIssue::UnknownChain {
                part: part.name.clone(),
                chain: part.chain.clone(),
            });
        }
        if GeneratorKind::from_key(&part.generator).is_none() {
            issues.push(ValidationIssue::UnknownGenerator {
                part: part.name.clone(),
                generator: part.generator.clone(),
            });
        }
        check_options(part, &mut issues);
    }

    let gait = blueprint.behavior_key();
    if !known_behaviors.contains(&gait) {
        issues.push(ValidationIssue::UnknownBehavior {
            gait: gait.to_string(),
        });
    }

    if let Some(isolate) = blueprint.debug.isolate_part.as_deref() {
        if !parts.iter().any(|p| p.name == isolate) {
            issues.push(ValidationIssue::UnknownIsolatedPart {
                part: isolate.to_string(),
            });
        }
    }

    issues
}

fn name_counts<'a>(names: impl Iterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }
    counts
}

/// Names that appear more than once, each reported once at its first position
fn repeated<'a>(names: impl Iterator<Item = &'a str> + Clone) -> Vec<String> {
    let counts = name_counts(names.clone());
    let mut reported = HashSet::new();
    names
        .filter(|name| counts[name] > 1 && reported.insert(*name))
        .map(str::to_string)
        .collect()
}

fn check_options(part: &BodyPartDecl, issues: &mut Vec<ValidationIssue>) {
    let Value::Object(options) = &part.options else {
        return;
    };
    let negative = |option: String| ValidationIssue::NegativeOption {
        part: part.name.clone(),
        option,
    };

    if let Some(Value::Array(radii)) = options.get("radii") {
        for (i, value) in radii.iter().enumerate() {
            if !value.as_f64().is_some_and(|v| v >= 0.0) {
                issues.push(negative(format!("radii[{i}]")));
            }
        }
    }
    for name in NON_NEGATIVE_OPTIONS {
        if let Some(value) = options.get(name) {
            if !value.as_f64().is_some_and(|v| v >= 0.0) {
                issues.push(negative(name.to_string()));
            }
        }
    }
    if let Some(value) = options.get("sides") {
        match value.as_f64() {
            Some(sides) if sides >= 3.0 => {}
            sides => issues.push(ValidationIssue::TooFewSides {
                part: part.name.clone(),
                sides: sides.unwrap_or(f64::NAN),
            }),
        }
    }
}
