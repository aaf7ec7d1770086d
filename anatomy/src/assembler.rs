//! Creature assembly
//!
//! Skeleton → per-part chain resolution → generator → merge → skin-bound
//! mesh. A build only fails when the skeleton itself is malformed; every
//! other problem becomes a [`BuildWarning`] and the build carries on.

use std::fmt;

use glam::Mat4;
use hashbrown::HashSet;
use serde::Serialize;

use crate::behavior::{BehaviorController, BehaviorRegistry, NO_BEHAVIOR};
use crate::blueprint::{BodyPartDecl, MaterialDefinition, Sizes, SpeciesBlueprint};
use crate::chain::{ChainSet, resolve_chain};
use crate::error::AnatomyError;
use crate::generators::{self, GeneratorKind, PartContext};
use crate::geometry::PartGeometry;
use crate::merge::{Bounds, PartRange, merge_parts};
use crate::options::PartOptions;
use crate::report::{BuildReport, BuildWarning, PartSummary};
use crate::skeleton::{Pose, Skeleton, resolve_world_transforms};

/// The merged, skin-bound mesh of one creature
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureMesh {
    pub name: String,
    /// Non-indexed; every vertex carries the full attribute set
    pub geometry: PartGeometry,
    /// Joint names in skin-index order
    pub joint_names: Vec<String>,
    pub parents: Vec<Option<usize>>,
    /// Column-major inverse of each joint's bind-pose world matrix
    pub inverse_bind_matrices: Vec<[f32; 16]>,
    pub bounds: Bounds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialDefinition>,
    pub part_ranges: Vec<PartRange>,
    /// True when nothing was generated and a placeholder stands in
    pub placeholder: bool,
}

impl CreatureMesh {
    pub fn vertex_count(&self) -> usize {
        self.geometry.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.geometry.triangle_count()
    }

    pub fn joint_count(&self) -> usize {
        self.joint_names.len()
    }

    pub fn part(&self, name: &str) -> Option<&PartRange> {
        self.part_ranges.iter().find(|r| r.name == name)
    }
}

/// A built creature: mesh, live skeleton and optional controller
pub struct Creature {
    pub mesh: CreatureMesh,
    pub skeleton: Skeleton,
    /// Current pose; refreshed by [`Creature::update`]
    pub pose: Pose,
    pub chains: ChainSet,
    pub controller: Option<Box<dyn BehaviorController>>,
    pub report: BuildReport,
}

impl Creature {
    /// Advance the behavior controller and re-resolve the pose
    ///
    /// A static creature (no controller) is left untouched.
    pub fn update(&mut self, dt: f32) {
        if let Some(controller) = self.controller.as_mut() {
            controller.update(dt, &mut self.skeleton);
            self.pose = resolve_world_transforms(&self.skeleton);
        }
    }

    /// Discard everything and build again from `blueprint`
    pub fn rebuild(
        &mut self,
        assembler: &CreatureAssembler,
        blueprint: &SpeciesBlueprint,
    ) -> Result<(), AnatomyError> {
        *self = assembler.build_blueprint(blueprint)?;
        Ok(())
    }

    /// Current world matrix times inverse bind matrix, per joint
    pub fn skinning_matrices(&self) -> Vec<Mat4> {
        self.mesh
            .inverse_bind_matrices
            .iter()
            .enumerate()
            .map(|(i, inverse_bind)| self.pose.world_matrix(i) * Mat4::from_cols_array(inverse_bind))
            .collect()
    }
}

impl fmt::Debug for Creature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Creature")
            .field("name", &self.mesh.name)
            .field("vertices", &self.mesh.vertex_count())
            .field("joints", &self.skeleton.len())
            .field("controller", &self.controller.as_ref().map(|c| c.name()))
            .field("warnings", &self.report.warnings.len())
            .finish()
    }
}

/// Everything one build reads, besides the assembler's own settings
struct BuildInputs<'a> {
    name: &'a str,
    parts: &'a [BodyPartDecl],
    chains: &'a ChainSet,
    sizes: &'a Sizes,
    isolate: &'a [String],
    behavior: &'a str,
    material: Option<MaterialDefinition>,
}

/// Result of one part, before merging
struct PartOutcome {
    summary: Option<PartSummary>,
    geometry: PartGeometry,
    warnings: Vec<BuildWarning>,
}

/// Builds creatures; holds settings shared across builds
pub struct CreatureAssembler {
    isolate: Vec<String>,
    sizes: Sizes,
    registry: BehaviorRegistry,
}

impl Default for CreatureAssembler {
    fn default() -> Self {
        Self {
            isolate: Vec::new(),
            sizes: Sizes::default(),
            registry: BehaviorRegistry::default(),
        }
    }
}

impl CreatureAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only generate the named parts
    ///
    /// Overrides a blueprint's `debug.isolatePart`. Names that match no part
    /// are reported; if none match, every part is built.
    pub fn with_isolate<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.isolate = parts.into_iter().map(Into::into).collect();
        self
    }

    /// Size table used by [`CreatureAssembler::build`]
    pub fn with_sizes(mut self, sizes: Sizes) -> Self {
        self.sizes = sizes;
        self
    }

    pub fn with_registry(mut self, registry: BehaviorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    /// Build from an already constructed skeleton
    ///
    /// The creature is static; use [`CreatureAssembler::build_blueprint`] for
    /// behavior and materials.
    pub fn build(&self, skeleton: Skeleton, parts: &[BodyPartDecl], chains: &ChainSet) -> Creature {
        self.assemble(
            skeleton,
            BuildInputs {
                name: "",
                parts,
                chains,
                sizes: &self.sizes,
                isolate: &self.isolate,
                behavior: NO_BEHAVIOR,
                material: None,
            },
        )
    }

    /// Build everything a blueprint declares
    ///
    /// Fails only on a structural skeleton error.
    pub fn build_blueprint(&self, blueprint: &SpeciesBlueprint) -> Result<Creature, AnatomyError> {
        let skeleton =
            Skeleton::from_bones_scaled(&blueprint.bones(), blueprint.sizes.global_scale())?;
        let chains = blueprint.chain_set();
        let parts = blueprint.body_part_decls();
        let blueprint_isolate: Vec<String> = blueprint.debug.isolate_part.iter().cloned().collect();
        let isolate = if self.isolate.is_empty() {
            &blueprint_isolate
        } else {
            &self.isolate
        };

        Ok(self.assemble(
            skeleton,
            BuildInputs {
                name: &blueprint.meta.name,
                parts: &parts,
                chains: &chains,
                sizes: &blueprint.sizes,
                isolate,
                behavior: blueprint.behavior_key(),
                material: blueprint.materials.surface.clone(),
            },
        ))
    }

    fn assemble(&self, skeleton: Skeleton, inputs: BuildInputs) -> Creature {
        let _span = tracing::info_span!("assemble", creature = inputs.name).entered();
        let mut report = BuildReport::default();
        let pose = resolve_world_transforms(&skeleton);

        let selected = select_parts(inputs.parts, inputs.isolate, &mut report);
        let outcomes = self.generate_parts(&skeleton, &pose, &selected, &inputs);

        let mut geometries = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            for warning in outcome.warnings {
                report.warn(warning);
            }
            if let Some(summary) = outcome.summary {
                geometries.push((summary.name.clone(), outcome.geometry));
                report.parts.push(summary);
            }
        }

        let merged = merge_parts(&geometries);
        if merged.placeholder {
            report.warn(BuildWarning::EmptyBuild);
        }

        let controller = match self.registry.create(inputs.behavior, &skeleton, inputs.chains) {
            Ok(controller) => controller,
            Err(_) => {
                report.warn(BuildWarning::UnknownBehavior {
                    key: inputs.behavior.to_string(),
                });
                None
            }
        };

        let mesh = CreatureMesh {
            name: inputs.name.to_string(),
            geometry: merged.geometry,
            joint_names: skeleton.joint_names(),
            parents: skeleton.parent_indices(),
            inverse_bind_matrices: pose.inverse_bind_matrices(),
            bounds: merged.bounds,
            material: inputs.material,
            part_ranges: merged.part_ranges,
            placeholder: merged.placeholder,
        };
        tracing::info!(
            "built '{}': {} parts, {} vertices, {} warnings",
            mesh.name,
            report.parts.len(),
            mesh.vertex_count(),
            report.warnings.len()
        );

        Creature {
            mesh,
            skeleton,
            pose,
            chains: inputs.chains.clone(),
            controller,
            report,
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn generate_parts(
        &self,
        skeleton: &Skeleton,
        pose: &Pose,
        parts: &[&BodyPartDecl],
        inputs: &BuildInputs,
    ) -> Vec<PartOutcome> {
        parts
            .iter()
            .map(|decl| generate_part(skeleton, pose, decl, inputs.chains, inputs.sizes))
            .collect()
    }

    /// Parts are independent; collecting keeps declaration order
    #[cfg(feature = "parallel")]
    fn generate_parts(
        &self,
        skeleton: &Skeleton,
        pose: &Pose,
        parts: &[&BodyPartDecl],
        inputs: &BuildInputs,
    ) -> Vec<PartOutcome> {
        use rayon::prelude::*;

        parts
            .par_iter()
            .map(|decl| generate_part(skeleton, pose, decl, inputs.chains, inputs.sizes))
            .collect()
    }
}

/// Apply the isolation filter
fn select_parts<'a>(
    parts: &'a [BodyPartDecl],
    isolate: &[String],
    report: &mut BuildReport,
) -> Vec<&'a BodyPartDecl> {
    if isolate.is_empty() {
        return parts.iter().collect();
    }
    let wanted: HashSet<&str> = isolate.iter().map(String::as_str).collect();
    for name in isolate {
        if !parts.iter().any(|p| &p.name == name) {
            report.warn(BuildWarning::IsolatedPartNotFound { part: name.clone() });
        }
    }
    let selected: Vec<&BodyPartDecl> = parts
        .iter()
        .filter(|p| wanted.contains(p.name.as_str()))
        .collect();
    if selected.is_empty() {
        return parts.iter().collect();
    }
    selected
}

fn generate_part(
    skeleton: &Skeleton,
    pose: &Pose,
    decl: &BodyPartDecl,
    chains: &ChainSet,
    sizes: &Sizes,
) -> PartOutcome {
    let skipped = |warning| PartOutcome {
        summary: None,
        geometry: PartGeometry::new(),
        warnings: vec![warning],
    };

    let Some(kind) = GeneratorKind::from_key(&decl.generator) else {
        return skipped(BuildWarning::UnknownGenerator {
            part: decl.name.clone(),
            generator: decl.generator.clone(),
        });
    };
    let Some(chain) = chains.get(&decl.chain) else {
        return skipped(BuildWarning::UnknownChain {
            part: decl.name.clone(),
            chain: decl.chain.clone(),
        });
    };

    let resolved = resolve_chain(skeleton, pose, chain);
    let mut warnings = resolved.warnings();
    let (options, option_warnings) = PartOptions::parse(kind, &decl.name, &decl.options);
    warnings.extend(option_warnings);

    let ctx = PartContext {
        part: &decl.name,
        skeleton,
        pose,
        chain: resolved,
        sizing: sizes.part_sizing(chain),
    };
    let generated = generators::generate(&options, &ctx);
    tracing::debug!(
        "{}: {} generator produced {} vertices",
        decl.name,
        kind,
        generated.geometry.vertex_count()
    );
    warnings.extend(generated.warnings);

    PartOutcome {
        summary: Some(PartSummary {
            name: decl.name.clone(),
            generator: kind.to_string(),
            chain: decl.chain.clone(),
            vertex_count: generated.geometry.vertex_count(),
            placeholder: generated.placeholder,
        }),
        geometry: generated.geometry,
        warnings,
    }
}
