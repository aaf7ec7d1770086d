//! Procedural skinned creature meshes
//!
//! Turns a species blueprint (a flat bone list, named bone chains and
//! per-part generator options) into one merged, skin-bound mesh.
//!
//! Pipeline: [`Skeleton`] → [`resolve_world_transforms`] → per body part
//! [`resolve_chain`] → radius sampling and frames → ring tube (or sphere /
//! membrane grid) → [`merge_parts`] → [`CreatureMesh`].
//!
//! Only a malformed skeleton is an error. Missing bones, unknown chains or
//! generators and bad options are reported as [`BuildWarning`]s and the
//! creature is still built.
//!
//! # Example
//! ```no_run
//! use creature_anatomy::*;
//!
//! let blueprint = SpeciesBlueprint::load("elephant.json")?;
//! let creature = CreatureAssembler::new().build_blueprint(&blueprint)?;
//! for warning in &creature.report.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! write_obj(&creature.mesh, "elephant.obj".as_ref(), "elephant")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assembler;
pub mod behavior;
pub mod blueprint;
pub mod chain;
pub mod error;
pub mod export;
pub mod frame;
pub mod generators;
pub mod geometry;
pub mod merge;
pub mod modifiers;
pub mod options;
pub mod primitives;
pub mod radius;
pub mod report;
pub mod skeleton;
pub mod tube;
pub mod validate;

pub use assembler::{Creature, CreatureAssembler, CreatureMesh};
pub use behavior::{BehaviorController, BehaviorRegistry, IdleBreathing};
pub use blueprint::{BodyPartDecl, SpeciesBlueprint};
pub use chain::{Chain, ChainSet, ResolvedChain, resolve_chain};
pub use error::{AnatomyError, BlueprintError, ExportError, SkeletonError};
pub use export::{SkinnedVertex, to_obj_string, write_obj, write_skinned_json};
pub use frame::{Frame, FramePolicy, build_frames};
pub use generators::{GeneratorKind, PartContext, PartSizing};
pub use geometry::{MAX_INFLUENCES, PartGeometry, SkinInfluence};
pub use merge::{MergedGeometry, merge_parts, normalize_part};
pub use modifiers::{MeshApply, MeshModifier, Transform};
pub use options::PartOptions;
pub use radius::{RadiusProfile, RadiusSpec, expand};
pub use report::{BuildReport, BuildWarning};
pub use skeleton::{BoneDef, Pose, Skeleton, resolve_world_transforms};
pub use tube::{SkinWeighting, TubeSpec, build_tube};
pub use validate::{ValidationIssue, validate_blueprint};
