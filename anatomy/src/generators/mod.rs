//! Anatomical part generators
//!
//! One generator per [`GeneratorKind`]. Each adapts the shared tube builder
//! (or, for heads and wings, a deformed primitive or grid) to one body part.
//! Generators never fail: a chain that resolves too few points yields a
//! placeholder primitive plus a warning.

use std::collections::BTreeMap;

use glam::Vec3;

use crate::chain::ResolvedChain;
use crate::geometry::PartGeometry;
use crate::modifiers::{MeshApply, RecomputeNormals, Transform};
use crate::options::PartOptions;
use crate::primitives::{PLACEHOLDER_RADIUS, placeholder};
use crate::radius::{RadiusProfile, RadiusSpec};
use crate::report::BuildWarning;
use crate::skeleton::{Pose, Skeleton};

pub mod ear;
pub mod head;
pub mod limb;
pub mod neck;
pub mod tail;
pub mod torso;
pub mod wing;

/// The closed set of part generators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    Torso,
    Neck,
    Head,
    Limb,
    Tail,
    /// Nose, trunk and tusk: a tail rooted on a fallback bone
    Nose,
    Ear,
    Wing,
}

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 8] = [
        Self::Torso,
        Self::Neck,
        Self::Head,
        Self::Limb,
        Self::Tail,
        Self::Nose,
        Self::Ear,
        Self::Wing,
    ];

    /// Resolve a blueprint generator key
    ///
    /// Case-insensitive; a trailing `Generator` is ignored (`torsoGenerator`).
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        let key = key.strip_suffix("generator").unwrap_or(&key);
        match key {
            "torso" | "body" => Some(Self::Torso),
            "neck" => Some(Self::Neck),
            "head" => Some(Self::Head),
            "limb" | "leg" | "arm" => Some(Self::Limb),
            "tail" => Some(Self::Tail),
            "nose" | "trunk" | "tusk" => Some(Self::Nose),
            "ear" => Some(Self::Ear),
            "wing" => Some(Self::Wing),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Torso => "torso",
            Self::Neck => "neck",
            Self::Head => "head",
            Self::Limb => "limb",
            Self::Tail => "tail",
            Self::Nose => "nose",
            Self::Ear => "ear",
            Self::Wing => "wing",
        }
    }
}

impl std::fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size hints that apply to one part
#[derive(Debug, Clone)]
pub struct PartSizing {
    /// Radius used when nothing else declares one
    pub default_radius: f32,
    /// Multiplier on every resolved radius (global scale × chain width scale)
    pub radius_scale: f32,
    /// Radii declared on the chain or in the blueprint's size table
    pub chain_radii: Option<RadiusSpec>,
    /// Profile name declared on the chain
    pub chain_profile: Option<String>,
    /// Per-bone radius hints, unscaled
    pub bone_radii: BTreeMap<String, f32>,
}

impl Default for PartSizing {
    fn default() -> Self {
        Self {
            default_radius: PLACEHOLDER_RADIUS,
            radius_scale: 1.0,
            chain_radii: None,
            chain_profile: None,
            bone_radii: BTreeMap::new(),
        }
    }
}

/// Read-only inputs of one generator call
pub struct PartContext<'a> {
    pub part: &'a str,
    pub skeleton: &'a Skeleton,
    pub pose: &'a Pose,
    pub chain: ResolvedChain,
    pub sizing: PartSizing,
}

impl PartContext<'_> {
    /// Declared radii, else chain radii, with the radius scale applied
    pub fn radius_spec(&self, declared: Option<RadiusSpec>) -> Option<RadiusSpec> {
        declared
            .or_else(|| self.sizing.chain_radii.clone())
            .map(|spec| spec.scaled(self.sizing.radius_scale))
    }

    pub fn default_radius(&self) -> f32 {
        self.sizing.default_radius * self.sizing.radius_scale
    }

    /// Scaled radius hint for a bone
    pub fn bone_radius(&self, bone: &str) -> Option<f32> {
        self.sizing
            .bone_radii
            .get(bone)
            .map(|r| r * self.sizing.radius_scale)
    }

    /// Resolve a profile name (declared, else the chain's)
    pub fn profile(&self, declared: Option<&str>, warnings: &mut Vec<BuildWarning>) -> RadiusProfile {
        let Some(name) = declared.or(self.sizing.chain_profile.as_deref()) else {
            return RadiusProfile::None;
        };
        RadiusProfile::from_name(name).unwrap_or_else(|| {
            warnings.push(BuildWarning::UnknownProfile {
                part: self.part.to_string(),
                profile: name.to_string(),
            });
            RadiusProfile::None
        })
    }

    /// World position of a named bone
    pub fn bone_position(&self, bone: &str) -> Option<Vec3> {
        self.skeleton
            .index_of(bone)
            .map(|i| self.pose.world_position(i))
    }

    /// Placeholder result for a chain with too few points
    pub fn placeholder(&self, required: usize) -> GeneratedPart {
        let base = self.chain.root().unwrap_or(Vec3::ZERO);
        let joint = self.chain.joints.first().copied().unwrap_or(0);
        GeneratedPart {
            geometry: placeholder(base, self.default_radius(), joint),
            warnings: vec![BuildWarning::InsufficientPoints {
                part: self.part.to_string(),
                required,
                resolved: self.chain.len(),
            }],
            placeholder: true,
        }
    }
}

/// Output of one generator call
#[derive(Debug, Clone, Default)]
pub struct GeneratedPart {
    pub geometry: PartGeometry,
    pub warnings: Vec<BuildWarning>,
    pub placeholder: bool,
}

impl GeneratedPart {
    pub fn new(geometry: PartGeometry, warnings: Vec<BuildWarning>) -> Self {
        Self {
            geometry,
            warnings,
            placeholder: false,
        }
    }
}

/// Run the generator matching `options`
pub fn generate(options: &PartOptions, ctx: &PartContext) -> GeneratedPart {
    match options {
        PartOptions::Torso(o) => torso::generate(ctx, o),
        PartOptions::Neck(o) => neck::generate(ctx, o),
        PartOptions::Head(o) => head::generate(ctx, o),
        PartOptions::Limb(o) => limb::generate(ctx, o),
        PartOptions::Tail(o) => tail::generate(ctx, o),
        PartOptions::Nose(o) => tail::generate_nose(ctx, o),
        PartOptions::Ear(o) => ear::generate(ctx, o),
        PartOptions::Wing(o) => wing::generate(ctx, o),
    }
}

/// Second stage of a generate-then-transform part
///
/// Applies `transform` to an already generated part and recomputes normals.
/// Skin data is untouched, so the part stays bound to the same joints.
pub fn then_transform(mut part: GeneratedPart, transform: Transform) -> GeneratedPart {
    part.geometry.apply(transform).apply(RecomputeNormals);
    part
}

/// Split each chain segment into `per_segment` rings
///
/// Returns the ring centers and each ring's fractional chain coordinate.
pub fn subdivide(points: &[Vec3], per_segment: u32) -> (Vec<Vec3>, Vec<f32>) {
    let per_segment = per_segment.max(1) as usize;
    let mut centers = Vec::with_capacity((points.len().saturating_sub(1)) * per_segment + 1);
    let mut coords = Vec::with_capacity(centers.capacity());
    for (k, pair) in points.windows(2).enumerate() {
        for s in 0..per_segment {
            let f = s as f32 / per_segment as f32;
            centers.push(pair[0].lerp(pair[1], f));
            coords.push(k as f32 + f);
        }
    }
    if let Some(&last) = points.last() {
        centers.push(last);
        coords.push((points.len() - 1) as f32);
    }
    (centers, coords)
}
