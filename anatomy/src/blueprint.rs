//! Species blueprint documents
//!
//! The JSON shape authored by species designers: a flat bone list, named
//! chains, size hints, body part declarations, materials and behavior
//! presets. Every optional field has a serde default, unknown fields are
//! ignored. Both the named-field (V1) and list (V2) forms of chains and body
//! parts are accepted; V2 entries replace same-named V1 entries.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chain::{Chain, ChainSet};
use crate::error::BlueprintError;
use crate::generators::PartSizing;
use crate::primitives::PLACEHOLDER_RADIUS;
use crate::radius::RadiusSpec;
use crate::skeleton::BoneDef;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeciesBlueprint {
    pub meta: BlueprintMeta,
    pub body_plan: BodyPlan,
    pub skeleton: SkeletonDecl,
    pub chains: Chains,
    #[serde(rename = "chainsV2")]
    pub chains_v2: Vec<Chain>,
    pub sizes: Sizes,
    pub body_parts: BodyParts,
    #[serde(rename = "bodyPartsV2")]
    pub body_parts_v2: Vec<BodyPartDecl>,
    pub materials: Materials,
    pub behavior_presets: BehaviorPresets,
    pub debug: DebugOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlueprintMeta {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Default for BlueprintMeta {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: "1.0.0".into(),
            schema_version: None,
            author: None,
            source: None,
            notes: None,
        }
    }
}

/// High-level classification; informational only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BodyPlan {
    #[serde(rename = "type")]
    pub kind: String,
    pub has_tail: bool,
    pub has_trunk: bool,
    pub has_wings: bool,
    pub has_ears: bool,
    pub symmetry_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Default for BodyPlan {
    fn default() -> Self {
        Self {
            kind: String::new(),
            has_tail: true,
            has_trunk: false,
            has_wings: false,
            has_ears: true,
            symmetry_mode: "bilateral".into(),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkeletonDecl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate_system: Option<String>,
    pub bones: Vec<BoneDef>,
}

/// Named chains of the V1 schema
///
/// Keys outside the well-known set are accepted as chains too, as long as
/// they hold a list of bone names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Chains {
    pub spine: Vec<String>,
    pub neck: Vec<String>,
    pub head: Vec<String>,
    pub trunk: Vec<String>,
    pub tail: Vec<String>,
    pub ear_left: Vec<String>,
    pub ear_right: Vec<String>,
    #[serde(rename = "frontLegL")]
    pub front_leg_l: Vec<String>,
    #[serde(rename = "frontLegR")]
    pub front_leg_r: Vec<String>,
    #[serde(rename = "backLegL")]
    pub back_leg_l: Vec<String>,
    #[serde(rename = "backLegR")]
    pub back_leg_r: Vec<String>,
    pub extra_chains: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Chains {
    /// Every non-empty chain as `(name, bones)`, well-known names first
    pub fn entries(&self) -> Vec<(String, Vec<String>)> {
        let named = [
            ("spine", &self.spine),
            ("neck", &self.neck),
            ("head", &self.head),
            ("trunk", &self.trunk),
            ("tail", &self.tail),
            ("earLeft", &self.ear_left),
            ("earRight", &self.ear_right),
            ("frontLegL", &self.front_leg_l),
            ("frontLegR", &self.front_leg_r),
            ("backLegL", &self.back_leg_l),
            ("backLegR", &self.back_leg_r),
        ];
        let mut out: Vec<(String, Vec<String>)> = named
            .into_iter()
            .filter(|(_, bones)| !bones.is_empty())
            .map(|(name, bones)| (name.to_string(), bones.clone()))
            .collect();
        for (name, value) in &self.other {
            match serde_json::from_value::<Vec<String>>(value.clone()) {
                Ok(bones) if !bones.is_empty() => out.push((name.clone(), bones)),
                Ok(_) => {}
                Err(_) => tracing::debug!(chain = %name, "ignoring non-list chain entry"),
            }
        }
        out.extend(
            self.extra_chains
                .iter()
                .filter(|(_, bones)| !bones.is_empty())
                .map(|(name, bones)| (name.clone(), bones.clone())),
        );
        out
    }
}

/// Radius or scale hints for one bone or chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SizeProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_top: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_bottom: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_scale: Option<f32>,
}

impl SizeProfile {
    /// Radii this profile declares for a chain
    ///
    /// `radiusBottom` is the base, `radiusTop` the tip; a lone `radius` is
    /// uniform.
    pub fn radius_spec(&self) -> Option<RadiusSpec> {
        match (self.radius_bottom, self.radius_top, self.radius) {
            (None, None, None) => None,
            (None, None, Some(r)) => Some(RadiusSpec::Uniform(r)),
            (bottom, top, r) => {
                let base = bottom.or(r).or(top).unwrap_or(PLACEHOLDER_RADIUS);
                let tip = top.or(r).unwrap_or(base);
                Some(RadiusSpec::Tapered {
                    base,
                    mid: None,
                    tip,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sizes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_scale: Option<f32>,
    pub by_bone: BTreeMap<String, SizeProfile>,
    pub by_chain: BTreeMap<String, SizeProfile>,
}

impl Sizes {
    /// Multiplier on bone offsets and radii; non-positive values mean 1
    pub fn global_scale(&self) -> f32 {
        self.global_scale
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(1.0)
    }

    pub fn default_radius(&self) -> f32 {
        self.default_radius
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(PLACEHOLDER_RADIUS)
    }

    /// Size hints for a part built on `chain`
    ///
    /// Radii declared on the chain itself win over the `byChain` table.
    pub fn part_sizing(&self, chain: &Chain) -> PartSizing {
        let by_chain = self.by_chain.get(&chain.name);
        let width_scale = by_chain
            .and_then(|p| p.width_scale)
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(1.0);
        let chain_radii = chain
            .radii
            .clone()
            .filter(|r| !r.is_empty())
            .map(RadiusSpec::Explicit)
            .or_else(|| by_chain.and_then(SizeProfile::radius_spec));

        PartSizing {
            default_radius: self.default_radius(),
            radius_scale: self.global_scale() * width_scale,
            chain_radii,
            chain_profile: chain.profile.clone(),
            bone_radii: self
                .by_bone
                .iter()
                .filter_map(|(bone, p)| p.radius.map(|r| (bone.clone(), r)))
                .collect(),
        }
    }
}

/// One body part: a chain bound to a generator and its options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyPartDecl {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub generator: String,
    /// Defaults to the part's own name
    #[serde(default)]
    pub chain: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

impl BodyPartDecl {
    pub fn new(name: &str, generator: &str, chain: &str, options: Value) -> Self {
        Self {
            name: name.to_string(),
            generator: generator.to_string(),
            chain: chain.to_string(),
            options,
        }
    }

    fn named(mut self, name: &str) -> Self {
        if self.name.is_empty() {
            self.name = name.to_string();
        }
        if self.chain.is_empty() {
            self.chain = self.name.clone();
        }
        self
    }
}

/// Named body parts of the V1 schema
///
/// Like [`Chains`], keys outside the well-known set are accepted as parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BodyParts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torso: Option<BodyPartDecl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neck: Option<BodyPartDecl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<BodyPartDecl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trunk: Option<BodyPartDecl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<BodyPartDecl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ear_left: Option<BodyPartDecl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ear_right: Option<BodyPartDecl>,
    #[serde(rename = "frontLegL", skip_serializing_if = "Option::is_none")]
    pub front_leg_l: Option<BodyPartDecl>,
    #[serde(rename = "frontLegR", skip_serializing_if = "Option::is_none")]
    pub front_leg_r: Option<BodyPartDecl>,
    #[serde(rename = "backLegL", skip_serializing_if = "Option::is_none")]
    pub back_leg_l: Option<BodyPartDecl>,
    #[serde(rename = "backLegR", skip_serializing_if = "Option::is_none")]
    pub back_leg_r: Option<BodyPartDecl>,
    pub extra_parts: BTreeMap<String, BodyPartDecl>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl BodyParts {
    /// Every declared part, well-known names first, with names filled in
    pub fn entries(&self) -> Vec<BodyPartDecl> {
        let named = [
            ("torso", &self.torso),
            ("neck", &self.neck),
            ("head", &self.head),
            ("trunk", &self.trunk),
            ("tail", &self.tail),
            ("earLeft", &self.ear_left),
            ("earRight", &self.ear_right),
            ("frontLegL", &self.front_leg_l),
            ("frontLegR", &self.front_leg_r),
            ("backLegL", &self.back_leg_l),
            ("backLegR", &self.back_leg_r),
        ];
        let mut out: Vec<BodyPartDecl> = named
            .into_iter()
            .filter_map(|(name, decl)| decl.clone().map(|d| d.named(name)))
            .collect();
        for (name, value) in &self.other {
            match serde_json::from_value::<BodyPartDecl>(value.clone()) {
                Ok(decl) => out.push(decl.named(name)),
                Err(err) => tracing::debug!(part = %name, %err, "ignoring non-part entry"),
            }
        }
        out.extend(
            self.extra_parts
                .iter()
                .map(|(name, decl)| decl.clone().named(name)),
        );
        out
    }
}

/// PBR passthrough values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaterialDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metallic: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specular: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emissive: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Materials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface: Option<MaterialDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye: Option<MaterialDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tusk: Option<MaterialDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nail: Option<MaterialDefinition>,
    pub extra_materials: BTreeMap<String, MaterialDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BehaviorPresets {
    /// Behavior registry key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gait: Option<String>,
    pub idle_behaviors: Vec<String>,
    pub special_interactions: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebugOptions {
    /// Build only this body part
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolate_part: Option<String>,
}

impl SpeciesBlueprint {
    pub fn from_json(text: &str) -> Result<Self, BlueprintError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BlueprintError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| BlueprintError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Bone list with root sentinels cleared
    ///
    /// A bone naming itself as parent, the declared root bone, and bones
    /// parented to a declared root that is not itself a bone all become roots.
    pub fn bones(&self) -> Vec<BoneDef> {
        let root = self.skeleton.root.as_deref();
        let root_is_bone = root.is_some_and(|r| self.skeleton.bones.iter().any(|b| b.name == r));
        self.skeleton
            .bones
            .iter()
            .cloned()
            .map(|mut bone| {
                let parent = bone.parent.as_deref();
                let is_root = parent == Some(bone.name.as_str())
                    || (root_is_bone && root == Some(bone.name.as_str()))
                    || (!root_is_bone && root.is_some() && parent == root);
                if is_root {
                    bone.parent = None;
                }
                bone
            })
            .collect()
    }

    /// V1 chains merged with `chainsV2`
    pub fn chain_set(&self) -> ChainSet {
        let mut set: ChainSet = self
            .chains
            .entries()
            .into_iter()
            .map(|(name, bones)| Chain {
                name,
                bones,
                radii: None,
                profile: None,
            })
            .collect();
        for chain in &self.chains_v2 {
            set.insert(chain.clone());
        }
        set
    }

    /// V1 body parts merged with `bodyPartsV2`, in declaration order
    pub fn body_part_decls(&self) -> Vec<BodyPartDecl> {
        let mut parts = self.body_parts.entries();
        for decl in &self.body_parts_v2 {
            let decl = decl.clone().named(&decl.name);
            match parts.iter_mut().find(|p| p.name == decl.name) {
                Some(existing) => *existing = decl,
                None => parts.push(decl),
            }
        }
        parts
    }

    /// Behavior registry key, `"none"` when unset
    pub fn behavior_key(&self) -> &str {
        self.behavior_presets.gait.as_deref().unwrap_or("none")
    }
}
