//! Typed per-generator options
//!
//! Each body part carries a free-form JSON `options` object. It is parsed
//! once, at the body-part boundary, into the option struct of its generator;
//! every field has a default so generators never see a missing value.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::report::BuildWarning;
use crate::tube::{MAX_SIDES, MIN_SIDES};

/// Rear-leg coverage for the hip end of a torso
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RumpExtension {
    /// Leg bones whose positions the first ring must cover
    pub bones: Vec<String>,
    pub extra_margin: f32,
    /// Radius of each leg bone, added to its distance
    #[serde(alias = "perBoneRadii")]
    pub bone_radii: BTreeMap<String, f32>,
}

impl Default for RumpExtension {
    fn default() -> Self {
        Self {
            bones: Vec::new(),
            extra_margin: 0.05,
            bone_radii: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TorsoOptions {
    pub radii: Option<Vec<f32>>,
    pub sides: u32,
    pub radius_profile: Option<String>,
    pub rump_bulge_depth: f32,
    pub extend_rump_to_rear_legs: Option<RumpExtension>,
    pub low_poly: bool,
    pub low_poly_segments: u32,
    pub low_poly_weld_tolerance: f32,
    pub cap_start: bool,
    pub cap_end: bool,
}

impl Default for TorsoOptions {
    fn default() -> Self {
        Self {
            radii: None,
            sides: 16,
            radius_profile: None,
            rump_bulge_depth: 0.0,
            extend_rump_to_rear_legs: None,
            low_poly: false,
            low_poly_segments: 9,
            low_poly_weld_tolerance: 0.0,
            cap_start: true,
            cap_end: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NeckOptions {
    pub radii: Option<Vec<f32>>,
    pub sides: u32,
    pub cap_base: bool,
    pub cap_end: bool,
}

impl Default for NeckOptions {
    fn default() -> Self {
        Self {
            radii: None,
            sides: 14,
            cap_base: false,
            cap_end: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadOptions {
    /// Bone the head is centered on and skinned to; defaults to the chain tip
    pub parent_bone: Option<String>,
    pub radius: f32,
    pub sides: u32,
    /// Stretch along the neck→head direction
    pub elongation: f32,
    /// Subdivision level, 0–4
    pub detail: u32,
    pub width_scale: f32,
    pub height_scale: f32,
}

impl Default for HeadOptions {
    fn default() -> Self {
        Self {
            parent_bone: None,
            radius: 0.5,
            sides: 16,
            elongation: 1.0,
            detail: 1,
            width_scale: 1.0,
            height_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LimbOptions {
    /// Per-bone radii; one extra entry is the tip flare
    pub radii: Option<Vec<f32>>,
    pub sides: u32,
    pub rings_per_segment: u32,
    pub cap_start: bool,
    pub cap_end: bool,
    /// Flare ring offset past the tip, as a fraction of the last segment
    pub flare_length: f32,
}

impl Default for LimbOptions {
    fn default() -> Self {
        Self {
            radii: None,
            sides: 12,
            rings_per_segment: 1,
            cap_start: false,
            cap_end: true,
            flare_length: 0.15,
        }
    }
}

/// Options shared by tails, noses, trunks and tusks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TailOptions {
    pub radii: Option<Vec<f32>>,
    pub base_radius: Option<f32>,
    pub mid_radius: Option<f32>,
    pub tip_radius: Option<f32>,
    pub sides: u32,
    pub y_offset: f32,
    pub length_scale: f32,
    /// Bone prepended as the root of the path
    pub root_bone: Option<String>,
    /// First of these present in the skeleton is used when `root_bone` is unset
    pub root_bone_candidates: Vec<String>,
    pub cap_end: bool,
}

pub const DEFAULT_ROOT_CANDIDATES: [&str; 4] = ["trunk_anchor", "trunk_base", "nose_base", "head"];

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            radii: None,
            base_radius: None,
            mid_radius: None,
            tip_radius: None,
            sides: 12,
            y_offset: 0.0,
            length_scale: 1.0,
            root_bone: None,
            root_bone_candidates: DEFAULT_ROOT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            cap_end: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EarOptions {
    #[serde(flatten)]
    pub limb: LimbOptions,
    /// Scale applied across the ear's thin axis
    pub flatten: f32,
    /// Fan angle about the up axis, radians
    pub tilt: f32,
    /// Overrides the side inferred from names
    pub side: Option<Side>,
}

impl Default for EarOptions {
    fn default() -> Self {
        Self {
            limb: LimbOptions::default(),
            flatten: 0.3,
            tilt: 0.0,
            side: None,
        }
    }
}

/// Membrane width along the chain, as a function of `t`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThicknessProfile {
    Constant,
    #[default]
    Taper,
    Bell,
}

impl ThicknessProfile {
    pub fn at(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Constant => 1.0,
            Self::Taper => 1.0 - 0.7 * t,
            Self::Bell => 0.3 + 0.7 * (std::f32::consts::PI * t).sin(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WingOptions {
    pub span: f32,
    pub membrane_resolution: u32,
    pub thickness: f32,
    pub thickness_profile: ThicknessProfile,
    /// Cross-chain direction override
    pub direction: Option<[f32; 3]>,
    pub double_sided: bool,
}

impl Default for WingOptions {
    fn default() -> Self {
        Self {
            span: 1.0,
            membrane_resolution: 6,
            thickness: 0.02,
            thickness_profile: ThicknessProfile::default(),
            direction: None,
            double_sided: true,
        }
    }
}

/// Clamps invalid option values in place, reporting each one
struct Sanitizer<'a> {
    part: &'a str,
    warnings: Vec<BuildWarning>,
}

impl<'a> Sanitizer<'a> {
    fn new(part: &'a str) -> Self {
        Self {
            part,
            warnings: Vec::new(),
        }
    }

    fn clamp(&mut self, field: &str, value: &mut f32, min: f32, max: f32) {
        let clamped = if value.is_finite() {
            value.clamp(min, max)
        } else {
            min.max(0.0).min(max)
        };
        if clamped != *value {
            self.warnings.push(BuildWarning::ClampedValue {
                part: self.part.to_string(),
                field: field.to_string(),
                value: *value,
                clamped,
            });
            *value = clamped;
        }
    }

    fn non_negative(&mut self, field: &str, value: &mut f32) {
        self.clamp(field, value, 0.0, f32::MAX);
    }

    fn opt_non_negative(&mut self, field: &str, value: &mut Option<f32>) {
        if let Some(v) = value {
            self.non_negative(field, v);
        }
    }

    fn radii(&mut self, radii: &mut Option<Vec<f32>>) {
        for (i, r) in radii.iter_mut().flatten().enumerate() {
            self.non_negative(&format!("radii[{i}]"), r);
        }
    }

    fn sides(&mut self, sides: &mut u32) {
        let clamped = (*sides).clamp(MIN_SIDES, MAX_SIDES);
        if clamped != *sides {
            self.warnings.push(BuildWarning::ClampedValue {
                part: self.part.to_string(),
                field: "sides".to_string(),
                value: *sides as f32,
                clamped: clamped as f32,
            });
            *sides = clamped;
        }
    }

    fn count(&mut self, field: &str, value: &mut u32, min: u32, max: u32) {
        let clamped = (*value).clamp(min, max);
        if clamped != *value {
            self.warnings.push(BuildWarning::ClampedValue {
                part: self.part.to_string(),
                field: field.to_string(),
                value: *value as f32,
                clamped: clamped as f32,
            });
            *value = clamped;
        }
    }
}

impl TorsoOptions {
    fn sanitize(&mut self, s: &mut Sanitizer) {
        s.radii(&mut self.radii);
        s.sides(&mut self.sides);
        s.count("lowPolySegments", &mut self.low_poly_segments, MIN_SIDES, MAX_SIDES);
        s.non_negative("rumpBulgeDepth", &mut self.rump_bulge_depth);
        s.non_negative("lowPolyWeldTolerance", &mut self.low_poly_weld_tolerance);
        if let Some(rump) = &mut self.extend_rump_to_rear_legs {
            s.non_negative("extraMargin", &mut rump.extra_margin);
            for (bone, r) in rump.bone_radii.iter_mut() {
                s.non_negative(&format!("boneRadii.{bone}"), r);
            }
        }
    }
}

impl NeckOptions {
    fn sanitize(&mut self, s: &mut Sanitizer) {
        s.radii(&mut self.radii);
        s.sides(&mut self.sides);
    }
}

impl HeadOptions {
    fn sanitize(&mut self, s: &mut Sanitizer) {
        s.non_negative("radius", &mut self.radius);
        s.sides(&mut self.sides);
        s.count("detail", &mut self.detail, 0, 4);
        s.clamp("elongation", &mut self.elongation, 0.05, 20.0);
        s.clamp("widthScale", &mut self.width_scale, 0.05, 20.0);
        s.clamp("heightScale", &mut self.height_scale, 0.05, 20.0);
    }
}

impl LimbOptions {
    fn sanitize(&mut self, s: &mut Sanitizer) {
        s.radii(&mut self.radii);
        s.sides(&mut self.sides);
        s.count("ringsPerSegment", &mut self.rings_per_segment, 1, 16);
        s.non_negative("flareLength", &mut self.flare_length);
    }
}

impl TailOptions {
    fn sanitize(&mut self, s: &mut Sanitizer) {
        s.radii(&mut self.radii);
        s.opt_non_negative("baseRadius", &mut self.base_radius);
        s.opt_non_negative("midRadius", &mut self.mid_radius);
        s.opt_non_negative("tipRadius", &mut self.tip_radius);
        s.sides(&mut self.sides);
        s.non_negative("lengthScale", &mut self.length_scale);
        if !self.y_offset.is_finite() {
            s.clamp("yOffset", &mut self.y_offset, 0.0, 0.0);
        }
    }
}

impl EarOptions {
    fn sanitize(&mut self, s: &mut Sanitizer) {
        self.limb.sanitize(s);
        s.clamp("flatten", &mut self.flatten, 0.01, 10.0);
        if !self.tilt.is_finite() {
            s.clamp("tilt", &mut self.tilt, 0.0, 0.0);
        }
    }
}

impl WingOptions {
    fn sanitize(&mut self, s: &mut Sanitizer) {
        s.non_negative("span", &mut self.span);
        s.non_negative("thickness", &mut self.thickness);
        s.count("membraneResolution", &mut self.membrane_resolution, 1, 64);
    }
}

/// Options of one body part, keyed by generator
#[derive(Debug, Clone, PartialEq)]
pub enum PartOptions {
    Torso(TorsoOptions),
    Neck(NeckOptions),
    Head(HeadOptions),
    Limb(LimbOptions),
    Tail(TailOptions),
    /// Nose, trunk and tusk share the tail options
    Nose(TailOptions),
    Ear(EarOptions),
    Wing(WingOptions),
}

/// Deserialize `value`, falling back to defaults on error
fn parse_or_default<T: DeserializeOwned + Default>(
    part: &str,
    value: &Value,
    warnings: &mut Vec<BuildWarning>,
) -> T {
    if value.is_null() {
        return T::default();
    }
    match serde_json::from_value(value.clone()) {
        Ok(options) => options,
        Err(e) => {
            warnings.push(BuildWarning::InvalidOptions {
                part: part.to_string(),
                message: e.to_string(),
            });
            T::default()
        }
    }
}

impl PartOptions {
    /// Parse and sanitize options for `kind`
    ///
    /// Never fails: unparsable objects become defaults and invalid values are
    /// clamped, each with a warning.
    pub fn parse(
        kind: crate::generators::GeneratorKind,
        part: &str,
        value: &Value,
    ) -> (Self, Vec<BuildWarning>) {
        use crate::generators::GeneratorKind as K;

        let mut warnings = Vec::new();
        let mut s = Sanitizer::new(part);
        let options = match kind {
            K::Torso => {
                let mut o: TorsoOptions = parse_or_default(part, value, &mut warnings);
                o.sanitize(&mut s);
                Self::Torso(o)
            }
            K::Neck => {
                let mut o: NeckOptions = parse_or_default(part, value, &mut warnings);
                o.sanitize(&mut s);
                Self::Neck(o)
            }
            K::Head => {
                let mut o: HeadOptions = parse_or_default(part, value, &mut warnings);
                o.sanitize(&mut s);
                Self::Head(o)
            }
            K::Limb => {
                let mut o: LimbOptions = parse_or_default(part, value, &mut warnings);
                o.sanitize(&mut s);
                Self::Limb(o)
            }
            K::Tail => {
                let mut o: TailOptions = parse_or_default(part, value, &mut warnings);
                o.sanitize(&mut s);
                Self::Tail(o)
            }
            K::Nose => {
                let mut o: TailOptions = parse_or_default(part, value, &mut warnings);
                o.sanitize(&mut s);
                Self::Nose(o)
            }
            K::Ear => {
                let mut o: EarOptions = parse_or_default(part, value, &mut warnings);
                o.sanitize(&mut s);
                Self::Ear(o)
            }
            K::Wing => {
                let mut o: WingOptions = parse_or_default(part, value, &mut warnings);
                o.sanitize(&mut s);
                Self::Wing(o)
            }
        };
        warnings.extend(s.warnings);
        (options, warnings)
    }
}
