//! Torso: spine chain from hips to neck

use crate::frame::FramePolicy;
use crate::modifiers::{FlatNormals, MeshApply};
use crate::options::{RumpExtension, TorsoOptions};
use crate::radius::{RadiusSpec, expand};
use crate::report::BuildWarning;
use crate::tube::{SkinWeighting, TubeSkin, TubeSpec, build_tube};

use super::{GeneratedPart, PartContext};

pub fn generate(ctx: &PartContext, options: &TorsoOptions) -> GeneratedPart {
    let points = &ctx.chain.points;
    let n = points.len();
    if n < 2 {
        return ctx.placeholder(2);
    }

    let mut warnings = Vec::new();
    let declared = options
        .radii
        .clone()
        .filter(|r| !r.is_empty())
        .map(RadiusSpec::Explicit);
    let mut radii = expand(ctx.radius_spec(declared).as_ref(), n, n, ctx.default_radius());

    apply_rump_bulge(&mut radii, options.rump_bulge_depth);
    if let Some(rump) = &options.extend_rump_to_rear_legs {
        let floor = rump_floor(ctx, rump, &mut warnings);
        if floor > radii[0] {
            tracing::debug!(
                "{}: rump radius {:.3} raised to {:.3} to cover rear legs",
                ctx.part,
                radii[0],
                floor
            );
            radii[0] = floor;
        }
    }

    let profile = ctx.profile(options.radius_profile.as_deref(), &mut warnings);
    let (sides, weld) = if options.low_poly {
        (options.low_poly_segments, options.low_poly_weld_tolerance)
    } else {
        (options.sides, 0.0)
    };

    let mut spec = TubeSpec::new(points, &radii)
        .frames(FramePolicy::FixedAxis)
        .sides(sides)
        .caps(options.cap_start, options.cap_end)
        .skin(TubeSkin::per_bone(&ctx.chain.joints, SkinWeighting::BlendAdjacentBones))
        .weld(weld);
    if !profile.is_none() {
        spec = spec.profile(&profile);
    }

    let mut geometry = build_tube(&spec);
    if options.low_poly {
        geometry.apply(FlatNormals);
    }

    GeneratedPart::new(geometry, warnings)
}

/// Scale the first ring by `1 + depth` and the second by half as much
fn apply_rump_bulge(radii: &mut [f32], depth: f32) {
    if depth <= 0.0 {
        return;
    }
    if let Some(first) = radii.first_mut() {
        *first *= 1.0 + depth;
    }
    // Only a chain of three or more rings has a second ring that is not the tip
    if radii.len() > 2 {
        radii[1] *= 1.0 + depth * 0.5;
    }
}

/// Smallest first-ring radius that reaches every listed leg bone
fn rump_floor(ctx: &PartContext, rump: &RumpExtension, warnings: &mut Vec<BuildWarning>) -> f32 {
    let Some(root) = ctx.chain.root() else {
        return 0.0;
    };

    let mut floor = 0.0f32;
    for bone in &rump.bones {
        let Some(position) = ctx.bone_position(bone) else {
            warnings.push(BuildWarning::MissingBone {
                chain: format!("{}.extendRumpToRearLegs", ctx.part),
                bone: bone.clone(),
            });
            continue;
        };
        let bone_radius = rump
            .bone_radii
            .get(bone)
            .map(|r| r * ctx.sizing.radius_scale)
            .or_else(|| ctx.bone_radius(bone))
            .unwrap_or(0.0);
        floor = floor.max(root.distance(position) + bone_radius + rump.extra_margin);
    }
    floor
}
