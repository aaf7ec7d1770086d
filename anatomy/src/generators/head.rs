//! Head: an ellipsoid oriented along the neck→head direction
//!
//! Not a tube. An ellipsoid whose pole axis follows the incoming neck
//! direction, skinned entirely to one joint.

use glam::{Mat3, Vec3};

use crate::frame::fixed_axis_frame;
use crate::options::HeadOptions;
use crate::primitives::ellipsoid;

use super::{GeneratedPart, PartContext};

pub fn generate(ctx: &PartContext, options: &HeadOptions) -> GeneratedPart {
    let Some((joint, center)) = head_joint(ctx, options) else {
        return ctx.placeholder(1);
    };

    let forward = forward_direction(ctx, joint, center);
    let frame = fixed_axis_frame(forward);
    let radius = if options.radius > 0.0 {
        options.radius * ctx.sizing.radius_scale
    } else {
        ctx.default_radius()
    };

    // Pole axis follows the neck; columns stay right-handed
    let axes = Mat3::from_cols(
        frame.basis_a * options.width_scale * radius,
        frame.tangent * options.elongation * radius,
        -frame.basis_b * options.height_scale * radius,
    );

    let segments = (options.sides * (options.detail + 1) / 2).clamp(6, 128);
    let rings = (segments / 2).max(3);
    let geometry = ellipsoid(center, axes, segments, rings, joint as u16);

    GeneratedPart::new(geometry, Vec::new())
}

/// Joint the head sits on: `parentBone` when present, else the chain tip
fn head_joint(ctx: &PartContext, options: &HeadOptions) -> Option<(usize, Vec3)> {
    let from_option = options
        .parent_bone
        .as_deref()
        .and_then(|bone| ctx.skeleton.index_of(bone));
    let joint = from_option.or_else(|| ctx.chain.joints.last().map(|&j| j as usize))?;
    Some((joint, ctx.pose.world_position(joint)))
}

/// Incoming direction: previous chain point, else skeleton parent, else +Z
fn forward_direction(ctx: &PartContext, joint: usize, center: Vec3) -> Vec3 {
    let previous = ctx
        .chain
        .joints
        .iter()
        .position(|&j| j as usize == joint)
        .filter(|&i| i > 0)
        .map(|i| ctx.chain.points[i - 1])
        .or_else(|| {
            ctx.skeleton
                .joint(joint)
                .and_then(|j| j.parent)
                .map(|p| ctx.pose.world_position(p))
        });
    previous
        .and_then(|p| (center - p).try_normalize())
        .unwrap_or(Vec3::Z)
}
