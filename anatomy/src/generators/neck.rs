//! Neck: thin blended tube from neck base to head

use crate::frame::FramePolicy;
use crate::options::NeckOptions;
use crate::radius::{RadiusSpec, expand};
use crate::tube::{SkinWeighting, TubeSkin, TubeSpec, build_tube};

use super::{GeneratedPart, PartContext};

pub fn generate(ctx: &PartContext, options: &NeckOptions) -> GeneratedPart {
    let points = &ctx.chain.points;
    let n = points.len();
    if n < 2 {
        return ctx.placeholder(2);
    }

    let declared = options
        .radii
        .clone()
        .filter(|r| !r.is_empty())
        .map(RadiusSpec::Explicit);
    let radii = expand(ctx.radius_spec(declared).as_ref(), n, n, ctx.default_radius());

    let geometry = build_tube(
        &TubeSpec::new(points, &radii)
            .frames(FramePolicy::FixedAxis)
            .sides(options.sides)
            .caps(options.cap_base, options.cap_end)
            .skin(TubeSkin::per_bone(&ctx.chain.joints, SkinWeighting::BlendAdjacentBones)),
    );

    GeneratedPart::new(geometry, Vec::new())
}
