//! Limb: root-to-tip tube with optional per-segment rings and a tip flare

use crate::frame::FramePolicy;
use crate::options::LimbOptions;
use crate::radius::{RadiusSpec, expand};
use crate::tube::{SkinWeighting, TubeSkin, TubeSpec, build_tube};

use super::{GeneratedPart, PartContext, subdivide};

pub fn generate(ctx: &PartContext, options: &LimbOptions) -> GeneratedPart {
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
    let spec = ctx.radius_spec(declared);
    let flared = spec.as_ref().is_some_and(|s| s.is_flared(n));

    let (mut centers, mut coords) = subdivide(points, options.rings_per_segment);
    if flared {
        // Flare ring just past the tip, owned by the tip joint
        let tip = points[n - 1];
        let last_segment = tip - points[n - 2];
        centers.push(tip + last_segment * options.flare_length);
        coords.push((n - 1) as f32);
    }

    let radii = expand(spec.as_ref(), centers.len(), n, ctx.default_radius());

    let skin = TubeSkin {
        joints: &ctx.chain.joints,
        ring_coords: coords,
        weighting: SkinWeighting::BlendAdjacentBones,
    };
    let geometry = build_tube(
        &TubeSpec::new(&centers, &radii)
            .frames(FramePolicy::FixedAxis)
            .sides(options.sides)
            .caps(options.cap_start, options.cap_end)
            .skin(skin),
    );

    GeneratedPart::new(geometry, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::{Rig, assert_skin_normalized, line};
    use glam::Vec3;

    fn ring_radius(part: &GeneratedPart, ring: usize, sides: usize, center: Vec3) -> f32 {
        Vec3::from(part.geometry.positions[ring * sides]).distance(center)
    }

    #[test]
    fn test_flare_radius_on_final_ring() {
        let rig = Rig::new(&line(4));
        let ctx = rig.context("leg", &["b0", "b1", "b2", "b3"]);
        let options = LimbOptions {
            radii: Some(vec![0.5, 0.45, 0.4, 0.38, 0.43]),
            sides: 6,
            cap_end: false,
            ..Default::default()
        };
        let part = generate(&ctx, &options);
        assert_eq!(part.geometry.vertex_count(), 5 * 6);
        let tip = ctx.chain.points[3];
        assert!((ring_radius(&part, 3, 6, tip) - 0.38).abs() < 1e-5);
        let flare_center = tip + Vec3::Z * 0.15;
        assert!((ring_radius(&part, 4, 6, flare_center) - 0.43).abs() < 1e-5);
        assert_skin_normalized(&part.geometry);
    }

    #[test]
    fn test_rings_per_segment_blend_only_bounding_joints() {
        let rig = Rig::new(&line(3));
        let ctx = rig.context("leg", &["b0", "b1", "b2"]);
        let options = LimbOptions {
            radii: Some(vec![0.3, 0.2, 0.1]),
            sides: 4,
            rings_per_segment: 4,
            cap_end: false,
            ..Default::default()
        };
        let part = generate(&ctx, &options);
        let g = &part.geometry;
        assert_eq!(g.vertex_count(), 9 * 4);
        assert_skin_normalized(g);
        for ring in 0..9 {
            let skin = g.skin(ring * 4).unwrap();
            let segment = (ring / 4).min(1) as u16;
            for (joint, weight) in skin.indices.iter().zip(&skin.weights) {
                if *weight > 0.0 {
                    assert!(*joint == segment || *joint == segment + 1);
                }
            }
        }
        // Radius halfway along the first segment is interpolated
        let mid = ctx.chain.points[0].lerp(ctx.chain.points[1], 0.5);
        assert!((ring_radius(&part, 2, 4, mid) - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_limb_cap_end() {
        let rig = Rig::new(&line(2));
        let ctx = rig.context("leg", &["b0", "b1"]);
        let options = LimbOptions {
            sides: 5,
            ..Default::default()
        };
        let part = generate(&ctx, &options);
        assert_eq!(part.geometry.vertex_count(), 2 * 5 + 6);
    }
}
