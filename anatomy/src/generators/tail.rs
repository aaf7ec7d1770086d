//! Tails, noses, trunks and tusks
//!
//! Curved, flexible parts: parallel-transport frames so rings do not twist,
//! and each ring pinned to a single joint so thin geometry does not crawl
//! between bones.

use glam::Vec3;

use crate::chain::ResolvedChain;
use crate::frame::FramePolicy;
use crate::options::TailOptions;
use crate::radius::{RadiusSpec, expand};
use crate::report::BuildWarning;
use crate::tube::{SkinWeighting, TubeSkin, TubeSpec, build_tube};

use super::{GeneratedPart, PartContext};

pub fn generate(ctx: &PartContext, options: &TailOptions) -> GeneratedPart {
    let mut chain = ctx.chain.clone();
    let mut warnings = Vec::new();
    if let Some(root) = options.root_bone.as_deref() {
        if !prepend_root(ctx, &mut chain, root) {
            warnings.push(BuildWarning::MissingRootBone {
                part: ctx.part.to_string(),
                candidates: vec![root.to_string()],
            });
        }
    }
    build(ctx, options, chain, warnings)
}

/// Tail rooted on the first available bone of a preference list
pub fn generate_nose(ctx: &PartContext, options: &TailOptions) -> GeneratedPart {
    let mut chain = ctx.chain.clone();
    let mut warnings = Vec::new();

    let candidates: Vec<&str> = options
        .root_bone
        .as_deref()
        .into_iter()
        .chain(options.root_bone_candidates.iter().map(String::as_str))
        .collect();
    let root = candidates
        .iter()
        .copied()
        .find(|bone| ctx.skeleton.index_of(bone).is_some());

    match root {
        Some(bone) => {
            prepend_root(ctx, &mut chain, bone);
        }
        None => warnings.push(BuildWarning::MissingRootBone {
            part: ctx.part.to_string(),
            candidates: candidates.iter().map(|s| s.to_string()).collect(),
        }),
    }
    build(ctx, options, chain, warnings)
}

/// Put `bone` ahead of the chain unless it is already there
fn prepend_root(ctx: &PartContext, chain: &mut ResolvedChain, bone: &str) -> bool {
    let Some(index) = ctx.skeleton.index_of(bone) else {
        return false;
    };
    if !chain.joints.contains(&(index as u16)) {
        chain.prepend(ctx.pose.world_position(index), index as u16);
    }
    true
}

fn radius_spec(options: &TailOptions, default_radius: f32) -> Option<RadiusSpec> {
    if let Some(radii) = options.radii.clone().filter(|r| !r.is_empty()) {
        return Some(RadiusSpec::Explicit(radii));
    }
    if options.base_radius.is_none() && options.mid_radius.is_none() && options.tip_radius.is_none() {
        return None;
    }
    let base = options.base_radius.unwrap_or(default_radius);
    Some(RadiusSpec::Tapered {
        base,
        mid: options.mid_radius,
        tip: options.tip_radius.unwrap_or(base * 0.5),
    })
}

fn build(
    ctx: &PartContext,
    options: &TailOptions,
    chain: ResolvedChain,
    warnings: Vec<BuildWarning>,
) -> GeneratedPart {
    let n = chain.len();
    if n < 2 {
        let mut part = ctx.placeholder(2);
        let mut all = warnings;
        all.append(&mut part.warnings);
        part.warnings = all;
        return part;
    }

    let root = chain.points[0];
    let offset = Vec3::Y * options.y_offset;
    let points: Vec<Vec3> = chain
        .points
        .iter()
        .map(|&p| root + (p - root) * options.length_scale + offset)
        .collect();

    let spec = ctx.radius_spec(radius_spec(options, ctx.sizing.default_radius));
    let radii = expand(spec.as_ref(), n, n, ctx.default_radius());

    let geometry = build_tube(
        &TubeSpec::new(&points, &radii)
            .frames(FramePolicy::ParallelTransport)
            .sides(options.sides)
            .caps(false, options.cap_end)
            .skin(TubeSkin::per_bone(&chain.joints, SkinWeighting::PinToNearestBone)),
    );

    GeneratedPart::new(geometry, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::{Rig, assert_skin_normalized, line};
    use crate::geometry::SkinInfluence;
    use crate::skeleton::BoneDef;

    fn trunk_rig() -> Rig {
        let mut bones = line(2);
        bones.push(BoneDef::new("head", Some("b1"), [0.0, 0.0, 0.5]));
        bones.push(BoneDef::new("trunk_base", Some("head"), [0.0, -0.3, 0.4]));
        bones.push(BoneDef::new("trunk_mid", Some("trunk_base"), [0.0, -0.6, 0.2]));
        bones.push(BoneDef::new("trunk_tip", Some("trunk_mid"), [0.0, -0.6, -0.1]));
        Rig::new(&bones)
    }

    #[test]
    fn test_tail_pins_each_ring() {
        let rig = Rig::new(&line(4));
        let ctx = rig.context("tail", &["b0", "b1", "b2", "b3"]);
        let options = TailOptions {
            base_radius: Some(0.15),
            tip_radius: Some(0.05),
            sides: 6,
            cap_end: false,
            ..Default::default()
        };
        let part = generate(&ctx, &options);
        let g = &part.geometry;
        assert_eq!(g.vertex_count(), 4 * 6);
        assert_skin_normalized(g);
        for ring in 0..4 {
            assert_eq!(g.skin(ring * 6).unwrap(), SkinInfluence::single(ring as u16));
        }
    }

    #[test]
    fn test_nose_resolves_root_candidate() {
        let rig = trunk_rig();
        let ctx = rig.context("trunk", &["trunk_mid", "trunk_tip"]);
        let part = generate_nose(&ctx, &TailOptions::default());
        assert!(part.warnings.is_empty());
        // trunk_anchor is absent, trunk_base is next in line
        let trunk_base = rig.skeleton.index_of("trunk_base").unwrap() as u16;
        assert_eq!(part.geometry.skin(0).unwrap(), SkinInfluence::single(trunk_base));
        assert_eq!(part.geometry.vertex_count(), 3 * 12 + 13);
    }

    #[test]
    fn test_nose_without_root_warns_and_still_builds() {
        let rig = Rig::new(&line(3));
        let ctx = rig.context("trunk", &["b1", "b2"]);
        let options = TailOptions {
            root_bone_candidates: vec!["nowhere".into()],
            ..Default::default()
        };
        let part = generate_nose(&ctx, &options);
        assert!(matches!(part.warnings[0], BuildWarning::MissingRootBone { .. }));
        assert!(!part.placeholder);
    }

    #[test]
    fn test_length_scale_extends_from_root() {
        let rig = Rig::new(&line(3));
        let ctx = rig.context("tail", &["b0", "b1", "b2"]);
        let options = TailOptions {
            length_scale: 2.0,
            y_offset: 0.5,
            cap_end: false,
            sides: 4,
            ..Default::default()
        };
        let part = generate(&ctx, &options);
        let (min, max) = part.geometry.bounds().unwrap();
        assert!((max.z - min.z - 4.0).abs() < 1e-4);
        let center_y = (min.y + max.y) * 0.5;
        assert!((center_y - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_trunk_frames_do_not_twist() {
        let rig = trunk_rig();
        let ctx = rig.context("trunk", &["trunk_base", "trunk_mid", "trunk_tip"]);
        let options = TailOptions {
            sides: 8,
            ..Default::default()
        };
        let part = generate_nose(&ctx, &options);
        let g = &part.geometry;
        // The path lies in x = 0; vertex 0 of every ring stays on the same side
        for ring in 0..2 {
            let a = g.positions[ring * 8][0];
            let b = g.positions[(ring + 1) * 8][0];
            assert!(a * b > 0.0);
        }
    }
}
