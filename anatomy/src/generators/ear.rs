//! Ear: a limb tube flattened into a flap and fanned about the up axis

use glam::{Mat4, Vec3};

use crate::modifiers::Transform;
use crate::options::{EarOptions, Side};

use super::{GeneratedPart, PartContext, limb, then_transform};

pub fn generate(ctx: &PartContext, options: &EarOptions) -> GeneratedPart {
    let part = limb::generate(ctx, &options.limb);
    if part.placeholder {
        return part;
    }
    let Some(pivot) = ctx.chain.root() else {
        return part;
    };

    let side = options.side.or_else(|| infer_side(ctx)).unwrap_or(Side::Left);
    then_transform(part, Transform::about_pivot(pivot, ear_matrix(options, side)))
}

/// Fan rotation followed by the flattening scale
///
/// The declared tilt magnitude is used; its sign comes from the side, so a
/// left and right pair always fan out symmetrically.
fn ear_matrix(options: &EarOptions, side: Side) -> Mat4 {
    let tilt = match side {
        Side::Left => options.tilt.abs(),
        Side::Right => -options.tilt.abs(),
    };
    Mat4::from_scale(Vec3::new(1.0, 1.0, options.flatten)) * Mat4::from_rotation_y(tilt)
}

/// Side from the part, chain or root bone name
fn infer_side(ctx: &PartContext) -> Option<Side> {
    let chain_root = ctx
        .chain
        .joints
        .first()
        .and_then(|&j| ctx.skeleton.joint(j as usize))
        .map(|j| j.name.as_str());
    [Some(ctx.part), Some(ctx.chain.name.as_str()), chain_root]
        .into_iter()
        .flatten()
        .find_map(side_from_name)
}

fn side_from_name(name: &str) -> Option<Side> {
    let lower = name.to_ascii_lowercase();
    if lower.contains("left") {
        return Some(Side::Left);
    }
    if lower.contains("right") {
        return Some(Side::Right);
    }
    for sep in ['_', '.', '-'] {
        if lower.ends_with(&format!("{sep}l")) {
            return Some(Side::Left);
        }
        if lower.ends_with(&format!("{sep}r")) {
            return Some(Side::Right);
        }
    }
    // camelCase suffix: earL, earR
    let mut chars = name.chars().rev();
    match (chars.next(), chars.next()) {
        (Some('L'), Some(prev)) if prev.is_ascii_lowercase() => Some(Side::Left),
        (Some('R'), Some(prev)) if prev.is_ascii_lowercase() => Some(Side::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::{Rig, assert_skin_normalized};
    use crate::options::LimbOptions;
    use crate::skeleton::BoneDef;

    fn ear_rig() -> Rig {
        Rig::new(&[
            BoneDef::new("head", None, [0.0, 2.0, 0.0]),
            BoneDef::new("ear_l", Some("head"), [0.5, 0.0, 0.0]),
            BoneDef::new("ear_l_tip", Some("ear_l"), [1.0, 0.0, 0.0]),
            BoneDef::new("ear_r", Some("head"), [-0.5, 0.0, 0.0]),
            BoneDef::new("ear_r_tip", Some("ear_r"), [-1.0, 0.0, 0.0]),
        ])
    }

    fn options(tilt: f32) -> EarOptions {
        EarOptions {
            limb: LimbOptions {
                radii: Some(vec![0.4, 0.4]),
                sides: 8,
                cap_end: false,
                ..Default::default()
            },
            flatten: 0.25,
            tilt,
            side: None,
        }
    }

    #[test]
    fn test_side_from_name() {
        assert_eq!(side_from_name("earLeft"), Some(Side::Left));
        assert_eq!(side_from_name("ear_right"), Some(Side::Right));
        assert_eq!(side_from_name("ear_l"), Some(Side::Left));
        assert_eq!(side_from_name("ear.R"), Some(Side::Right));
        assert_eq!(side_from_name("earR"), Some(Side::Right));
        assert_eq!(side_from_name("ear"), None);
        assert_eq!(side_from_name("ROAR"), None);
    }

    #[test]
    fn test_ear_is_flattened() {
        let rig = ear_rig();
        let ctx = rig.context("ear", &["ear_l", "ear_l_tip"]);
        let part = generate(&ctx, &options(0.0));
        let (min, max) = part.geometry.bounds().unwrap();
        let extent = max - min;
        // Chain runs along X; the flap is thin in Z
        assert!((extent.y - 0.8).abs() < 1e-3);
        assert!((extent.z - 0.2).abs() < 1e-3);
        assert_skin_normalized(&part.geometry);
    }

    #[test]
    fn test_ear_pair_is_mirror_symmetric() {
        let rig = ear_rig();
        let left_ctx = rig.context("earLeft", &["ear_l", "ear_l_tip"]);
        let right_ctx = rig.context("earRight", &["ear_r", "ear_r_tip"]);
        let left = generate(&left_ctx, &options(0.6));
        let right = generate(&right_ctx, &options(-0.6));
        let (lmin, lmax) = left.geometry.bounds().unwrap();
        let (rmin, rmax) = right.geometry.bounds().unwrap();
        assert!((lmax.x + rmin.x).abs() < 1e-3);
        assert!((lmin.x + rmax.x).abs() < 1e-3);
        assert!((lmin.z - rmin.z).abs() < 1e-3);
        assert!((lmax.z - rmax.z).abs() < 1e-3);
    }

    #[test]
    fn test_ear_pivot_stays_at_root() {
        let rig = ear_rig();
        let ctx = rig.context("ear", &["ear_l", "ear_l_tip"]);
        let part = generate(&ctx, &options(0.8));
        let root = ctx.chain.points[0];
        let first_ring_center = part.geometry.positions[..8]
            .iter()
            .fold(Vec3::ZERO, |acc, p| acc + Vec3::from(*p))
            / 8.0;
        assert!(first_ring_center.distance(root) < 1e-4);
    }

    #[test]
    fn test_ear_normals_unit_length() {
        let rig = ear_rig();
        let ctx = rig.context("ear", &["ear_r", "ear_r_tip"]);
        let part = generate(&ctx, &options(0.3));
        for n in &part.geometry.normals {
            assert!((Vec3::from(*n).length() - 1.0).abs() < 1e-4);
        }
    }
}
