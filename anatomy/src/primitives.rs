//! Parametric primitives used by part generators

use glam::{Mat3, Vec3};
use std::f32::consts::{PI, TAU};

use crate::geometry::{MeshBuilder, MeshBuilderSkinned, PartGeometry, SkinInfluence};
use crate::tube::{SkinWeighting, TubeSkin, TubeSpec, build_tube};

/// Radius of the placeholder when no default radius is configured
pub const PLACEHOLDER_RADIUS: f32 = 0.1;

/// Side count of the placeholder cylinder
pub const PLACEHOLDER_SIDES: u32 = 8;

/// Ellipsoid around `center`, fully skinned to `joint`
///
/// The columns of `axes` are the semi-axis vectors; the second column is the
/// pole axis. Each pole is a single vertex closed by a triangle fan, and the
/// `rings - 1` latitude rings in between carry a duplicate seam vertex at
/// U=1.0. Normals come from the inverse-transpose of `axes`, so they stay
/// perpendicular to the surface under non-uniform scaling.
pub fn ellipsoid(center: Vec3, axes: Mat3, segments: u32, rings: u32, joint: u16) -> PartGeometry {
    let segments = segments.clamp(3, 256);
    let rings = rings.clamp(2, 256);
    let normal_matrix = if axes.determinant().abs() > f32::EPSILON {
        axes.inverse().transpose()
    } else {
        Mat3::IDENTITY
    };
    let skin = SkinInfluence::single(joint);
    let mut mesh = PartGeometry::new();
    let emit = |mesh: &mut PartGeometry, unit: Vec3, uv: (f32, f32)| {
        let normal = (normal_matrix * unit).try_normalize().unwrap_or(unit);
        mesh.add_vertex_skinned(center + axes * unit, uv, normal, skin)
    };

    let top = emit(&mut mesh, Vec3::Y, (0.5, 0.0));
    let stride = segments + 1;
    let first = top + 1;
    for ring in 1..rings {
        let v = ring as f32 / rings as f32;
        let (sin_phi, cos_phi) = (v * PI).sin_cos();
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let (sin_theta, cos_theta) = (u * TAU).sin_cos();
            let unit = Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
            emit(&mut mesh, unit, (u, v));
        }
    }
    let bottom = emit(&mut mesh, Vec3::NEG_Y, (0.5, 1.0));

    let last = first + (rings - 2) * stride;
    for seg in 0..segments {
        mesh.add_triangle(top, first + seg + 1, first + seg);
        mesh.add_triangle(last + seg, last + seg + 1, bottom);
    }
    for ring in 0..rings - 2 {
        let a = first + ring * stride;
        let b = a + stride;
        for seg in 0..segments {
            mesh.add_triangle(a + seg, a + seg + 1, b + seg + 1);
            mesh.add_triangle(a + seg, b + seg + 1, b + seg);
        }
    }

    mesh
}

/// Unit sphere at the origin skinned to joint 0, for modifier and merge tests
#[cfg(test)]
pub(crate) fn unit_sphere(segments: u32, rings: u32) -> PartGeometry {
    ellipsoid(Vec3::ZERO, Mat3::IDENTITY, segments, rings, 0)
}

/// Short capped cylinder standing in for a part that could not be generated
///
/// Runs `4 × radius` along +Y from `base`, fully skinned to `joint`.
pub fn placeholder(base: Vec3, radius: f32, joint: u16) -> PartGeometry {
    let radius = if radius > 0.0 && radius.is_finite() {
        radius
    } else {
        PLACEHOLDER_RADIUS
    };
    let points = [base, base + Vec3::Y * radius * 4.0];
    let radii = [radius; 2];
    let joints = [joint];
    let skin = TubeSkin {
        joints: &joints,
        ring_coords: vec![0.0, 0.0],
        weighting: SkinWeighting::PinToNearestBone,
    };
    build_tube(
        &TubeSpec::new(&points, &radii)
            .sides(PLACEHOLDER_SIDES)
            .caps(true, true)
            .skin(skin),
    )
}
