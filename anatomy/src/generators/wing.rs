//! Wing: a membrane grid hanging off the arm chain
//!
//! Rows follow the chain bones, columns step outward along a cross-chain
//! direction. Every row is pinned to its own bone so the membrane folds with
//! the arm. With `doubleSided` a second sheet is laid under the first with
//! reversed winding.

use glam::Vec3;

use crate::frame::path_tangents;
use crate::geometry::{MeshBuilder, MeshBuilderSkinned, PartGeometry, SkinInfluence};
use crate::options::WingOptions;

use super::{GeneratedPart, PartContext};

/// Direction used when no override is given and the chain allows it
const DEFAULT_SPREAD: Vec3 = Vec3::NEG_Z;

pub fn generate(ctx: &PartContext, options: &WingOptions) -> GeneratedPart {
    let points = &ctx.chain.points;
    let rows = points.len();
    if rows < 2 {
        return ctx.placeholder(2);
    }

    let columns = options.membrane_resolution.max(1) as usize + 1;
    let span = options.span * ctx.sizing.radius_scale;
    let override_dir = options
        .direction
        .and_then(|d| Vec3::from(d).try_normalize());
    let tangents = path_tangents(points);

    let mut geometry = PartGeometry::new();
    for (i, (&point, &tangent)) in points.iter().zip(&tangents).enumerate() {
        let t = i as f32 / (rows - 1) as f32;
        let spread = override_dir.unwrap_or_else(|| spread_direction(tangent));
        let width = span * options.thickness_profile.at(t);
        let skin = SkinInfluence::single(ctx.chain.joints[i]);
        for c in 0..columns {
            let u = c as f32 / (columns - 1) as f32;
            geometry.add_vertex_skinned(point + spread * width * u, (u, t), Vec3::Y, skin);
        }
    }

    for i in 0..rows - 1 {
        for c in 0..columns - 1 {
            let v00 = (i * columns + c) as u32;
            let v01 = v00 + 1;
            let v10 = v00 + columns as u32;
            let v11 = v10 + 1;
            geometry.add_triangle(v00, v10, v11);
            geometry.add_triangle(v00, v11, v01);
        }
    }
    geometry.compute_normals();

    if options.double_sided {
        add_back_sheet(&mut geometry, options.thickness * ctx.sizing.radius_scale);
    }

    GeneratedPart::new(geometry, Vec::new())
}

/// Default spread: backward, kept perpendicular to the bone
fn spread_direction(tangent: Vec3) -> Vec3 {
    DEFAULT_SPREAD
        .reject_from_normalized(tangent)
        .try_normalize()
        .unwrap_or(Vec3::NEG_Y)
}

/// Copy of the front sheet, offset behind it, facing the other way
fn add_back_sheet(geometry: &mut PartGeometry, thickness: f32) {
    let count = geometry.vertex_count();
    for v in 0..count {
        let normal = Vec3::from(geometry.normals[v]);
        let position = Vec3::from(geometry.positions[v]) - normal * thickness;
        let uv = geometry.uvs[v];
        let skin = geometry.skin(v).unwrap_or_default();
        geometry.add_vertex_skinned(position, (uv[0], uv[1]), -normal, skin);
    }
    let front: Vec<u32> = geometry.indices.clone();
    for tri in front.chunks_exact(3) {
        let base = count as u32;
        geometry.add_triangle(tri[0] + base, tri[2] + base, tri[1] + base);
    }
}
