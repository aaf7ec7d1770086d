//! Mesh modifiers for part geometry
//!
//! Modifiers operate on [`PartGeometry`] in place and keep every attribute,
//! skin data included, consistent with the positions they touch.
//!
//! # Fluent API
//!
//! Use the [`MeshApply`] extension trait for method chaining:
//! ```no_run
//! use creature_anatomy::modifiers::*;
//! use creature_anatomy::geometry::PartGeometry;
//!
//! let mut part = PartGeometry::new();
//! part.apply(Transform::scale(1.0, 0.3, 1.0))
//!     .apply(RecomputeNormals);
//! ```

use glam::{Mat4, Vec3};
use hashbrown::HashMap;

use crate::geometry::{MAX_INFLUENCES, PartGeometry, SkinInfluence};

/// Trait for mesh modifiers
pub trait MeshModifier {
    /// Apply this modifier to a part, modifying it in place
    fn apply(&self, mesh: &mut PartGeometry);
}

/// Extension trait for fluent modifier application
pub trait MeshApply {
    /// Apply a modifier and return `&mut Self` for chaining
    fn apply<M: MeshModifier>(&mut self, modifier: M) -> &mut Self;
}

impl MeshApply for PartGeometry {
    fn apply<M: MeshModifier>(&mut self, modifier: M) -> &mut Self {
        modifier.apply(self);
        self
    }
}

/// Transform vertices and normals using a 4x4 matrix
///
/// Normals are transformed using the inverse-transpose to handle non-uniform
/// scaling correctly. UVs and skin data are unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    matrix: Mat4,
}

impl Transform {
    /// Create a non-uniform scale transform
    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        Self {
            matrix: Mat4::from_scale(Vec3::new(x, y, z)),
        }
    }

    /// Apply `local` about `pivot`: `T(pivot) * local * T(-pivot)`
    pub fn about_pivot(pivot: Vec3, local: Mat4) -> Self {
        Self {
            matrix: Mat4::from_translation(pivot) * local * Mat4::from_translation(-pivot),
        }
    }
}

impl MeshModifier for Transform {
    fn apply(&self, mesh: &mut PartGeometry) {
        let normal_matrix = self.matrix.inverse().transpose();

        for pos in &mut mesh.positions {
            *pos = self.matrix.transform_point3(Vec3::from(*pos)).to_array();
        }

        for norm in &mut mesh.normals {
            let n = normal_matrix.transform_vector3(Vec3::from(*norm));
            *norm = n.try_normalize().unwrap_or(Vec3::Y).to_array();
        }

        // A mirroring matrix turns every triangle inside out
        if self.matrix.determinant() < 0.0 {
            if mesh.is_indexed() {
                for tri in mesh.indices.chunks_exact_mut(3) {
                    tri.swap(1, 2);
                }
            } else {
                *mesh = flip_non_indexed(mesh);
            }
        }
    }
}

fn flip_non_indexed(mesh: &PartGeometry) -> PartGeometry {
    let mut out = mesh.clone();
    out.indices = mesh
        .triangles()
        .into_iter()
        .flat_map(|[a, b, c]| [a as u32, c as u32, b as u32])
        .collect();
    out
}

/// Recompute smooth normals from area-weighted face normals
pub struct RecomputeNormals;

impl MeshModifier for RecomputeNormals {
    fn apply(&self, mesh: &mut PartGeometry) {
        mesh.compute_normals();
    }
}

/// Convert to flat shading by duplicating vertices (one normal per triangle)
///
/// The result is non-indexed; UVs and skin data follow their vertices.
pub struct FlatNormals;

impl MeshModifier for FlatNormals {
    fn apply(&self, mesh: &mut PartGeometry) {
        let mut flat = mesh.to_non_indexed();
        flat.normals = Vec::with_capacity(flat.positions.len());

        for tri in flat.positions.chunks_exact(3) {
            let p0 = Vec3::from(tri[0]);
            let p1 = Vec3::from(tri[1]);
            let p2 = Vec3::from(tri[2]);
            let face = (p1 - p0).cross(p2 - p0).try_normalize().unwrap_or(Vec3::Y);
            flat.normals.extend([face.to_array(); 3]);
        }

        *mesh = flat;
    }
}

/// Merge vertices that fall in the same `tolerance`-sized cell
///
/// Positions are quantized to a grid; every vertex in a cell collapses onto
/// the first one seen. Merged normals are averaged. Merged skin influences
/// are summed per joint, cut to the four strongest, and renormalized, so all
/// references to the kept vertex deform identically. Triangles that collapse
/// are dropped.
pub struct WeldVertices {
    pub tolerance: f32,
}

impl MeshModifier for WeldVertices {
    fn apply(&self, mesh: &mut PartGeometry) {
        if self.tolerance.is_nan() || self.tolerance <= 0.0 || mesh.is_empty() {
            return;
        }

        let has_normals = mesh.has_normals();
        let has_uvs = mesh.has_uvs();
        let has_skin = mesh.has_skin();

        let mut cells: HashMap<[i64; 3], u32> = HashMap::new();
        let mut remap = Vec::with_capacity(mesh.positions.len());
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for (i, p) in mesh.positions.iter().enumerate() {
            let key = [
                (p[0] / self.tolerance).round() as i64,
                (p[1] / self.tolerance).round() as i64,
                (p[2] / self.tolerance).round() as i64,
            ];
            let next = groups.len() as u32;
            let slot = *cells.entry(key).or_insert(next);
            if slot == next {
                groups.push(Vec::new());
            }
            groups[slot as usize].push(i);
            remap.push(slot);
        }

        let mut welded = PartGeometry::new();
        for group in &groups {
            let first = group[0];
            welded.positions.push(mesh.positions[first]);
            if has_normals {
                let sum: Vec3 = group.iter().map(|&i| Vec3::from(mesh.normals[i])).sum();
                let n = sum
                    .try_normalize()
                    .unwrap_or_else(|| Vec3::from(mesh.normals[first]));
                welded.normals.push(n.to_array());
            }
            if has_uvs {
                welded.uvs.push(mesh.uvs[first]);
            }
            if has_skin {
                let skin = merge_influences(group.iter().filter_map(|&i| mesh.skin(i)));
                welded.skin_indices.push(skin.indices);
                welded.skin_weights.push(skin.weights);
            }
        }

        for [a, b, c] in mesh.triangles() {
            let (a, b, c) = (remap[a], remap[b], remap[c]);
            if a != b && b != c && a != c {
                welded.indices.extend([a, b, c]);
            }
        }

        tracing::debug!(
            "weld: {} -> {} vertices (tolerance {})",
            mesh.positions.len(),
            welded.positions.len(),
            self.tolerance
        );
        *mesh = welded;
    }
}

/// Sum weights per joint, keep the strongest four, renormalize
fn merge_influences(influences: impl Iterator<Item = SkinInfluence>) -> SkinInfluence {
    let mut totals: Vec<(u16, f32)> = Vec::new();
    for influence in influences {
        for (&joint, &weight) in influence.indices.iter().zip(&influence.weights) {
            if weight <= 0.0 {
                continue;
            }
            match totals.iter_mut().find(|(j, _)| *j == joint) {
                Some((_, total)) => *total += weight,
                None => totals.push((joint, weight)),
            }
        }
    }
    totals.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut merged = SkinInfluence {
        indices: [0; MAX_INFLUENCES],
        weights: [0.0; MAX_INFLUENCES],
    };
    for (slot, (joint, weight)) in totals.into_iter().take(MAX_INFLUENCES).enumerate() {
        merged.indices[slot] = joint;
        merged.weights[slot] = weight;
    }
    merged.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MeshBuilder, MeshBuilderSkinned};
    use crate::primitives::unit_sphere;

    #[test]
    fn test_transform_scale() {
        let mut mesh = unit_sphere(8, 4);
        Transform::scale(2.0, 2.0, 2.0).apply(&mut mesh);
        let max_x = mesh.positions.iter().map(|p| p[0].abs()).fold(0.0f32, f32::max);
        assert!((max_x - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_transform_about_pivot_keeps_pivot() {
        let mut mesh = PartGeometry::new();
        mesh.add_vertex(Vec3::new(1.0, 2.0, 3.0), Vec3::X);
        mesh.add_vertex(Vec3::new(2.0, 2.0, 3.0), Vec3::X);
        Transform::about_pivot(Vec3::new(1.0, 2.0, 3.0), Mat4::from_scale(Vec3::splat(3.0)))
            .apply(&mut mesh);
        assert_eq!(mesh.positions[0], [1.0, 2.0, 3.0]);
        assert_eq!(mesh.positions[1], [4.0, 2.0, 3.0]);
    }

    #[test]
    fn test_mirroring_transform_keeps_outward_winding() {
        let mut mesh = unit_sphere(8, 4);
        Transform::scale(-1.0, 1.0, 1.0).apply(&mut mesh);
        mesh.compute_normals();
        for (n, p) in mesh.normals.iter().zip(&mesh.positions) {
            assert!(Vec3::from(*n).dot(Vec3::from(*p)) > 0.0);
        }
    }

    #[test]
    fn test_flat_normals_per_triangle_normal() {
        let mut mesh = unit_sphere(8, 4);
        let triangles = mesh.triangle_count();
        FlatNormals.apply(&mut mesh);
        assert_eq!(mesh.vertex_count(), triangles * 3);
        for tri in mesh.normals.chunks_exact(3) {
            assert_eq!(tri[0], tri[1]);
            assert_eq!(tri[1], tri[2]);
        }
    }

    #[test]
    fn test_weld_merges_skin_consistently() {
        let mut mesh = PartGeometry::new();
        let a = mesh.add_vertex_skinned(Vec3::ZERO, (0.0, 0.0), Vec3::Y, SkinInfluence::single(1));
        let b = mesh.add_vertex_skinned(Vec3::X, (1.0, 0.0), Vec3::Y, SkinInfluence::single(1));
        let c = mesh.add_vertex_skinned(Vec3::Z, (0.0, 1.0), Vec3::Y, SkinInfluence::single(1));
        // Near-duplicate of `a` owned by another joint
        let d = mesh.add_vertex_skinned(
            Vec3::splat(0.001),
            (0.0, 0.0),
            Vec3::Y,
            SkinInfluence::single(2),
        );
        let e = mesh.add_vertex_skinned(Vec3::NEG_X, (0.0, 0.0), Vec3::Y, SkinInfluence::single(2));
        mesh.add_triangle(a, c, b);
        mesh.add_triangle(d, e, c);

        WeldVertices { tolerance: 0.01 }.apply(&mut mesh);

        assert_eq!(mesh.vertex_count(), 4);
        let welded = mesh.skin(0).unwrap();
        assert!((welded.weight_sum() - 1.0).abs() < 1e-6);
        assert_eq!(&welded.indices[..2], &[1, 2]);
        assert!((welded.weights[0] - 0.5).abs() < 1e-6);
        for &i in &mesh.indices {
            assert!((i as usize) < mesh.vertex_count());
        }
    }

    #[test]
    fn test_weld_disabled_for_zero_tolerance() {
        let mut mesh = unit_sphere(8, 4);
        let before = mesh.clone();
        WeldVertices { tolerance: 0.0 }.apply(&mut mesh);
        assert_eq!(mesh, before);
    }
}
