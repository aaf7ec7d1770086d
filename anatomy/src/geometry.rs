//! Part geometry types
//!
//! Shared types for procedural part generation.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Maximum joint influences per vertex
pub const MAX_INFLUENCES: usize = 4;

/// Trait for mesh construction - enables generic geometry generation
///
/// Primitive generators (sphere, cylinder) are written against this trait so
/// they can emit into any builder, including [`PartGeometry`].
pub trait MeshBuilder: Default {
    /// Add a vertex with position and normal, returning its index
    fn add_vertex(&mut self, position: Vec3, normal: Vec3) -> u32;

    /// Add a triangle using three vertex indices
    fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32);
}

/// Trait extension for UV-mapped meshes
pub trait MeshBuilderUV: MeshBuilder {
    /// Add a vertex with position, UV coordinates, and normal, returning its index
    fn add_vertex_uv(&mut self, position: Vec3, uv: (f32, f32), normal: Vec3) -> u32;
}

/// Trait extension for skinned meshes (requires UV and normal)
pub trait MeshBuilderSkinned: MeshBuilderUV {
    /// Add a vertex with position, UV, normal and joint influences, returning its index
    fn add_vertex_skinned(
        &mut self,
        position: Vec3,
        uv: (f32, f32),
        normal: Vec3,
        skin: SkinInfluence,
    ) -> u32;
}

/// Joint indices and weights for one vertex.
///
/// Indices refer to the skeleton's joint order. Unused slots carry index 0
/// and weight 0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkinInfluence {
    pub indices: [u16; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

impl Default for SkinInfluence {
    fn default() -> Self {
        Self::single(0)
    }
}

impl SkinInfluence {
    /// Full weight on one joint
    pub fn single(joint: u16) -> Self {
        Self {
            indices: [joint, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }

    /// Weight `1 - t` on `a` and `t` on `b`
    ///
    /// Collapses to a single influence when both joints are the same or
    /// `t` sits at either end.
    pub fn blend(a: u16, b: u16, t: f32) -> Self {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        if a == b || t <= f32::EPSILON {
            return Self::single(a);
        }
        if t >= 1.0 - f32::EPSILON {
            return Self::single(b);
        }
        Self {
            indices: [a, b, 0, 0],
            weights: [1.0 - t, t, 0.0, 0.0],
        }
    }

    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Rescale weights to sum to one; an all-zero set falls back to joint 0
    pub fn normalized(mut self) -> Self {
        for w in &mut self.weights {
            if !w.is_finite() || *w < 0.0 {
                *w = 0.0;
            }
        }
        let sum = self.weight_sum();
        if sum <= f32::EPSILON {
            return Self::single(self.indices[0]);
        }
        for w in &mut self.weights {
            *w /= sum;
        }
        self
    }
}

/// Geometry produced by one part generator
///
/// Full-precision attribute arrays in the spirit of an unpacked mesh. Optional
/// attributes are empty when absent; the merge step fills them in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PartGeometry {
    /// Vertex positions as [x, y, z]
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals as [x, y, z] (empty if absent)
    pub normals: Vec<[f32; 3]>,
    /// UV coordinates as [u, v] (empty if absent)
    pub uvs: Vec<[f32; 2]>,
    /// Joint indices per vertex (empty if absent)
    pub skin_indices: Vec<[u16; MAX_INFLUENCES]>,
    /// Joint weights per vertex (empty if absent)
    pub skin_weights: Vec<[f32; MAX_INFLUENCES]>,
    /// Triangle indices (empty for non-indexed geometry)
    pub indices: Vec<u32>,
}

impl PartGeometry {
    /// Create empty geometry
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        if self.is_indexed() {
            self.indices.len() / 3
        } else {
            self.positions.len() / 3
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty() && self.uvs.len() == self.positions.len()
    }

    pub fn has_skin(&self) -> bool {
        self.skin_indices.len() == self.positions.len()
            && self.skin_weights.len() == self.positions.len()
            && !self.positions.is_empty()
    }

    pub fn skin(&self, vertex: usize) -> Option<SkinInfluence> {
        Some(SkinInfluence {
            indices: *self.skin_indices.get(vertex)?,
            weights: *self.skin_weights.get(vertex)?,
        })
    }

    /// Vertex index triples, whether or not the geometry is indexed
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        if self.is_indexed() {
            self.indices
                .chunks_exact(3)
                .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize])
                .collect()
        } else {
            (0..self.positions.len() / 3)
                .map(|t| [t * 3, t * 3 + 1, t * 3 + 2])
                .collect()
        }
    }

    /// Recompute smooth vertex normals from area-weighted face normals
    ///
    /// Vertices no face touches (or touched only by degenerate faces) get +Y.
    pub fn compute_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];
        for [i0, i1, i2] in self.triangles() {
            let p0 = Vec3::from(self.positions[i0]);
            let p1 = Vec3::from(self.positions[i1]);
            let p2 = Vec3::from(self.positions[i2]);
            // Unnormalized cross product weights by triangle area
            let face = (p1 - p0).cross(p2 - p0);
            if !face.is_finite() {
                continue;
            }
            accum[i0] += face;
            accum[i1] += face;
            accum[i2] += face;
        }
        self.normals = accum
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect();
    }

    /// Expand to non-indexed form (three unique vertices per triangle)
    pub fn to_non_indexed(&self) -> PartGeometry {
        if !self.is_indexed() {
            return self.clone();
        }

        let mut out = PartGeometry::new();
        let count = self.indices.len();
        out.positions.reserve(count);

        let has_normals = self.has_normals();
        let has_uvs = self.has_uvs();
        let has_skin = self.has_skin();

        for &idx in &self.indices {
            let i = idx as usize;
            out.positions.push(self.positions[i]);
            if has_normals {
                out.normals.push(self.normals[i]);
            }
            if has_uvs {
                out.uvs.push(self.uvs[i]);
            }
            if has_skin {
                out.skin_indices.push(self.skin_indices[i]);
                out.skin_weights.push(self.skin_weights[i]);
            }
        }

        out
    }

    /// Axis-aligned bounds of all positions, `None` when empty
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}

impl MeshBuilder for PartGeometry {
    fn add_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position.to_array());
        self.normals.push(normal.to_array());
        index
    }

    fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }
}

impl MeshBuilderUV for PartGeometry {
    fn add_vertex_uv(&mut self, position: Vec3, uv: (f32, f32), normal: Vec3) -> u32 {
        let index = self.add_vertex(position, normal);
        self.uvs.push([uv.0, uv.1]);
        index
    }
}

impl MeshBuilderSkinned for PartGeometry {
    fn add_vertex_skinned(
        &mut self,
        position: Vec3,
        uv: (f32, f32),
        normal: Vec3,
        skin: SkinInfluence,
    ) -> u32 {
        let index = self.add_vertex_uv(position, uv, normal);
        self.skin_indices.push(skin.indices);
        self.skin_weights.push(skin.weights);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> PartGeometry {
        let mut g = PartGeometry::new();
        let a = g.add_vertex(Vec3::new(0.0, 0.0, 0.0), Vec3::Z);
        let b = g.add_vertex(Vec3::new(1.0, 0.0, 0.0), Vec3::Z);
        let c = g.add_vertex(Vec3::new(1.0, 1.0, 0.0), Vec3::Z);
        let d = g.add_vertex(Vec3::new(0.0, 1.0, 0.0), Vec3::Z);
        g.add_triangle(a, b, c);
        g.add_triangle(a, c, d);
        g
    }

    #[test]
    fn test_blend_weights_sum_to_one() {
        for t in [0.0, 0.25, 0.5, 0.99, 1.0] {
            let s = SkinInfluence::blend(2, 3, t);
            assert!((s.weight_sum() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_blend_collapses_same_joint() {
        assert_eq!(SkinInfluence::blend(4, 4, 0.5), SkinInfluence::single(4));
    }

    #[test]
    fn test_normalized_handles_zero_weights() {
        let s = SkinInfluence {
            indices: [7, 0, 0, 0],
            weights: [0.0; 4],
        }
        .normalized();
        assert_eq!(s, SkinInfluence::single(7));
    }

    #[test]
    fn test_non_indexed_expands_triangles() {
        let g = quad();
        let flat = g.to_non_indexed();
        assert_eq!(flat.vertex_count(), 6);
        assert!(!flat.is_indexed());
        assert_eq!(flat.triangle_count(), 2);
        assert_eq!(flat.positions[3], g.positions[0]);
    }

    #[test]
    fn test_compute_normals_faces_plus_z() {
        let mut g = quad();
        g.normals.clear();
        g.compute_normals();
        for n in &g.normals {
            assert!((Vec3::from(*n) - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn test_bounds() {
        let (min, max) = quad().bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(1.0, 1.0, 0.0));
        assert!(PartGeometry::new().bounds().is_none());
    }
}
