//! Geometry merge and skin normalization
//!
//! Every part is brought to the same attribute set (position, normal, uv,
//! 4 skin indices, 4 skin weights), expanded to non-indexed form and
//! concatenated in order.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::geometry::{PartGeometry, SkinInfluence};
use crate::primitives::{PLACEHOLDER_RADIUS, placeholder};

/// Axis-aligned box plus enclosing sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub center: [f32; 3],
    pub radius: f32,
}

impl Bounds {
    pub fn from_positions(positions: &[[f32; 3]]) -> Self {
        let mut iter = positions.iter().map(|p| Vec3::from(*p));
        let Some(first) = iter.next() else {
            return Self {
                min: [0.0; 3],
                max: [0.0; 3],
                center: [0.0; 3],
                radius: 0.0,
            };
        };
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        let center = (min + max) * 0.5;
        let radius = positions
            .iter()
            .map(|p| Vec3::from(*p).distance(center))
            .fold(0.0f32, f32::max);
        Self {
            min: min.to_array(),
            max: max.to_array(),
            center: center.to_array(),
            radius,
        }
    }
}

/// Vertex range a part occupies in the merged buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRange {
    pub name: String,
    pub start: usize,
    pub count: usize,
}

/// Single non-indexed buffer with uniform attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedGeometry {
    pub geometry: PartGeometry,
    pub bounds: Bounds,
    pub part_ranges: Vec<PartRange>,
    /// True when nothing was generated and a placeholder was substituted
    pub placeholder: bool,
}

impl MergedGeometry {
    pub fn vertex_count(&self) -> usize {
        self.geometry.vertex_count()
    }

    pub fn part(&self, name: &str) -> Option<&PartRange> {
        self.part_ranges.iter().find(|r| r.name == name)
    }
}

/// Give a part the full attribute set and a non-indexed layout
///
/// Missing normals are computed from faces, missing UVs become `(0, 0)`,
/// missing skin becomes full weight on joint 0, and weights are
/// renormalized. Non-finite values are replaced, never propagated.
pub fn normalize_part(part: &PartGeometry) -> PartGeometry {
    let mut part = part.clone();
    let count = part.vertex_count();

    let mut sanitized = 0usize;
    for p in &mut part.positions {
        if !p.iter().all(|c| c.is_finite()) {
            *p = [0.0; 3];
            sanitized += 1;
        }
    }
    if sanitized > 0 {
        tracing::warn!("merge: replaced {} non-finite position(s)", sanitized);
    }

    if !part.has_normals() {
        part.compute_normals();
    }
    for n in &mut part.normals {
        let v = Vec3::from(*n);
        *n = if v.is_finite() {
            v.try_normalize().unwrap_or(Vec3::Y).to_array()
        } else {
            [0.0, 1.0, 0.0]
        };
    }

    if !part.has_uvs() {
        part.uvs = vec![[0.0, 0.0]; count];
    }
    for uv in &mut part.uvs {
        if !uv.iter().all(|c| c.is_finite()) {
            *uv = [0.0, 0.0];
        }
    }

    if !part.has_skin() {
        let default = SkinInfluence::default();
        part.skin_indices = vec![default.indices; count];
        part.skin_weights = vec![default.weights; count];
    }
    for i in 0..count {
        let skin = SkinInfluence {
            indices: part.skin_indices[i],
            weights: part.skin_weights[i],
        }
        .normalized();
        part.skin_indices[i] = skin.indices;
        part.skin_weights[i] = skin.weights;
    }

    part.to_non_indexed()
}

/// Merge named parts into one buffer
///
/// Parts are appended in the given order. When no part contributes a vertex
/// the result holds a single placeholder primitive.
pub fn merge_parts(parts: &[(String, PartGeometry)]) -> MergedGeometry {
    let normalized: Vec<(&str, PartGeometry)> = parts
        .iter()
        .filter(|(_, g)| !g.is_empty())
        .map(|(name, g)| (name.as_str(), normalize_part(g)))
        .filter(|(_, g)| !g.is_empty())
        .collect();

    if normalized.is_empty() {
        let geometry = normalize_part(&placeholder(Vec3::ZERO, PLACEHOLDER_RADIUS, 0));
        return MergedGeometry {
            bounds: Bounds::from_positions(&geometry.positions),
            part_ranges: vec![PartRange {
                name: "placeholder".to_string(),
                start: 0,
                count: geometry.vertex_count(),
            }],
            geometry,
            placeholder: true,
        };
    }

    let total: usize = normalized.iter().map(|(_, g)| g.vertex_count()).sum();
    let mut merged = PartGeometry::new();
    merged.positions.reserve(total);
    merged.normals.reserve(total);
    merged.uvs.reserve(total);
    merged.skin_indices.reserve(total);
    merged.skin_weights.reserve(total);

    let mut part_ranges = Vec::with_capacity(normalized.len());
    for (name, part) in normalized {
        part_ranges.push(PartRange {
            name: name.to_string(),
            start: merged.positions.len(),
            count: part.vertex_count(),
        });
        merged.positions.extend_from_slice(&part.positions);
        merged.normals.extend_from_slice(&part.normals);
        merged.uvs.extend_from_slice(&part.uvs);
        merged.skin_indices.extend_from_slice(&part.skin_indices);
        merged.skin_weights.extend_from_slice(&part.skin_weights);
    }

    MergedGeometry {
        bounds: Bounds::from_positions(&merged.positions),
        geometry: merged,
        part_ranges,
        placeholder: false,
    }
}
