//! Ring tube builder
//!
//! The shared core of every tubular part: one ring of `sides` vertices per
//! sample point, quads between consecutive rings, optional triangle-fan caps,
//! and per-ring skin influences.

use std::f32::consts::PI;

use glam::Vec3;

use crate::frame::{Frame, FramePolicy, build_frames};
use crate::geometry::{MeshBuilder, MeshBuilderSkinned, PartGeometry, SkinInfluence};
use crate::modifiers::{MeshModifier, WeldVertices};
use crate::radius::{ProfileFn, apply_profile, resample, sample_t};

pub const MIN_SIDES: u32 = 3;
pub const MAX_SIDES: u32 = 64;

/// Clamp a side count into `[MIN_SIDES, MAX_SIDES]`
pub fn clamp_sides(sides: u32) -> u32 {
    sides.clamp(MIN_SIDES, MAX_SIDES)
}

/// How rings pick their joint influences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkinWeighting {
    /// Two-joint blend between the joints bounding each ring
    #[default]
    BlendAdjacentBones,
    /// Every ring fully owned by its nearest joint
    PinToNearestBone,
}

/// Joint binding for a tube
#[derive(Debug, Clone)]
pub struct TubeSkin<'a> {
    /// Skeleton joint index per chain bone
    pub joints: &'a [u16],
    /// Fractional chain coordinate per ring (`1.5` = halfway between bones 1 and 2)
    pub ring_coords: Vec<f32>,
    pub weighting: SkinWeighting,
}

impl<'a> TubeSkin<'a> {
    /// Ring `i` sits on chain bone `i`
    pub fn per_bone(joints: &'a [u16], weighting: SkinWeighting) -> Self {
        Self {
            joints,
            ring_coords: (0..joints.len()).map(|i| i as f32).collect(),
            weighting,
        }
    }

    /// Influence for a ring at chain coordinate `coord`
    pub fn influence(&self, coord: f32) -> SkinInfluence {
        let Some(last) = self.joints.len().checked_sub(1) else {
            return SkinInfluence::default();
        };
        let coord = if coord.is_finite() {
            coord.clamp(0.0, last as f32)
        } else {
            0.0
        };
        match self.weighting {
            SkinWeighting::BlendAdjacentBones => {
                let lo = (coord.floor() as usize).min(last);
                let hi = (lo + 1).min(last);
                SkinInfluence::blend(self.joints[lo], self.joints[hi], coord - lo as f32)
            }
            SkinWeighting::PinToNearestBone => {
                SkinInfluence::single(self.joints[(coord.round() as usize).min(last)])
            }
        }
    }
}

/// Everything needed to emit one tube
pub struct TubeSpec<'a> {
    pub points: &'a [Vec3],
    /// One radius per point; other lengths are resampled
    pub radii: &'a [f32],
    pub frame_policy: FramePolicy,
    pub sides: u32,
    pub cap_start: bool,
    pub cap_end: bool,
    pub skin: Option<TubeSkin<'a>>,
    pub profile: Option<&'a dyn ProfileFn>,
    /// Vertices closer than this are welded; 0 disables welding
    pub weld_tolerance: f32,
}

impl<'a> TubeSpec<'a> {
    pub fn new(points: &'a [Vec3], radii: &'a [f32]) -> Self {
        Self {
            points,
            radii,
            frame_policy: FramePolicy::FixedAxis,
            sides: 12,
            cap_start: false,
            cap_end: false,
            skin: None,
            profile: None,
            weld_tolerance: 0.0,
        }
    }

    pub fn sides(mut self, sides: u32) -> Self {
        self.sides = sides;
        self
    }

    pub fn frames(mut self, policy: FramePolicy) -> Self {
        self.frame_policy = policy;
        self
    }

    pub fn caps(mut self, start: bool, end: bool) -> Self {
        self.cap_start = start;
        self.cap_end = end;
        self
    }

    pub fn skin(mut self, skin: TubeSkin<'a>) -> Self {
        self.skin = Some(skin);
        self
    }

    pub fn profile(mut self, profile: &'a dyn ProfileFn) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn weld(mut self, tolerance: f32) -> Self {
        self.weld_tolerance = tolerance;
        self
    }
}

/// Per-ring data shared by the body and the caps
struct Ring {
    center: Vec3,
    frame: Frame,
    t: f32,
    radius: f32,
    skin: SkinInfluence,
}

/// Build a triangulated tube
///
/// Returns empty geometry for fewer than two points; callers substitute a
/// placeholder.
pub fn build_tube(spec: &TubeSpec) -> PartGeometry {
    let n = spec.points.len();
    if n < 2 {
        return PartGeometry::new();
    }

    let sides = clamp_sides(spec.sides);
    if sides != spec.sides {
        tracing::warn!("build_tube: sides {} clamped to {}", spec.sides, sides);
    }

    let mut radii = if spec.radii.len() == n {
        spec.radii.to_vec()
    } else {
        resample(spec.radii, n)
    };
    if let Some(profile) = spec.profile {
        apply_profile(&mut radii, profile);
    }

    let frames = build_frames(spec.points, spec.frame_policy);
    let rings: Vec<Ring> = (0..n)
        .map(|i| {
            let coord = spec
                .skin
                .as_ref()
                .and_then(|s| s.ring_coords.get(i).copied())
                .unwrap_or(i as f32);
            Ring {
                center: spec.points[i],
                frame: frames[i],
                t: sample_t(i, n),
                radius: radii[i].max(0.0),
                skin: spec
                    .skin
                    .as_ref()
                    .map(|s| s.influence(coord))
                    .unwrap_or_default(),
            }
        })
        .collect();

    let mut mesh = PartGeometry::new();
    mesh.positions.reserve(n * sides as usize);

    // Body rings
    for ring in &rings {
        for j in 0..sides {
            let theta = (j as f32 / sides as f32) * 2.0 * PI;
            let radius = ring.radius * angular(spec.profile, ring.t, theta);
            let direction = ring.frame.ring_offset(theta, 1.0);
            mesh.add_vertex_skinned(
                ring.center + direction * radius,
                (j as f32 / sides as f32, ring.t),
                direction,
                ring.skin,
            );
        }
    }

    // Quads between consecutive rings (CCW from outside)
    for i in 0..(n - 1) as u32 {
        let a = i * sides;
        let b = (i + 1) * sides;
        for j in 0..sides {
            let next = (j + 1) % sides;
            mesh.add_triangle(a + j, a + next, b + next);
            mesh.add_triangle(a + j, b + next, b + j);
        }
    }

    if spec.cap_start {
        add_cap(&mut mesh, &rings[0], sides, spec.profile, false);
    }
    if spec.cap_end {
        add_cap(&mut mesh, &rings[n - 1], sides, spec.profile, true);
    }

    if spec.weld_tolerance > 0.0 {
        WeldVertices {
            tolerance: spec.weld_tolerance,
        }
        .apply(&mut mesh);
    }

    mesh
}

fn angular(profile: Option<&dyn ProfileFn>, t: f32, theta: f32) -> f32 {
    profile.map_or(1.0, |p| p.angular_scale(t, theta).max(0.0))
}

/// Triangle fan around the ring's center, facing along `+tangent` at the end
/// and `-tangent` at the start
fn add_cap(
    mesh: &mut PartGeometry,
    ring: &Ring,
    sides: u32,
    profile: Option<&dyn ProfileFn>,
    at_end: bool,
) {
    if ring.radius <= f32::EPSILON {
        return;
    }

    let normal = if at_end {
        ring.frame.tangent
    } else {
        -ring.frame.tangent
    };
    let center = mesh.add_vertex_skinned(ring.center, (0.5, 0.5), normal, ring.skin);

    let first = mesh.vertex_count() as u32;
    for j in 0..sides {
        let theta = (j as f32 / sides as f32) * 2.0 * PI;
        let radius = ring.radius * angular(profile, ring.t, theta);
        mesh.add_vertex_skinned(
            ring.center + ring.frame.ring_offset(theta, radius),
            (0.5 + 0.5 * theta.cos(), 0.5 + 0.5 * theta.sin()),
            normal,
            ring.skin,
        );
    }

    for j in 0..sides {
        let current = first + j;
        let next = first + (j + 1) % sides;
        if at_end {
            mesh.add_triangle(center, current, next);
        } else {
            mesh.add_triangle(center, next, current);
        }
    }
}
