//! Cross-section frames along a polyline
//!
//! Both policies return, per point, a right-handed orthonormal basis
//! `(basis_a, basis_b)` perpendicular to the local tangent, such that
//! `basis_a × basis_b = tangent`.

use glam::Vec3;

/// |dot(tangent, Y)| above which world X replaces world Y as reference
pub const POLE_DOT_THRESHOLD: f32 = 0.99;

/// Projected basis length below which parallel transport reseeds
pub const RESEED_EPSILON: f32 = 1e-3;

/// How ring orientations are chosen along a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePolicy {
    /// Independent frame per point from a world reference axis
    #[default]
    FixedAxis,
    /// Previous basis carried onto each new tangent plane (twist-free)
    ParallelTransport,
}

/// Orthonormal cross-section basis at one sample point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub tangent: Vec3,
    pub basis_a: Vec3,
    pub basis_b: Vec3,
}

impl Frame {
    /// Offset of a ring vertex at angle `theta` and distance `radius`
    pub fn ring_offset(&self, theta: f32, radius: f32) -> Vec3 {
        (self.basis_a * theta.cos() + self.basis_b * theta.sin()) * radius
    }
}

/// Per-point unit tangents: toward the next point, the last from its predecessor
///
/// Zero-length segments reuse the neighbouring tangent; a path with no
/// usable segment at all points along +Y.
pub fn path_tangents(points: &[Vec3]) -> Vec<Vec3> {
    let n = points.len();
    let segment = |i: usize| (points[i + 1] - points[i]).try_normalize();

    let mut tangents: Vec<Option<Vec3>> = (0..n)
        .map(|i| {
            if i + 1 < n {
                segment(i)
            } else if i > 0 {
                segment(i - 1)
            } else {
                None
            }
        })
        .collect();

    // Backfill leading gaps from the first valid tangent, then carry forward
    let first = tangents.iter().flatten().next().copied().unwrap_or(Vec3::Y);
    let mut previous = first;
    for t in &mut tangents {
        match t {
            Some(v) => previous = *v,
            None => *t = Some(previous),
        }
    }

    tangents.into_iter().map(|t| t.unwrap_or(first)).collect()
}

/// Frame from the world reference axis for one tangent
pub fn fixed_axis_frame(tangent: Vec3) -> Frame {
    let tangent = tangent.try_normalize().unwrap_or(Vec3::Y);
    let reference = if tangent.dot(Vec3::Y).abs() > POLE_DOT_THRESHOLD {
        Vec3::X
    } else {
        Vec3::Y
    };
    // reference is never within ~8 degrees of tangent, so this is non-zero
    let basis_a = reference.cross(tangent).normalize();
    let basis_b = tangent.cross(basis_a);
    Frame {
        tangent,
        basis_a,
        basis_b,
    }
}

/// Carry `previous` onto the plane perpendicular to `tangent`
///
/// Reseeds with [`fixed_axis_frame`] when the projection collapses.
pub fn transport_frame(previous: &Frame, tangent: Vec3) -> Frame {
    let tangent = tangent.try_normalize().unwrap_or(previous.tangent);
    let projected = previous.basis_a - tangent * previous.basis_a.dot(tangent);
    if projected.length() < RESEED_EPSILON {
        tracing::debug!("parallel transport reseeded at tangent {:?}", tangent);
        return fixed_axis_frame(tangent);
    }
    let basis_a = projected.normalize();
    let basis_b = tangent.cross(basis_a);
    Frame {
        tangent,
        basis_a,
        basis_b,
    }
}

/// One frame per point under `policy`
pub fn build_frames(points: &[Vec3], policy: FramePolicy) -> Vec<Frame> {
    let tangents = path_tangents(points);
    match policy {
        FramePolicy::FixedAxis => tangents.into_iter().map(fixed_axis_frame).collect(),
        FramePolicy::ParallelTransport => {
            let mut frames: Vec<Frame> = Vec::with_capacity(tangents.len());
            for tangent in tangents {
                let frame = match frames.last() {
                    Some(previous) => transport_frame(previous, tangent),
                    None => fixed_axis_frame(tangent),
                };
                frames.push(frame);
            }
            frames
        }
    }
}

/// Rotation between consecutive frames beyond pure transport, in radians
pub fn twist_angle(previous: &Frame, next: &Frame) -> f32 {
    let carried = previous.basis_a - next.tangent * previous.basis_a.dot(next.tangent);
    match carried.try_normalize() {
        Some(carried) => carried.dot(next.basis_a).clamp(-1.0, 1.0).acos(),
        None => 0.0,
    }
}
