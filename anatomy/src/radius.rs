//! Radius expansion and shape profiles
//!
//! Turns a declared radius specification into exactly one radius per sample
//! point, then optionally shapes it with a [`ProfileFn`].

use std::f32::consts::PI;

/// How a part declared its radii
#[derive(Debug, Clone, PartialEq)]
pub enum RadiusSpec {
    /// Explicit per-bone (or per-sample) radii
    Explicit(Vec<f32>),
    /// Base/mid/tip blend; `mid` defaults to the average of base and tip
    Tapered { base: f32, mid: Option<f32>, tip: f32 },
    /// One radius everywhere
    Uniform(f32),
}

impl RadiusSpec {
    /// Multiply every declared radius by `factor`
    pub fn scaled(&self, factor: f32) -> RadiusSpec {
        match self {
            RadiusSpec::Explicit(r) => RadiusSpec::Explicit(r.iter().map(|v| v * factor).collect()),
            RadiusSpec::Tapered { base, mid, tip } => RadiusSpec::Tapered {
                base: base * factor,
                mid: mid.map(|m| m * factor),
                tip: tip * factor,
            },
            RadiusSpec::Uniform(r) => RadiusSpec::Uniform(r * factor),
        }
    }

    /// True for an explicit array using the joint-flare convention
    pub fn is_flared(&self, chain_len: usize) -> bool {
        matches!(self, RadiusSpec::Explicit(r) if chain_len > 0 && r.len() == chain_len + 1)
    }
}

/// Clamp a radius to a finite, non-negative value
pub fn sanitize_radius(r: f32) -> f32 {
    if r.is_finite() && r > 0.0 { r } else { 0.0 }
}

/// Expand a radius specification to `point_count` radii
///
/// Explicit arrays are used as-is when their length matches `point_count`.
/// An array one longer than `chain_len` follows the joint-flare convention:
/// the first `chain_len` values cover all but the final sample and the extra
/// value lands on the final sample. Any other length is linearly resampled.
pub fn expand(
    spec: Option<&RadiusSpec>,
    point_count: usize,
    chain_len: usize,
    default_radius: f32,
) -> Vec<f32> {
    if point_count == 0 {
        return Vec::new();
    }

    let radii = match spec {
        Some(RadiusSpec::Explicit(values)) if values.is_empty() => {
            vec![default_radius; point_count]
        }
        Some(RadiusSpec::Explicit(values)) if values.len() == point_count => values.clone(),
        Some(spec @ RadiusSpec::Explicit(values)) if spec.is_flared(chain_len) => {
            let mut out = resample(&values[..chain_len], point_count - 1);
            out.push(values[chain_len]);
            out
        }
        Some(RadiusSpec::Explicit(values)) => resample(values, point_count),
        Some(RadiusSpec::Tapered { base, mid, tip }) => {
            let mid = mid.unwrap_or((base + tip) * 0.5);
            (0..point_count)
                .map(|i| tapered(*base, mid, *tip, sample_t(i, point_count)))
                .collect()
        }
        Some(RadiusSpec::Uniform(r)) => vec![*r; point_count],
        None => vec![default_radius; point_count],
    };

    radii.into_iter().map(sanitize_radius).collect()
}

/// Normalized position of sample `i` among `count`
pub fn sample_t(i: usize, count: usize) -> f32 {
    if count <= 1 {
        0.0
    } else {
        i as f32 / (count - 1) as f32
    }
}

/// Base to mid over the first half, mid to tip over the second
fn tapered(base: f32, mid: f32, tip: f32, t: f32) -> f32 {
    if t <= 0.5 {
        let s = smooth(t * 2.0);
        base + (mid - base) * s
    } else {
        let s = smooth((t - 0.5) * 2.0);
        mid + (tip - mid) * s
    }
}

/// Quadratic ease so the blend meets the midpoint without a kink
fn smooth(s: f32) -> f32 {
    // 2s - s^2 rises fast from the ends' side and flattens at mid
    let s = s.clamp(0.0, 1.0);
    s * (2.0 - s)
}

/// Linearly resample `values` to `count` evenly spaced entries
pub fn resample(values: &[f32], count: usize) -> Vec<f32> {
    match (values.len(), count) {
        (_, 0) => Vec::new(),
        (0, _) => vec![0.0; count],
        (1, _) => vec![values[0]; count],
        (_, 1) => vec![values[0]],
        (n, _) => (0..count)
            .map(|i| {
                let x = sample_t(i, count) * (n - 1) as f32;
                let lo = (x.floor() as usize).min(n - 1);
                let hi = (lo + 1).min(n - 1);
                let f = x - lo as f32;
                values[lo] + (values[hi] - values[lo]) * f
            })
            .collect(),
    }
}

/// A multiplicative radius shape along a chain
pub trait ProfileFn: Send + Sync {
    /// Scale at normalized chain position `t` in [0, 1]
    fn scale(&self, t: f32) -> f32;

    /// Extra scale around the ring at angle `theta`; circular by default
    fn angular_scale(&self, _t: f32, _theta: f32) -> f32 {
        1.0
    }
}

impl<F> ProfileFn for F
where
    F: Fn(f32) -> f32 + Send + Sync,
{
    fn scale(&self, t: f32) -> f32 {
        self(t)
    }
}

/// Named profiles selectable from blueprints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RadiusProfile {
    #[default]
    None,
    /// Swelling at the hip end
    RumpBulge,
    /// Swelling at mid-body
    Belly,
    /// Heavy belly plus rump, for large quadrupeds
    ElephantHeavy,
    /// Linear thinning to 60% at the tip
    Taper,
    /// Wider sideways than tall
    Barrel,
}

impl RadiusProfile {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "" | "none" | "default" => Some(Self::None),
            "rump_bulge" | "rump" => Some(Self::RumpBulge),
            "belly" => Some(Self::Belly),
            "elephant_heavy" | "heavy" => Some(Self::ElephantHeavy),
            "taper" => Some(Self::Taper),
            "barrel" => Some(Self::Barrel),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::None
    }
}

impl ProfileFn for RadiusProfile {
    fn scale(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::None | Self::Barrel => 1.0,
            Self::RumpBulge => 1.0 + 0.25 * (-(t / 0.2).powi(2)).exp(),
            Self::Belly => 1.0 + 0.2 * (PI * t).sin(),
            Self::ElephantHeavy => {
                1.0 + 0.18 * (PI * t).sin() + 0.12 * (-(t / 0.25).powi(2)).exp()
            }
            Self::Taper => 1.0 - 0.4 * t,
        }
    }

    fn angular_scale(&self, _t: f32, theta: f32) -> f32 {
        match self {
            Self::Barrel => 1.0 + 0.15 * (2.0 * theta).cos(),
            _ => 1.0,
        }
    }
}

/// Multiply each radius by the profile at its normalized position
pub fn apply_profile(radii: &mut [f32], profile: &dyn ProfileFn) {
    let count = radii.len();
    for (i, r) in radii.iter_mut().enumerate() {
        *r = sanitize_radius(*r * profile.scale(sample_t(i, count)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_matching_length_is_identity() {
        let radii = vec![1.0, 1.2, 0.8];
        let spec = RadiusSpec::Explicit(radii.clone());
        assert_eq!(expand(Some(&spec), 3, 3, 0.5), radii);
    }

    #[test]
    fn test_expand_flare_lands_on_final_sample() {
        let spec = RadiusSpec::Explicit(vec![0.5, 0.45, 0.4, 0.38, 0.43]);
        let out = expand(Some(&spec), 4, 4, 0.1);
        assert_eq!(out.len(), 4);
        assert_eq!(out[3], 0.43);
        assert_eq!(out[0], 0.5);
    }

    #[test]
    fn test_expand_flare_with_subdivided_samples() {
        let spec = RadiusSpec::Explicit(vec![1.0, 0.5, 2.0]);
        // 2-bone chain, 4 body samples + flare sample
        let out = expand(Some(&spec), 5, 2, 0.1);
        assert_eq!(out.len(), 5);
        assert!((out[0] - 1.0).abs() < 1e-6);
        assert!((out[3] - 0.5).abs() < 1e-6);
        assert_eq!(out[4], 2.0);
    }

    #[test]
    fn test_expand_resamples_other_lengths() {
        let spec = RadiusSpec::Explicit(vec![1.0, 0.0]);
        let out = expand(Some(&spec), 5, 3, 0.1);
        assert_eq!(out, vec![1.0, 0.75, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn test_expand_tapered_hits_base_mid_tip() {
        let spec = RadiusSpec::Tapered {
            base: 0.46,
            mid: Some(0.07),
            tip: 0.26,
        };
        let out = expand(Some(&spec), 5, 5, 0.1);
        assert!((out[0] - 0.46).abs() < 1e-6);
        assert!((out[2] - 0.07).abs() < 1e-6);
        assert!((out[4] - 0.26).abs() < 1e-6);
    }

    #[test]
    fn test_expand_uniform_and_default() {
        assert_eq!(expand(Some(&RadiusSpec::Uniform(0.3)), 3, 3, 1.0), vec![0.3; 3]);
        assert_eq!(expand(None, 2, 2, 0.7), vec![0.7; 2]);
        assert!(expand(None, 0, 2, 0.7).is_empty());
    }

    #[test]
    fn test_expand_clamps_negative() {
        let spec = RadiusSpec::Explicit(vec![-1.0, f32::NAN, 0.5]);
        assert_eq!(expand(Some(&spec), 3, 3, 0.1), vec![0.0, 0.0, 0.5]);
    }

    #[test]
    fn test_profile_scales_without_replacing() {
        let mut radii = vec![1.0, 1.0, 1.0];
        apply_profile(&mut radii, &RadiusProfile::Taper);
        assert_eq!(radii[0], 1.0);
        assert!((radii[2] - 0.6).abs() < 1e-6);

        let mut radii = vec![2.0, 2.0];
        apply_profile(&mut radii, &|t: f32| 1.0 + t);
        assert_eq!(radii, vec![2.0, 4.0]);
    }

    #[test]
    fn test_profile_names() {
        assert_eq!(RadiusProfile::from_name("elephant_heavy"), Some(RadiusProfile::ElephantHeavy));
        assert_eq!(RadiusProfile::from_name("Rump-Bulge"), Some(RadiusProfile::RumpBulge));
        assert_eq!(RadiusProfile::from_name("wobbly"), None);
        assert!(RadiusProfile::RumpBulge.scale(0.0) > RadiusProfile::RumpBulge.scale(1.0));
    }
}
