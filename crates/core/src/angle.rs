//! Joint angle geometry.
//!
//! [`calculate_angle`] is the only place angles are produced. A degenerate
//! input yields [`NO_ANGLE`], and every consumer downstream goes through
//! [`is_observed`] before trusting a value.

use crate::types::Degrees;

/// Sentinel returned for a degenerate angle. Never a real measurement.
pub const NO_ANGLE: Degrees = 0.0;

/// A fully extended joint.
pub const STRAIGHT_ANGLE: Degrees = 180.0;

/// Angle at vertex `b` between rays `b -> a` and `b -> c`, in degrees.
///
/// Works for any dimensionality (2-D planar or 3-D spatial points). The
/// cosine is clamped to `[-1, 1]` before `acos`, so the result always lies
/// in `[0, 180]`. Returns [`NO_ANGLE`] when either ray has zero length or
/// the input is not finite.
pub fn calculate_angle<const N: usize>(a: [f64; N], b: [f64; N], c: [f64; N]) -> Degrees {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_c = 0.0;

    for ((&ai, &bi), &ci) in a.iter().zip(&b).zip(&c) {
        let u = ai - bi;
        let v = ci - bi;
        dot += u * v;
        norm_a += u * u;
        norm_c += v * v;
    }

    if norm_a == 0.0 || norm_c == 0.0 {
        return NO_ANGLE;
    }

    let cos = dot / (norm_a.sqrt() * norm_c.sqrt());
    if !cos.is_finite() {
        return NO_ANGLE;
    }

    cos.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Whether an angle carries data, i.e. is not the degenerate sentinel.
pub fn is_observed(angle: Degrees) -> bool {
    angle.is_finite() && angle > NO_ANGLE
}
