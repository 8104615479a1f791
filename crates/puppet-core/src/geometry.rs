//! 2D geometry primitives
//!
//! Everything the rig does happens in the illustration's 2D plane:
//! - Vec2 doubles as point and vector
//! - Segment projection for point-to-bone distances
//! - LocalFrame captures a point relative to a reference pair
//! - Collinearity test for curve handles
//! - Gaussian sampling for jittered synthetic input

use std::f64::consts::PI;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lengths below this are treated as zero
pub const EPSILON: f64 = 1e-9;

/// 2D point / vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    #[inline]
    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction. The zero vector stays zero.
    pub fn normalize(self) -> Vec2 {
        let len = self.length();
        if len < EPSILON {
            return Vec2::ZERO;
        }
        Vec2::new(self.x / len, self.y / len)
    }

    /// Rotate counter-clockwise by `angle` radians
    pub fn rotate(self, angle: f64) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Rotate by +90°
    #[inline]
    pub fn perp(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    /// Linear interpolation
    #[inline]
    pub fn lerp(self, other: Vec2, t: f64) -> Vec2 {
        self + (other - self) * t
    }

    #[inline]
    pub fn distance(self, other: Vec2) -> f64 {
        (self - other).length()
    }

    /// Average of a set of points, `None` when empty
    pub fn centroid<I: IntoIterator<Item = Vec2>>(points: I) -> Option<Vec2> {
        let mut sum = Vec2::ZERO;
        let mut count = 0usize;
        for p in points {
            sum += p;
            count += 1;
        }
        (count > 0).then(|| sum * (1.0 / count as f64))
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    #[inline]
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    #[inline]
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Parametric position of `p` projected onto `[a, b]`, clamped to `[0, 1]`.
/// A degenerate segment projects everything onto `a`.
pub fn segment_parameter(a: Vec2, b: Vec2, p: Vec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < EPSILON * EPSILON {
        return 0.0;
    }
    ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
}

/// Closest point to `p` on the segment `[a, b]`
pub fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    a.lerp(b, segment_parameter(a, b, p))
}

/// Minimum distance from `p` to the segment `[a, b]`
pub fn distance_to_segment(a: Vec2, b: Vec2, p: Vec2) -> f64 {
    p.distance(closest_point_on_segment(a, b, p))
}

/// A point's coordinates in the frame spanned by a reference pair `(a, b)`.
///
/// The frame has its origin at `a`, x-axis along `b - a` and y-axis along the
/// 90° rotated direction. Coordinates are stored in units of `|b - a|`, so a
/// reconstruction against a longer or shorter pair scales the offset with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LocalFrame {
    /// Captured against a proper reference pair
    Relative { along: f64, across: f64 },
    /// Captured against a degenerate pair (`a == b`): raw offset from `a`
    Fixed { offset: Vec2 },
}

impl LocalFrame {
    /// Capture `p` relative to the reference pair `(a, b)`
    pub fn capture(a: Vec2, b: Vec2, p: Vec2) -> LocalFrame {
        let ab = b - a;
        let len = ab.length();
        if len < EPSILON {
            return LocalFrame::Fixed { offset: p - a };
        }
        let dir = ab * (1.0 / len);
        let normal = dir.perp();
        let d = p - a;
        LocalFrame::Relative {
            along: d.dot(dir) / len,
            across: d.dot(normal) / len,
        }
    }

    /// Re-apply the captured coordinates to a new reference pair.
    /// A degenerate new pair has no direction, so the result is `a`.
    pub fn reconstruct(&self, a: Vec2, b: Vec2) -> Vec2 {
        match *self {
            LocalFrame::Fixed { offset } => a + offset,
            LocalFrame::Relative { along, across } => {
                let ab = b - a;
                let len = ab.length();
                if len < EPSILON {
                    return a;
                }
                let dir = ab * (1.0 / len);
                a + dir * (along * len) + dir.perp() * (across * len)
            }
        }
    }
}

/// Default threshold for [`is_collinear`]
pub const COLLINEAR_THRESHOLD: f64 = 0.01;

/// True when `v0` and `v1` point along the same line (either direction).
/// Zero-length vectors are never collinear.
pub fn is_collinear(v0: Vec2, v1: Vec2, threshold: f64) -> bool {
    let n0 = v0.normalize();
    let n1 = v1.normalize();
    if n0 == Vec2::ZERO || n1 == Vec2::ZERO {
        return false;
    }
    n0.dot(n1).abs() > 1.0 - threshold
}

/// Sample a normal distribution (Box-Muller)
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    // gen() is [0, 1); flip to (0, 1] so ln never sees zero
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    mean + z * std_dev
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn close(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_closest_point_clamps_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);

        assert_eq!(closest_point_on_segment(a, b, Vec2::new(-5.0, 3.0)), a);
        assert_eq!(closest_point_on_segment(a, b, Vec2::new(15.0, -3.0)), b);
        assert!(close(
            closest_point_on_segment(a, b, Vec2::new(4.0, 7.0)),
            Vec2::new(4.0, 0.0)
        ));
    }

    #[test]
    fn test_degenerate_segment_projects_to_start() {
        let a = Vec2::new(2.0, 2.0);
        assert_eq!(segment_parameter(a, a, Vec2::new(9.0, 9.0)), 0.0);
        assert_eq!(closest_point_on_segment(a, a, Vec2::new(9.0, 9.0)), a);
    }

    #[test]
    fn test_local_frame_round_trip() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);
        let p = Vec2::new(-3.0, 7.5);

        let frame = LocalFrame::capture(a, b, p);
        assert!(close(frame.reconstruct(a, b), p));
    }

    #[test]
    fn test_local_frame_follows_rotation_and_scale() {
        let frame = LocalFrame::capture(Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(0.5, 0.5));

        // Rotate the pair by 90° and double its length
        let p = frame.reconstruct(Vec2::ZERO, Vec2::new(0.0, 2.0));
        assert!(close(p, Vec2::new(-1.0, 1.0)));
    }

    #[test]
    fn test_local_frame_degenerate_new_pair_returns_anchor() {
        let frame = LocalFrame::capture(Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(0.5, 0.5));
        let a = Vec2::new(3.0, 3.0);
        assert_eq!(frame.reconstruct(a, a), a);
    }

    #[test]
    fn test_local_frame_degenerate_capture_keeps_offset() {
        let a = Vec2::new(1.0, 1.0);
        let frame = LocalFrame::capture(a, a, Vec2::new(2.0, 3.0));
        assert_eq!(frame, LocalFrame::Fixed { offset: Vec2::new(1.0, 2.0) });
        assert!(close(
            frame.reconstruct(Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)),
            Vec2::new(11.0, 2.0)
        ));
    }

    #[test]
    fn test_is_collinear() {
        let v = Vec2::new(1.0, 1.0);
        assert!(is_collinear(v, v * 3.0, COLLINEAR_THRESHOLD));
        assert!(is_collinear(v, -v, COLLINEAR_THRESHOLD));
        assert!(!is_collinear(v, v.perp(), COLLINEAR_THRESHOLD));
        assert!(!is_collinear(v, Vec2::ZERO, COLLINEAR_THRESHOLD));
    }

    #[test]
    fn test_rotate_quarter_turn_matches_perp() {
        let v = Vec2::new(3.0, -2.0);
        assert!(close(v.rotate(PI / 2.0), v.perp()));
    }

    #[test]
    fn test_gaussian_mean() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000;
        let sum: f64 = (0..n).map(|_| gaussian(&mut rng, 5.0, 2.0)).sum();
        let mean = sum / n as f64;
        assert!((mean - 5.0).abs() < 0.1);
    }

    #[test]
    fn test_centroid() {
        assert_eq!(Vec2::centroid(Vec::new()), None);
        let c = Vec2::centroid([Vec2::new(0.0, 0.0), Vec2::new(2.0, 4.0)]);
        assert_eq!(c, Some(Vec2::new(1.0, 2.0)));
    }

    fn coord() -> impl Strategy<Value = f64> {
        -500.0..500.0f64
    }

    proptest! {
        #[test]
        fn prop_local_frame_survives_rigid_motion(
            (ax, ay, bx, by, px, py) in (coord(), coord(), coord(), coord(), coord(), coord()),
            angle in -PI..PI,
            (tx, ty) in (coord(), coord()),
        ) {
            let (a, b, p) = (Vec2::new(ax, ay), Vec2::new(bx, by), Vec2::new(px, py));
            prop_assume!(a.distance(b) > 1.0);
            let frame = LocalFrame::capture(a, b, p);
            let t = Vec2::new(tx, ty);
            let moved = frame.reconstruct(a.rotate(angle) + t, b.rotate(angle) + t);
            prop_assert!(moved.distance(p.rotate(angle) + t) < 1e-6);
        }

        #[test]
        fn prop_closest_point_is_no_farther_than_endpoints(
            (ax, ay, bx, by, px, py) in (coord(), coord(), coord(), coord(), coord(), coord()),
        ) {
            let (a, b, p) = (Vec2::new(ax, ay), Vec2::new(bx, by), Vec2::new(px, py));
            let d = distance_to_segment(a, b, p);
            prop_assert!(d <= p.distance(a) + 1e-9);
            prop_assert!(d <= p.distance(b) + 1e-9);
        }
    }
}
