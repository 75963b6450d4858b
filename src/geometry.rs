//! Vector and angle primitives used by the projector, the reducer and the
//! color encoding.

use crate::Point2;
use std::f64::consts::TAU;

/// Scale `(x, y)` back onto the unit circle when it lies outside it.
/// Points already inside (or on) the disk are returned unchanged.
pub fn constrain_to_unit_disk(x: f64, y: f64) -> (f64, f64) {
    let r = x.hypot(y);
    if r > 1.0 {
        (x / r, y / r)
    } else {
        (x, y)
    }
}

/// Rotate every point about the origin by `angle` radians (counter-clockwise).
pub fn rotate(points: &[Point2], angle: f64) -> Vec<Point2> {
    let (sin, cos) = angle.sin_cos();
    points
        .iter()
        .map(|&[x, y]| [cos * x - sin * y, sin * x + cos * y])
        .collect()
}

/// Bring any finite angle into `[0, 2π)`.
pub fn normalize_angle(a: f64) -> f64 {
    let wrapped = a.rem_euclid(TAU);
    // -ε reduced by one turn can round up to exactly 2π
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Convert polar `(r, theta)` to a cartesian point.
pub fn polar_to_cartesian(r: f64, theta: f64) -> Point2 {
    let (sin, cos) = theta.sin_cos();
    [r * cos, r * sin]
}

/// Euclidean length of a point seen as a vector.
pub fn norm(p: Point2) -> f64 {
    p[0].hypot(p[1])
}
