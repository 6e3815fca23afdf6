use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::outline::Outline;
use crate::profile::{Profile, Segment, SegmentId};

/// Generates an elliptical outline for testing
pub fn ellipse_outline(
    major: f64,
    minor: f64,
    num_points: usize,
    rotation: f64,
    translation: (f64, f64),
) -> Outline {
    let points = (0..num_points)
        .map(|i| {
            let theta = 2.0 * PI * (i as f64) / (num_points as f64);
            let (x, y) = rotate_point((major * theta.cos(), minor * theta.sin()), rotation);
            Point2::new(x + translation.0, y + translation.1)
        })
        .collect();
    Outline::new(points).unwrap()
}

/// Ellipse with every point pushed in or out radially by up to `jitter`
pub fn jittered_outline(major: f64, minor: f64, num_points: usize, jitter: f64, seed: u64) -> Outline {
    let mut rng = StdRng::seed_from_u64(seed);
    let points = ellipse_outline(major, minor, num_points, 0.0, (0.0, 0.0))
        .points()
        .iter()
        .map(|p| {
            let scale = 1.0 + rng.random_range(-jitter..=jitter) / p.coords.norm();
            Point2::new(p.x * scale, p.y * scale)
        })
        .collect();
    Outline::new(points).unwrap()
}

/// Rotates a point around origin
pub fn rotate_point(point: (f64, f64), angle: f64) -> (f64, f64) {
    let (x, y) = point;
    let cos = angle.cos();
    let sin = angle.sin();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Profile whose value at `i` is `i`, handy for checking rotations
pub fn ramp_profile(len: usize) -> Profile {
    Profile::new((0..len).map(|i| i as f64).collect()).unwrap()
}

/// Segments tiling a profile of `len`, each starting at one of `starts`
/// (ascending) and ending at the next
pub fn segments_at(starts: &[usize], len: usize) -> Vec<Segment> {
    let k = starts.len();
    (0..k)
        .map(|i| Segment::new(SegmentId::new(), starts[i], starts[(i + 1) % k], len).unwrap())
        .collect()
}
