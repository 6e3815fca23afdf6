pub mod profiler;

use nalgebra::{distance, Point2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{ProfileError, Result};
use crate::profile::circular::wrap;

/// Axis-aligned box, inclusive on all sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Closed border of one detected object: an ordered ring of points where
/// the point after the last is the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    points: Vec<Point2<f64>>,
}

impl Outline {
    pub fn new(points: Vec<Point2<f64>>) -> Result<Self> {
        if points.len() < 3 {
            return Err(ProfileError::TooFewPoints(points.len()));
        }
        Ok(Self { points })
    }

    pub fn from_xy(xs: &[f64], ys: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(ProfileError::ProfileLengthMismatch {
                expected: xs.len(),
                found: ys.len(),
            });
        }
        Self::new(xs.iter().zip(ys).map(|(x, y)| Point2::new(*x, *y)).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// Point at a signed index, wrapping around the border.
    pub fn point(&self, index: isize) -> Point2<f64> {
        self.points[wrap(index, self.len())]
    }

    /// Mean of the border points.
    pub fn centre_of_mass(&self) -> Point2<f64> {
        let (sum_x, sum_y) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        let n = self.points.len() as f64;
        Point2::new(sum_x / n, sum_y / n)
    }

    pub fn area(&self) -> f64 {
        let n = self.points.len();
        let mut area = 0.0;
        for i in 0..n {
            let p1 = &self.points[i];
            let p2 = &self.points[(i + 1) % n];
            area += p1.x * p2.y - p2.x * p1.y;
        }
        0.5 * area.abs()
    }

    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        (0..n)
            .map(|i| distance(&self.points[i], &self.points[(i + 1) % n]))
            .sum()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.points.iter().fold(
            BoundingBox {
                xmin: f64::MAX,
                xmax: f64::MIN,
                ymin: f64::MAX,
                ymax: f64::MIN,
            },
            |b, p| BoundingBox {
                xmin: b.xmin.min(p.x),
                xmax: b.xmax.max(p.x),
                ymin: b.ymin.min(p.y),
                ymax: b.ymax.max(p.y),
            },
        )
    }

    /// Even-odd ray casting test.
    pub fn contains(&self, p: Point2<f64>) -> bool {
        let n = self.points.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (&self.points[i], &self.points[j]);
            if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Index of the border point nearest to `target`, with its distance.
    /// Ties go to the lowest index. `None` when no distance is comparable,
    /// e.g. for a non-finite target.
    pub fn nearest_index(&self, target: Point2<f64>) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, p) in self.points.iter().enumerate() {
            let d = distance(p, &target);
            if d.is_nan() {
                continue;
            }
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((i, d)),
            }
        }
        best
    }

    /// Index of the border point lying most nearly opposite `index`
    /// through the centre of mass.
    pub fn opposite_index(&self, index: usize) -> usize {
        let com = self.centre_of_mass();
        let theta = |p: &Point2<f64>| {
            let mut t = (p.y - com.y).atan2(p.x - com.x);
            if t < 0.0 {
                t += 2.0 * PI;
            }
            t
        };
        let origin = theta(&self.point(index as isize));

        let mut best_angle_diff = f64::MAX;
        let mut best_j = index;
        for (j, p) in self.points.iter().enumerate() {
            if j == index {
                continue;
            }
            let mut delta = (theta(p) - origin).abs();
            if delta > PI {
                delta = 2.0 * PI - delta;
            }
            let diff = (delta - PI).abs();
            if diff < best_angle_diff {
                best_angle_diff = diff;
                best_j = j;
            }
        }
        best_j
    }

    /// Translates every point by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in self.points.iter_mut() {
            p.x += dx;
            p.y += dy;
        }
    }
}
