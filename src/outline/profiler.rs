use nalgebra::{distance, Point2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Outline;
use crate::error::{ProfileError, Result};
use crate::profile::Profile;

/// Measurement taken at each border point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    /// Interior angle in degrees, 0 to 360.
    #[default]
    Angle,
    /// Distance to the centre of mass.
    Radius,
    /// Distance to the opposite border point.
    Diameter,
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProfileType::Angle => "angle",
            ProfileType::Radius => "radius",
            ProfileType::Diameter => "diameter",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ProfileType {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "angle" => Ok(ProfileType::Angle),
            "radius" => Ok(ProfileType::Radius),
            "diameter" => Ok(ProfileType::Diameter),
            other => Err(ProfileError::InvariantViolation(format!(
                "unknown profile type '{}'",
                other
            ))),
        }
    }
}

/// Angle window in points for an outline of `n` points.
pub fn window_size(n: usize, proportion: f64) -> usize {
    ((n as f64 * proportion).round() as usize).max(1)
}

/// Builds a profile with one value per outline point.
pub fn create_profile(outline: &Outline, kind: ProfileType, window: usize) -> Result<Profile> {
    let n = outline.len();
    let values: Vec<f64> = match kind {
        ProfileType::Angle => {
            if window == 0 || 2 * window >= n {
                return Err(ProfileError::InvalidLength {
                    requested: window,
                    segments: n,
                });
            }
            (0..n)
                .into_par_iter()
                .map(|i| interior_angle(outline, i, window))
                .collect()
        }
        ProfileType::Radius => {
            let com = outline.centre_of_mass();
            outline.points().par_iter().map(|p| distance(p, &com)).collect()
        }
        ProfileType::Diameter => (0..n)
            .into_par_iter()
            .map(|i| {
                let j = outline.opposite_index(i);
                distance(&outline.points()[i], &outline.points()[j])
            })
            .collect(),
    };
    Profile::new(values)
}

fn interior_angle(outline: &Outline, i: usize, window: usize) -> f64 {
    let here = outline.point(i as isize);
    let before = outline.point(i as isize - window as isize);
    let after = outline.point(i as isize + window as isize);

    let a = before - here;
    let b = after - here;
    let norm = a.norm() * b.norm();
    if norm == 0.0 {
        return 180.0;
    }
    let angle = (a.dot(&b) / norm).clamp(-1.0, 1.0).acos().to_degrees();

    let midpoint = Point2::new((before.x + after.x) / 2.0, (before.y + after.y) / 2.0);
    if outline.contains(midpoint) {
        angle
    } else {
        360.0 - angle
    }
}
