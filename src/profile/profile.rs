use serde::{Deserialize, Serialize};

use super::circular::wrap;
use crate::error::{ProfileError, Result};

/// A 1D signal sampled once per border point, read circularly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    values: Vec<f64>,
}

impl Profile {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ProfileError::InvalidLength {
                requested: 0,
                segments: 0,
            });
        }
        Ok(Self { values })
    }

    /// A profile of `len` copies of `value`.
    pub fn constant(value: f64, len: usize) -> Result<Self> {
        Self::new(vec![value; len])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Result<f64> {
        self.values
            .get(index)
            .copied()
            .ok_or(ProfileError::IndexOutOfBounds {
                index,
                length: self.len(),
            })
    }

    /// Value at a signed index, wrapping around the border.
    pub fn get_wrapped(&self, index: isize) -> f64 {
        self.values[wrap(index, self.len())]
    }

    /// Value at a fractional position in `[0, 1]` of the border, linearly
    /// interpolated between the two bracketing samples. `1.0` is the same
    /// position as `0.0`.
    pub fn get_fraction(&self, fraction: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ProfileError::InvariantViolation(format!(
                "fraction {} must be between 0 and 1",
                fraction
            )));
        }
        Ok(self.value_at_position(fraction * self.len() as f64))
    }

    /// Linear interpolation at a continuous position measured in samples.
    fn value_at_position(&self, position: f64) -> f64 {
        let n = self.len();
        let j0 = position.floor() as usize % n;
        let j1 = (j0 + 1) % n;
        let f = position - position.floor();
        self.values[j0] + (self.values[j1] - self.values[j0]) * f
    }

    pub fn index_of_fraction(&self, fraction: f64) -> usize {
        let index = (self.len() as f64 * fraction.clamp(0.0, 1.0)) as usize;
        index.min(self.len() - 1)
    }

    pub fn fraction_of_index(&self, index: usize) -> Result<f64> {
        if index >= self.len() {
            return Err(ProfileError::IndexOutOfBounds {
                index,
                length: self.len(),
            });
        }
        Ok(index as f64 / self.len() as f64)
    }

    /// Resamples to `new_len` points. Sample `i` is read at position
    /// `i * len / new_len`, so resampling to the current length is exact.
    pub fn interpolate(&self, new_len: usize) -> Result<Profile> {
        if new_len == 0 {
            return Err(ProfileError::InvalidLength {
                requested: 0,
                segments: 0,
            });
        }
        if new_len == self.len() {
            return Ok(self.clone());
        }
        let old_len = self.len() as f64;
        let values = (0..new_len)
            .map(|i| self.value_at_position(i as f64 * old_len / new_len as f64))
            .collect();
        Ok(Profile { values })
    }

    /// Rotates so that `index` becomes position 0.
    pub fn start_from(&self, index: isize) -> Profile {
        let mut values = self.values.clone();
        values.rotate_left(wrap(index, self.len()));
        Profile { values }
    }

    /// Mirrors the profile about index 0: new index `j` reads old index `-j`.
    pub fn reverse(&self) -> Profile {
        let n = self.len() as isize;
        let values = (0..n).map(|j| self.get_wrapped(-j)).collect();
        Profile { values }
    }

    /// Circular moving average over `2 * window + 1` samples.
    pub fn smooth(&self, window: usize) -> Result<Profile> {
        if window < 1 {
            return Err(ProfileError::InvariantViolation(
                "smoothing window must be a positive integer".to_string(),
            ));
        }
        let w = window as isize;
        let values = (0..self.len() as isize)
            .map(|i| {
                let sum: f64 = (-w..=w).map(|k| self.get_wrapped(i + k)).sum();
                sum / (2 * window + 1) as f64
            })
            .collect();
        Ok(Profile { values })
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::MIN, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::MAX, f64::min)
    }

    /// First index holding the maximum value.
    pub fn index_of_max(&self) -> usize {
        let mut best = 0;
        for (i, v) in self.values.iter().enumerate() {
            if *v > self.values[best] {
                best = i;
            }
        }
        best
    }

    /// First index holding the minimum value.
    pub fn index_of_min(&self) -> usize {
        let mut best = 0;
        for (i, v) in self.values.iter().enumerate() {
            if *v < self.values[best] {
                best = i;
            }
        }
        best
    }

    /// Sum of squared differences, lengthening the shorter profile first.
    pub fn absolute_square_difference(&self, other: &Profile) -> Result<f64> {
        let len = self.len().max(other.len());
        let a = self.interpolate(len)?;
        let b = other.interpolate(len)?;
        Ok(square_difference(&a.values, &b.values))
    }

    /// Offset by which `other` must be rotated to best match this profile.
    pub fn best_fit_offset(&self, other: &Profile) -> Result<usize> {
        let test = other.interpolate(self.len())?;
        let mut best_offset = 0;
        let mut best_score = f64::INFINITY;
        for offset in 0..self.len() {
            let shifted = test.start_from(offset as isize);
            let score = square_difference(&self.values, &shifted.values);
            if score < best_score {
                best_score = score;
                best_offset = offset;
            }
        }
        Ok(best_offset)
    }
}

fn square_difference(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
