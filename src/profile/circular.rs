//! Modular index arithmetic for closed borders.
//!
//! Every position on a profile of length `len` lives in `[0, len)`, and
//! index `len` is the same position as index `0`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An index on a circular profile, always normalised into `[0, len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CircularIndex {
    index: usize,
    len: usize,
}

impl CircularIndex {
    /// Creates a normalised index. `len` must be non-zero.
    pub fn new(index: isize, len: usize) -> Self {
        assert!(len > 0, "circular index needs a non-empty profile");
        Self {
            index: wrap(index, len),
            len,
        }
    }

    pub fn get(self) -> usize {
        self.index
    }

    pub fn len(self) -> usize {
        self.len
    }

    /// Moves the index by `delta` positions, wrapping in either direction.
    pub fn offset(self, delta: isize) -> Self {
        Self::new(self.index as isize + delta, self.len)
    }

    pub fn next(self) -> Self {
        self.offset(1)
    }

    pub fn prev(self) -> Self {
        self.offset(-1)
    }

    /// Steps needed to walk forward from `self` to `other`.
    pub fn distance_to(self, other: CircularIndex) -> usize {
        forward_distance(self.index, other.index, self.len)
    }
}

impl fmt::Display for CircularIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.len)
    }
}

/// Euclidean wrap of a signed index into `[0, len)`.
pub fn wrap(index: isize, len: usize) -> usize {
    index.rem_euclid(len as isize) as usize
}

/// Number of forward steps from `from` to `to`, in `[0, len)`.
pub fn forward_distance(from: usize, to: usize, len: usize) -> usize {
    wrap(to as isize - from as isize, len)
}

/// Shortest distance between two indices going either way round.
pub fn shortest_distance(a: usize, b: usize, len: usize) -> usize {
    let abs = a.abs_diff(b) % len;
    abs.min(len - abs)
}

/// Whether `index` falls in the half-open circular range `[start, end)`.
///
/// `start == end` is a range covering the whole circle.
pub fn range_contains(start: usize, end: usize, index: usize, len: usize) -> bool {
    if start == end {
        return index < len;
    }
    forward_distance(start, index, len) < forward_distance(start, end, len)
}

/// Length of the half-open circular range `[start, end)`; `start == end` is the full circle.
pub fn range_length(start: usize, end: usize, len: usize) -> usize {
    match forward_distance(start, end, len) {
        0 => len,
        d => d,
    }
}

/// Rescales an index from a profile of `from_len` onto one of `to_len`,
/// rounding to the nearest position.
pub fn rescale(index: usize, from_len: usize, to_len: usize) -> usize {
    let scaled = (index as f64 * to_len as f64 / from_len as f64).round() as usize;
    scaled % to_len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_negative_and_overflowing() {
        assert_eq!(wrap(-1, 10), 9);
        assert_eq!(wrap(-336, 330), 324);
        assert_eq!(wrap(10, 10), 0);
        assert_eq!(wrap(23, 10), 3);
    }

    #[test]
    fn test_forward_and_shortest_distance() {
        assert_eq!(forward_distance(8, 2, 10), 4);
        assert_eq!(forward_distance(2, 8, 10), 6);
        assert_eq!(shortest_distance(8, 2, 10), 4);
        assert_eq!(shortest_distance(1, 9, 10), 2);
    }

    #[test]
    fn test_range_contains_wrapping() {
        // [55, 10) on a profile of 100 wraps through zero
        assert!(range_contains(55, 10, 99, 100));
        assert!(range_contains(55, 10, 0, 100));
        assert!(range_contains(55, 10, 55, 100));
        assert!(!range_contains(55, 10, 10, 100));
        assert!(!range_contains(55, 10, 30, 100));
        assert!(range_contains(3, 3, 42, 100));
    }

    #[test]
    fn test_range_length() {
        assert_eq!(range_length(10, 55, 100), 45);
        assert_eq!(range_length(55, 10, 100), 55);
        assert_eq!(range_length(7, 7, 100), 100);
    }

    #[test]
    fn test_circular_index_offsets() {
        let i = CircularIndex::new(0, 5);
        assert_eq!(i.prev().get(), 4);
        assert_eq!(i.offset(12).get(), 2);
        assert_eq!(i.distance_to(CircularIndex::new(-1, 5)), 4);
    }

    #[test]
    fn test_rescale_rounds_and_wraps() {
        assert_eq!(rescale(50, 100, 10), 5);
        assert_eq!(rescale(99, 100, 10), 0);
        assert_eq!(rescale(14, 100, 10), 1);
    }
}
