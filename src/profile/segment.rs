use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::circular::{forward_distance, range_contains, range_length, wrap};
use crate::error::{ProfileError, Result};

/// Stable identity of a segment; the join key across resampling and re-analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(Uuid);

impl SegmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Id of the single segment spanning an unsegmented profile.
    pub fn default_segment() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_default(&self) -> bool {
        self.0.is_nil()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SegmentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A contiguous half-open range `[start, end)` of a circular profile.
///
/// `end` is the start of the following segment. A segment with
/// `start == end` spans the whole profile and only occurs when it is the
/// sole segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    start: usize,
    end: usize,
    profile_length: usize,
    /// The segments this one was merged from, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    merge_sources: Vec<Segment>,
}

impl Segment {
    pub fn new(id: SegmentId, start: usize, end: usize, profile_length: usize) -> Result<Self> {
        if profile_length == 0 {
            return Err(ProfileError::InvalidLength {
                requested: 0,
                segments: 1,
            });
        }
        for index in [start, end] {
            if index >= profile_length {
                return Err(ProfileError::IndexOutOfBounds {
                    index,
                    length: profile_length,
                });
            }
        }
        Ok(Self {
            id,
            start,
            end,
            profile_length,
            merge_sources: Vec::new(),
        })
    }

    /// The segment covering an entire profile.
    pub fn full(id: SegmentId, profile_length: usize) -> Result<Self> {
        Self::new(id, 0, 0, profile_length)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn profile_length(&self) -> usize {
        self.profile_length
    }

    /// Number of indices covered.
    pub fn length(&self) -> usize {
        range_length(self.start, self.end, self.profile_length)
    }

    pub fn contains(&self, index: usize) -> bool {
        range_contains(self.start, self.end, index, self.profile_length)
    }

    /// Whether the segment runs through index 0 without starting there.
    pub fn wraps(&self) -> bool {
        self.start != 0 && self.start >= self.end
    }

    pub fn is_full(&self) -> bool {
        self.start == self.end
    }

    pub fn midpoint(&self) -> usize {
        wrap((self.start + self.length() / 2) as isize, self.profile_length)
    }

    /// Index at fraction `f` of the way through the segment.
    pub fn proportional_index(&self, fraction: f64) -> Result<usize> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ProfileError::InvariantViolation(format!(
                "proportion {} must be between 0 and 1",
                fraction
            )));
        }
        let steps = (self.length() as f64 * fraction).round() as isize;
        Ok(wrap(self.start as isize + steps, self.profile_length))
    }

    /// Fraction of the way through the segment at which `index` sits.
    pub fn index_proportion(&self, index: usize) -> Result<f64> {
        if !self.contains(index) {
            return Err(ProfileError::IndexOutOfBounds {
                index,
                length: self.profile_length,
            });
        }
        let steps = forward_distance(self.start, index, self.profile_length);
        Ok(steps as f64 / self.length() as f64)
    }

    /// Shifts both ends by `delta`, keeping the length.
    pub fn offset(&self, delta: isize) -> Segment {
        Segment {
            id: self.id,
            start: wrap(self.start as isize + delta, self.profile_length),
            end: wrap(self.end as isize + delta, self.profile_length),
            profile_length: self.profile_length,
            merge_sources: self.merge_sources.iter().map(|s| s.offset(delta)).collect(),
        }
    }

    /// Mirror image under the index reflection `i -> -i`.
    pub fn reflect(&self) -> Segment {
        let len = self.profile_length as isize;
        Segment {
            id: self.id,
            start: wrap(len - self.end as isize, self.profile_length),
            end: wrap(len - self.start as isize, self.profile_length),
            profile_length: self.profile_length,
            merge_sources: self
                .merge_sources
                .iter()
                .rev()
                .map(Segment::reflect)
                .collect(),
        }
    }

    pub(crate) fn set_bounds(&mut self, start: usize, end: usize) {
        self.start = start;
        self.end = end;
    }

    pub fn merge_sources(&self) -> &[Segment] {
        &self.merge_sources
    }

    pub fn has_merge_sources(&self) -> bool {
        !self.merge_sources.is_empty()
    }

    pub(crate) fn set_merge_sources(&mut self, sources: Vec<Segment>) {
        self.merge_sources = sources;
    }

    pub(crate) fn clear_merge_sources(&mut self) {
        self.merge_sources.clear();
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Segment {} [{}-{}) of {} (length {})",
            self.id,
            self.start,
            self.end,
            self.profile_length,
            self.length()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_length_and_contains_wrapping_segment() {
        let seg = Segment::new(SegmentId::new(), 55, 10, 100).unwrap();
        assert_eq!(seg.length(), 55);
        assert!(seg.wraps());
        assert!(seg.contains(0));
        assert!(seg.contains(55));
        assert!(!seg.contains(10));
    }

    #[test]
    fn test_full_segment() {
        let seg = Segment::full(SegmentId::default_segment(), 40).unwrap();
        assert!(seg.is_full());
        assert_eq!(seg.length(), 40);
        assert!(seg.contains(39));
        assert!(seg.id.is_default());
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        assert!(Segment::new(SegmentId::new(), 0, 100, 100).is_err());
        assert!(Segment::new(SegmentId::new(), 0, 0, 0).is_err());
    }

    #[test]
    fn test_midpoint_and_proportions() {
        let seg = Segment::new(SegmentId::new(), 90, 10, 100).unwrap();
        assert_eq!(seg.midpoint(), 0);
        assert_eq!(seg.proportional_index(0.25).unwrap(), 95);
        assert_relative_eq!(seg.index_proportion(5).unwrap(), 0.75);
        assert!(seg.index_proportion(50).is_err());
    }

    #[test]
    fn test_offset_and_reflect() {
        let seg = Segment::new(SegmentId::new(), 10, 55, 100).unwrap();
        let moved = seg.offset(-20);
        assert_eq!((moved.start(), moved.end()), (90, 35));
        assert_eq!(moved.length(), seg.length());
        let mirrored = seg.reflect();
        assert_eq!((mirrored.start(), mirrored.end()), (45, 90));
        assert_eq!(mirrored.reflect(), seg);
    }

    #[test]
    fn test_segment_id_parse() {
        let id = SegmentId::new();
        assert_eq!(id.to_string().parse::<SegmentId>().unwrap(), id);
        assert!("not-a-uuid".parse::<SegmentId>().is_err());
    }
}
