use log::debug;
use std::collections::{BTreeMap, HashSet};

use super::circular::{forward_distance, wrap};
use super::landmark::Landmark;
use super::profile::Profile;
use super::segment::{Segment, SegmentId};
use crate::error::{ProfileError, Result};

/// A profile partitioned into circularly tiling segments, plus the border
/// indices of its landmarks.
///
/// Segments are stored in traversal order starting from the segment that
/// contains index 0. Tiling and landmark bounds are checked on every
/// mutation. Alignment of the reference landmark with a segment start is
/// checked by [`SegmentedProfile::validate`], since moving a landmark
/// alone (see `processing::snap`) leaves segment resynchronisation to the
/// caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedProfile {
    profile: Profile,
    segments: Vec<Segment>,
    landmarks: BTreeMap<Landmark, usize>,
}

type Check = fn(&SegmentedProfile) -> Result<()>;

const STRUCTURE_CHECKS: &[(&str, Check)] = &[
    ("check_segment_lengths", check_segment_lengths),
    ("check_unique_ids", check_unique_ids),
    ("check_segment_chain", check_segment_chain),
    ("check_zero_segment", check_zero_segment),
    ("check_landmark_bounds", check_landmark_bounds),
];

const REFERENCE_CHECKS: &[(&str, Check)] = &[("check_reference_boundary", check_reference_boundary)];

impl SegmentedProfile {
    pub fn new(
        profile: Profile,
        segments: Vec<Segment>,
        landmarks: impl IntoIterator<Item = (Landmark, usize)>,
    ) -> Result<Self> {
        let segments = order_segments(segments, profile.len())?;
        let sp = Self {
            profile,
            segments,
            landmarks: landmarks.into_iter().collect(),
        };
        sp.run_checks(STRUCTURE_CHECKS)?;
        Ok(sp)
    }

    /// A profile with one segment covering every index and no landmarks.
    pub fn unsegmented(profile: Profile) -> Result<Self> {
        let full = Segment::full(SegmentId::default_segment(), profile.len())?;
        Self::new(profile, vec![full], std::iter::empty())
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn len(&self) -> usize {
        self.profile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profile.is_empty()
    }

    /// Segments in traversal order from the zero segment.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment_ids(&self) -> Vec<SegmentId> {
        self.segments.iter().map(|s| s.id).collect()
    }

    pub fn has_segment(&self, id: SegmentId) -> bool {
        self.segments.iter().any(|s| s.id == id)
    }

    pub fn segment(&self, id: SegmentId) -> Result<&Segment> {
        self.segments
            .iter()
            .find(|s| s.id == id)
            .ok_or(ProfileError::MissingSegment(id))
    }

    fn position_of(&self, id: SegmentId) -> Result<usize> {
        self.segments
            .iter()
            .position(|s| s.id == id)
            .ok_or(ProfileError::MissingSegment(id))
    }

    pub fn segment_starting_at(&self, index: usize) -> Option<&Segment> {
        self.segments.iter().find(|s| s.start() == index)
    }

    pub fn segment_containing(&self, index: usize) -> Result<&Segment> {
        if index >= self.len() {
            return Err(ProfileError::IndexOutOfBounds {
                index,
                length: self.len(),
            });
        }
        self.segments
            .iter()
            .find(|s| s.contains(index))
            .ok_or_else(|| ProfileError::InvariantViolation(format!("index {} in no segment", index)))
    }

    pub fn next_segment(&self, id: SegmentId) -> Result<&Segment> {
        let p = self.position_of(id)?;
        Ok(&self.segments[(p + 1) % self.segments.len()])
    }

    pub fn prev_segment(&self, id: SegmentId) -> Result<&Segment> {
        let p = self.position_of(id)?;
        let k = self.segments.len();
        Ok(&self.segments[(p + k - 1) % k])
    }

    /// All segments in traversal order, beginning with `id`.
    pub fn segments_from(&self, id: SegmentId) -> Result<Vec<&Segment>> {
        let p = self.position_of(id)?;
        let k = self.segments.len();
        Ok((0..k).map(|i| &self.segments[(p + i) % k]).collect())
    }

    /// Segments in traversal order from the one starting at the reference
    /// landmark, falling back to zero-segment order.
    pub fn segments_from_reference(&self) -> Vec<&Segment> {
        self.reference_index()
            .and_then(|rp| self.segment_starting_at(rp))
            .and_then(|seg| self.segments_from(seg.id).ok())
            .unwrap_or_else(|| self.segments.iter().collect())
    }

    pub fn landmarks(&self) -> &BTreeMap<Landmark, usize> {
        &self.landmarks
    }

    pub fn landmark(&self, landmark: &Landmark) -> Option<usize> {
        self.landmarks.get(landmark).copied()
    }

    pub fn reference_index(&self) -> Option<usize> {
        self.landmark(&Landmark::Reference)
    }

    /// Places a landmark, returning its previous index if it had one.
    pub fn set_landmark(&mut self, landmark: Landmark, index: usize) -> Result<Option<usize>> {
        if index >= self.len() {
            return Err(ProfileError::IndexOutOfBounds {
                index,
                length: self.len(),
            });
        }
        Ok(self.landmarks.insert(landmark, index))
    }

    pub fn remove_landmark(&mut self, landmark: &Landmark) -> Option<usize> {
        self.landmarks.remove(landmark)
    }

    /// Checks every invariant, including reference alignment.
    pub fn validate(&self) -> Result<()> {
        self.run_checks(STRUCTURE_CHECKS)?;
        self.run_checks(REFERENCE_CHECKS)
    }

    /// Checks tiling, order and landmark bounds only.
    pub fn validate_structure(&self) -> Result<()> {
        self.run_checks(STRUCTURE_CHECKS)
    }

    /// Whether the reference landmark, if present, sits on a segment start.
    pub fn is_reference_aligned(&self) -> bool {
        check_reference_boundary(self).is_ok()
    }

    fn run_checks(&self, checks: &[(&str, Check)]) -> Result<()> {
        for (name, f) in checks {
            if let Err(e) = f(self) {
                debug!("Integrity check '{}' failed: {}", name, e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Swaps in a new segment list over the same profile. The profile is
    /// left untouched if the new list does not tile it.
    pub(crate) fn replace_segments(&mut self, segments: Vec<Segment>) -> Result<()> {
        let ordered = order_segments(segments, self.len())?;
        let previous = std::mem::replace(&mut self.segments, ordered);
        if let Err(e) = self.run_checks(STRUCTURE_CHECKS) {
            self.segments = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Moves the start and end of one segment. The neighbouring segments
    /// give up or take the difference; no boundary may cross another.
    pub fn update_segment(&mut self, id: SegmentId, start: usize, end: usize) -> Result<()> {
        let len = self.len();
        for index in [start, end] {
            if index >= len {
                return Err(ProfileError::IndexOutOfBounds { index, length: len });
            }
        }
        let p = self.position_of(id)?;
        let k = self.segments.len();

        if k == 1 {
            if start != end {
                return Err(ProfileError::SegmentUpdate(
                    "a lone segment must start where it ends".to_string(),
                ));
            }
            let mut seg = self.segments[0].clone();
            seg.set_bounds(start, end);
            return self.replace_segments(vec![seg]);
        }

        let mut boundaries: Vec<usize> = self.segments.iter().map(|s| s.start()).collect();
        boundaries[p] = start;
        boundaries[(p + 1) % k] = end;

        let mut total = 0;
        for i in 0..k {
            let length = forward_distance(boundaries[i], boundaries[(i + 1) % k], len);
            if length == 0 {
                return Err(ProfileError::SegmentUpdate(format!(
                    "moving {} to {}-{} would collapse a segment",
                    id, start, end
                )));
            }
            total += length;
        }
        if total != len {
            return Err(ProfileError::SegmentUpdate(format!(
                "moving {} to {}-{} would cross another segment",
                id, start, end
            )));
        }

        let segments = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut seg = s.clone();
                let (new_start, new_end) = (boundaries[i], boundaries[(i + 1) % k]);
                if (new_start, new_end) != (s.start(), s.end()) {
                    seg.set_bounds(new_start, new_end);
                    seg.clear_merge_sources();
                }
                seg
            })
            .collect();
        self.replace_segments(segments)
    }

    /// Joins two adjacent segments into one with id `new_id`. The merged
    /// segment remembers its sources so the merge can be undone.
    pub fn merge_segments(&mut self, a: SegmentId, b: SegmentId, new_id: SegmentId) -> Result<()> {
        let seg_a = self.segment(a)?.clone();
        let seg_b = self.segment(b)?.clone();
        if a == b {
            return Err(ProfileError::SegmentUpdate("cannot merge a segment with itself".to_string()));
        }
        if new_id != a && new_id != b && self.has_segment(new_id) {
            return Err(ProfileError::SegmentUpdate(format!("id {} already in use", new_id)));
        }

        let (first, second) = if seg_a.end() == seg_b.start() {
            (seg_a, seg_b)
        } else if seg_b.end() == seg_a.start() {
            (seg_b, seg_a)
        } else {
            return Err(ProfileError::SegmentUpdate(format!(
                "segments {} and {} are not adjacent",
                a, b
            )));
        };

        let mut merged = Segment::new(new_id, first.start(), second.end(), self.len())?;
        let (first_id, second_id) = (first.id, second.id);
        merged.set_merge_sources(vec![first, second]);

        let segments = self
            .segments
            .iter()
            .filter(|s| s.id != second_id)
            .map(|s| if s.id == first_id { merged.clone() } else { s.clone() })
            .collect();
        self.replace_segments(segments)
    }

    /// Restores the segments a merged segment was built from. Returns
    /// `false` if the segment was never merged.
    pub fn unmerge_segment(&mut self, id: SegmentId) -> Result<bool> {
        let seg = self.segment(id)?;
        if !seg.has_merge_sources() {
            return Ok(false);
        }
        let sources = seg.merge_sources().to_vec();
        let mut segments: Vec<Segment> = self.segments.iter().filter(|s| s.id != id).cloned().collect();
        segments.extend(sources);
        self.replace_segments(segments)?;
        Ok(true)
    }

    /// Splits a segment at `at` into `[start, at)` and `[at, end)`.
    pub fn split_segment(
        &mut self,
        id: SegmentId,
        at: usize,
        first_id: SegmentId,
        second_id: SegmentId,
    ) -> Result<()> {
        let seg = self.segment(id)?.clone();
        if !seg.contains(at) || at == seg.start() {
            return Err(ProfileError::SegmentUpdate(format!(
                "split index {} is not inside {}",
                at, seg
            )));
        }
        if first_id == second_id
            || [first_id, second_id]
                .iter()
                .any(|new| *new != id && self.has_segment(*new))
        {
            return Err(ProfileError::SegmentUpdate("split ids must be new and distinct".to_string()));
        }

        let first = Segment::new(first_id, seg.start(), at, self.len())?;
        let second = Segment::new(second_id, at, seg.end(), self.len())?;
        let mut segments: Vec<Segment> = self.segments.iter().filter(|s| s.id != id).cloned().collect();
        segments.push(first);
        segments.push(second);
        self.replace_segments(segments)
    }

    /// Rotates profile, segments and landmarks so that `index` becomes 0.
    pub fn start_from(&self, index: usize) -> Result<SegmentedProfile> {
        let delta = -(index as isize);
        let len = self.len();
        let segments = self.segments.iter().map(|s| s.offset(delta)).collect();
        let landmarks = self
            .landmarks
            .iter()
            .map(|(lm, i)| (lm.clone(), wrap(*i as isize + delta, len)));
        SegmentedProfile::new(self.profile.start_from(index as isize), segments, landmarks)
    }

    /// Reverses the direction of travel around the border, keeping index 0
    /// in place: index `i` moves to `-i`.
    pub fn reverse(&self) -> Result<SegmentedProfile> {
        let len = self.len();
        let segments = self.segments.iter().map(Segment::reflect).collect();
        let landmarks = self
            .landmarks
            .iter()
            .map(|(lm, i)| (lm.clone(), wrap(-(*i as isize), len)));
        SegmentedProfile::new(self.profile.reverse(), segments, landmarks)
    }

    /// Same profile values, fresh unsegmented state. Landmarks are kept.
    pub fn clear_segments(&mut self) -> Result<()> {
        let full = Segment::full(SegmentId::default_segment(), self.len())?;
        self.replace_segments(vec![full])
    }
}

/// Orders segments by walking the adjacency chain from the segment that
/// contains index 0.
pub(crate) fn order_segments(segments: Vec<Segment>, len: usize) -> Result<Vec<Segment>> {
    if segments.is_empty() {
        return Err(ProfileError::InvariantViolation("profile has no segments".to_string()));
    }
    if let Some(bad) = segments.iter().find(|s| s.profile_length() != len) {
        return Err(ProfileError::ProfileLengthMismatch {
            expected: len,
            found: bad.profile_length(),
        });
    }
    if segments.len() == 1 {
        return Ok(segments);
    }

    let zero = segments
        .iter()
        .position(|s| s.contains(0) && !s.is_full())
        .ok_or_else(|| ProfileError::InvariantViolation("no segment covers index 0".to_string()))?;

    let mut remaining = segments;
    let mut ordered = Vec::with_capacity(remaining.len());
    ordered.push(remaining.swap_remove(zero));
    while !remaining.is_empty() {
        let end = ordered[ordered.len() - 1].end();
        let next = remaining.iter().position(|s| s.start() == end).ok_or_else(|| {
            ProfileError::InvariantViolation(format!("no segment starts at boundary {}", end))
        })?;
        ordered.push(remaining.swap_remove(next));
    }
    Ok(ordered)
}

fn check_segment_lengths(sp: &SegmentedProfile) -> Result<()> {
    let len = sp.len();
    if sp.segments.len() > len {
        return Err(ProfileError::InvalidLength {
            requested: len,
            segments: sp.segments.len(),
        });
    }
    if sp.segments.len() > 1 {
        if let Some(full) = sp.segments.iter().find(|s| s.is_full()) {
            return Err(ProfileError::InvariantViolation(format!(
                "{} has zero length next to other segments",
                full
            )));
        }
    }
    let total: usize = sp.segments.iter().map(Segment::length).sum();
    if total != len {
        return Err(ProfileError::InvariantViolation(format!(
            "segments cover {} indices of a profile of {}",
            total, len
        )));
    }
    Ok(())
}

fn check_unique_ids(sp: &SegmentedProfile) -> Result<()> {
    let mut seen = HashSet::new();
    for seg in &sp.segments {
        if !seen.insert(seg.id) {
            return Err(ProfileError::InvariantViolation(format!("duplicate segment id {}", seg.id)));
        }
    }
    Ok(())
}

fn check_segment_chain(sp: &SegmentedProfile) -> Result<()> {
    let k = sp.segments.len();
    for i in 0..k {
        let (current, next) = (&sp.segments[i], &sp.segments[(i + 1) % k]);
        if current.end() != next.start() {
            return Err(ProfileError::InvariantViolation(format!(
                "{} does not end where {} starts",
                current, next
            )));
        }
    }
    Ok(())
}

fn check_zero_segment(sp: &SegmentedProfile) -> Result<()> {
    match sp.segments.first() {
        Some(first) if first.contains(0) => Ok(()),
        _ => Err(ProfileError::InvariantViolation(
            "first stored segment does not contain index 0".to_string(),
        )),
    }
}

fn check_landmark_bounds(sp: &SegmentedProfile) -> Result<()> {
    for (landmark, index) in &sp.landmarks {
        if *index >= sp.len() {
            return Err(ProfileError::InvariantViolation(format!(
                "landmark {} at {} is outside profile of length {}",
                landmark,
                index,
                sp.len()
            )));
        }
    }
    Ok(())
}

fn check_reference_boundary(sp: &SegmentedProfile) -> Result<()> {
    let Some(rp) = sp.reference_index() else {
        return Ok(());
    };
    // an unsegmented profile has no boundary to align with
    if sp.segments.len() == 1 && sp.segments[0].id.is_default() {
        return Ok(());
    }
    if sp.segment_starting_at(rp).is_none() {
        return Err(ProfileError::InvariantViolation(format!(
            "reference landmark at {} is not on a segment boundary",
            rp
        )));
    }
    Ok(())
}
