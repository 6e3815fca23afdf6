use log::trace;
use std::collections::BTreeMap;

use crate::error::{ProfileError, Result};
use crate::outline::Outline;
use crate::profile::circular::rescale;
use crate::profile::{Landmark, Profile, Segment, SegmentedProfile};
use nalgebra::Point2;

/// Resamples a segmented profile to `new_len` points.
///
/// Segment boundaries and landmarks are rescaled proportionally and
/// rounded. Rounding is then reconciled so every segment keeps at least
/// one index; the last segment absorbs whatever residual is left.
/// Landmarks that sat on a segment start stay on that start. The input is
/// not modified.
pub fn interpolate(sp: &SegmentedProfile, new_len: usize) -> Result<SegmentedProfile> {
    let k = sp.segment_count();
    if new_len < k || new_len == 0 {
        return Err(ProfileError::InvalidLength {
            requested: new_len,
            segments: k,
        });
    }

    let old_len = sp.len();
    let profile = sp.profile().interpolate(new_len)?;

    // Walk the segments from the one with the lowest start so the starts
    // increase monotonically.
    let first = sp
        .segments()
        .iter()
        .enumerate()
        .min_by_key(|(_, s)| s.start())
        .map(|(i, _)| i)
        .unwrap_or(0);
    let chain: Vec<&Segment> = (0..k).map(|i| &sp.segments()[(first + i) % k]).collect();
    let starts = reconcile_starts(
        &chain.iter().map(|s| s.start()).collect::<Vec<_>>(),
        old_len,
        new_len,
    );

    let mut segments = Vec::with_capacity(k);
    let mut moved_starts = BTreeMap::new();
    for (i, seg) in chain.iter().enumerate() {
        let start = starts[i] % new_len;
        let end = starts[(i + 1) % k] % new_len;
        trace!(
            "Rescaling segment {} [{}-{}) -> [{}-{})",
            seg.id,
            seg.start(),
            seg.end(),
            start,
            end
        );
        moved_starts.insert(seg.start(), start);
        segments.push(Segment::new(seg.id, start, end, new_len)?);
    }

    let landmarks: Vec<(Landmark, usize)> = sp
        .landmarks()
        .iter()
        .map(|(lm, index)| {
            let new_index = moved_starts
                .get(index)
                .copied()
                .unwrap_or_else(|| rescale(*index, old_len, new_len));
            (lm.clone(), new_index)
        })
        .collect();

    SegmentedProfile::new(profile, segments, landmarks)
}

/// Rescales increasing boundary positions and nudges them so consecutive
/// boundaries differ by at least one, including across the wrap. Returned
/// positions are unwrapped: they may run past `new_len`.
fn reconcile_starts(starts: &[usize], old_len: usize, new_len: usize) -> Vec<usize> {
    let k = starts.len();
    let mut t: Vec<usize> = starts
        .iter()
        .map(|s| (*s as f64 * new_len as f64 / old_len as f64).round() as usize)
        .collect();
    for i in 1..k {
        t[i] = t[i].max(t[i - 1] + 1);
    }
    // the last segment needs room to reach back round to t[0]
    let mut limit = t[0] + new_len;
    for i in (1..k).rev() {
        t[i] = t[i].min(limit - 1);
        limit = t[i];
    }
    t
}

/// Resamples an outline to `n` points by interpolating x and y as
/// separate profiles.
pub fn interpolate_outline(outline: &Outline, n: usize) -> Result<Outline> {
    let xs = Profile::new(outline.points().iter().map(|p| p.x).collect())?.interpolate(n)?;
    let ys = Profile::new(outline.points().iter().map(|p| p.y).collect())?.interpolate(n)?;
    Outline::new(
        xs.values()
            .iter()
            .zip(ys.values())
            .map(|(x, y)| Point2::new(*x, *y))
            .collect(),
    )
}
