use log::{debug, info};

use crate::error::{ProfileError, Result};
use crate::profile::{Landmark, Segment, SegmentId, SegmentedProfile};

/// What a remap did to the target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemapReport {
    /// `(target id, source id)` pairs in chain order from the reference.
    pub mapping: Vec<(SegmentId, SegmentId)>,
    /// Target landmarks whose index changed.
    pub moved_landmarks: Vec<Landmark>,
    /// Source landmarks the target does not have.
    pub skipped_landmarks: Vec<Landmark>,
}

/// Pairs each target segment with a source segment by walking both
/// adjacency chains forward from the segment starting at the reference
/// landmark. Neither profile is modified.
///
/// Profiles with a single segment are paired directly, wherever their
/// reference lies.
pub fn build_chain(
    source: &SegmentedProfile,
    target: &SegmentedProfile,
) -> Result<Vec<(SegmentId, SegmentId)>> {
    let source_rp = source
        .reference_index()
        .ok_or(ProfileError::MissingReferenceLandmark("source"))?;
    let target_rp = target
        .reference_index()
        .ok_or(ProfileError::MissingReferenceLandmark("target"))?;

    if source.len() != target.len() {
        return Err(ProfileError::ProfileLengthMismatch {
            expected: target.len(),
            found: source.len(),
        });
    }
    if source.segment_count() != target.segment_count() {
        return Err(ProfileError::SegmentCountMismatch {
            source_count: source.segment_count(),
            target_count: target.segment_count(),
        });
    }

    // a lone segment spans the whole profile, so there is no boundary to
    // anchor on and the two segments simply pair up
    if target.segment_count() == 1 {
        return Ok(vec![(target.segments()[0].id, source.segments()[0].id)]);
    }

    let mut source_seg = start_segment(source, source_rp, "source")?;
    let mut target_seg = start_segment(target, target_rp, "target")?;

    let k = target.segment_count();
    let mut mapping = Vec::with_capacity(k);
    mapping.push((target_seg.id, source_seg.id));
    while mapping.len() < k {
        source_seg = follow(source, source_seg, "source")?;
        target_seg = follow(target, target_seg, "target")?;
        mapping.push((target_seg.id, source_seg.id));
    }
    Ok(mapping)
}

fn start_segment<'a>(
    sp: &'a SegmentedProfile,
    rp: usize,
    role: &str,
) -> Result<&'a Segment> {
    sp.segment_starting_at(rp).ok_or_else(|| {
        ProfileError::InvariantViolation(format!(
            "{} reference landmark at {} is not on a segment boundary",
            role, rp
        ))
    })
}

fn follow<'a>(sp: &'a SegmentedProfile, seg: &Segment, role: &str) -> Result<&'a Segment> {
    sp.segment_starting_at(seg.end()).ok_or_else(|| {
        ProfileError::InvariantViolation(format!(
            "{} chain breaks after {}",
            role, seg
        ))
    })
}

/// Copies segment boundaries and landmark positions from `source` onto
/// `target`, which must describe the same object at the same length.
///
/// Target segments keep their ids and take the bounds of the source
/// segment they were chained to. Landmarks the target lacks are skipped.
/// On any error `target` is left exactly as it was.
pub fn remap(source: &SegmentedProfile, target: &mut SegmentedProfile) -> Result<RemapReport> {
    let mapping = build_chain(source, target)?;

    let mut work = target.clone();
    let mut segments = Vec::with_capacity(mapping.len());
    for (target_id, source_id) in &mapping {
        let from = source.segment(*source_id)?;
        let mut seg = target.segment(*target_id)?.clone();
        if (seg.start(), seg.end()) != (from.start(), from.end()) {
            debug!(
                "Segment {} [{}-{}) -> [{}-{}) from {}",
                seg.id,
                seg.start(),
                seg.end(),
                from.start(),
                from.end(),
                source_id
            );
            seg.set_bounds(from.start(), from.end());
            seg.clear_merge_sources();
        }
        segments.push(seg);
    }
    work.replace_segments(segments)?;

    let mut report = RemapReport {
        mapping,
        ..Default::default()
    };
    for (landmark, index) in source.landmarks() {
        match work.landmark(landmark) {
            None => {
                debug!("Landmark {} not present in target, skipping", landmark);
                report.skipped_landmarks.push(landmark.clone());
            }
            Some(current) if current != *index => {
                work.set_landmark(landmark.clone(), *index)?;
                report.moved_landmarks.push(landmark.clone());
            }
            Some(_) => {}
        }
    }

    work.validate()?;
    *target = work;
    info!(
        "Remapped {} segments, moved {} landmarks, skipped {}",
        report.mapping.len(),
        report.moved_landmarks.len(),
        report.skipped_landmarks.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{ramp_profile, segments_at};

    fn two_segment(starts: [usize; 2], rp: usize) -> (SegmentedProfile, SegmentId, SegmentId) {
        let segs = segments_at(&starts, 100);
        let (first, second) = (segs[0].id, segs[1].id);
        let sp = SegmentedProfile::new(ramp_profile(100), segs, [(Landmark::Reference, rp)]).unwrap();
        (sp, first, second)
    }

    #[test]
    fn test_remap_copies_source_boundaries() {
        let (source, a, b) = two_segment([10, 55], 10);
        let (mut target, x, y) = two_segment([12, 60], 12);

        let report = remap(&source, &mut target).unwrap();

        assert_eq!(report.mapping, vec![(x, a), (y, b)]);
        let seg_x = target.segment(x).unwrap();
        let seg_y = target.segment(y).unwrap();
        assert_eq!((seg_x.start(), seg_x.end()), (10, 55));
        assert_eq!((seg_y.start(), seg_y.end()), (55, 10));
        assert_eq!(target.reference_index(), Some(10));
        assert_eq!(report.moved_landmarks, vec![Landmark::Reference]);
        assert!(target.validate().is_ok());
    }

    #[test]
    fn test_remap_onto_copy_is_noop() {
        let segs = segments_at(&[5, 30, 61, 88], 100);
        let source =
            SegmentedProfile::new(ramp_profile(100), segs, [(Landmark::Reference, 30), (Landmark::Y, 47)])
                .unwrap();
        let mut target = source.clone();
        let report = remap(&source, &mut target).unwrap();
        assert_eq!(target, source);
        assert!(report.moved_landmarks.is_empty());
        assert!(report.mapping.iter().all(|(t, s)| t == s));
    }

    #[test]
    fn test_unsegmented_with_offset_reference_is_noop() {
        let mut source = SegmentedProfile::unsegmented(ramp_profile(100)).unwrap();
        source.set_landmark(Landmark::Reference, 10).unwrap();
        assert!(source.validate().is_ok());
        let mut target = source.clone();

        let report = remap(&source, &mut target).unwrap();
        assert_eq!(target, source);
        assert_eq!(
            report.mapping,
            vec![(SegmentId::default_segment(), SegmentId::default_segment())]
        );
    }

    #[test]
    fn test_unsegmented_landmarks_copied() {
        let mut source = SegmentedProfile::unsegmented(ramp_profile(100)).unwrap();
        source.set_landmark(Landmark::Reference, 10).unwrap();
        let mut target = SegmentedProfile::unsegmented(ramp_profile(100)).unwrap();
        target.set_landmark(Landmark::Reference, 37).unwrap();

        let report = remap(&source, &mut target).unwrap();
        assert_eq!(target.reference_index(), Some(10));
        assert_eq!(report.moved_landmarks, vec![Landmark::Reference]);
        assert!(target.validate().is_ok());
    }

    #[test]
    fn test_segment_count_mismatch_leaves_target() {
        let (source, _, _) = two_segment([10, 55], 10);
        let segs = segments_at(&[12, 40, 60], 100);
        let mut target =
            SegmentedProfile::new(ramp_profile(100), segs, [(Landmark::Reference, 12)]).unwrap();
        let before = target.clone();
        let err = remap(&source, &mut target).unwrap_err();
        assert_eq!(
            err,
            ProfileError::SegmentCountMismatch {
                source_count: 2,
                target_count: 3
            }
        );
        assert_eq!(target, before);
    }

    #[test]
    fn test_missing_reference_in_either() {
        let (source, _, _) = two_segment([10, 55], 10);
        let (mut target, _, _) = two_segment([12, 60], 12);
        target.remove_landmark(&Landmark::Reference);
        assert_eq!(
            remap(&source, &mut target).unwrap_err(),
            ProfileError::MissingReferenceLandmark("target")
        );

        let mut no_rp = source.clone();
        no_rp.remove_landmark(&Landmark::Reference);
        let (mut target, _, _) = two_segment([12, 60], 12);
        assert_eq!(
            remap(&no_rp, &mut target).unwrap_err(),
            ProfileError::MissingReferenceLandmark("source")
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let (source, _, _) = two_segment([10, 55], 10);
        let segs = segments_at(&[12, 60], 120);
        let mut target =
            SegmentedProfile::new(ramp_profile(120), segs, [(Landmark::Reference, 12)]).unwrap();
        assert!(matches!(
            remap(&source, &mut target),
            Err(ProfileError::ProfileLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_source_only_landmarks_are_skipped() {
        let (mut source, _, _) = two_segment([10, 55], 10);
        source.set_landmark(Landmark::TopVertical, 30).unwrap();
        source.set_landmark(Landmark::BottomVertical, 80).unwrap();
        let (mut target, _, _) = two_segment([12, 60], 12);
        target.set_landmark(Landmark::TopVertical, 33).unwrap();

        let report = remap(&source, &mut target).unwrap();
        assert_eq!(target.landmark(&Landmark::TopVertical), Some(30));
        assert_eq!(target.landmark(&Landmark::BottomVertical), None);
        assert_eq!(report.skipped_landmarks, vec![Landmark::BottomVertical]);
    }

    #[test]
    fn test_unaligned_reference_aborts() {
        let (source, _, _) = two_segment([10, 55], 10);
        let (mut target, _, _) = two_segment([12, 60], 12);
        target.set_landmark(Landmark::Reference, 20).unwrap();
        let before = target.clone();
        assert!(matches!(
            remap(&source, &mut target),
            Err(ProfileError::InvariantViolation(_))
        ));
        assert_eq!(target, before);
    }
}
