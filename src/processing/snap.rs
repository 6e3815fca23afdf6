use log::debug;
use nalgebra::Point2;

use crate::error::{ProfileError, Result};
use crate::outline::Outline;
use crate::profile::{Landmark, SegmentedProfile};

/// Where a landmark ended up after snapping.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapOutcome {
    pub landmark: Landmark,
    pub previous: Option<usize>,
    pub index: usize,
    /// Distance from the requested point to the chosen border point.
    pub distance: f64,
}

/// Moves `landmark` to the outline point closest to `target`.
///
/// Ties are broken towards the lowest index. Returns `Ok(None)` and leaves
/// the profile untouched when no border point can be compared with
/// `target`. Segments are not moved; if the reference landmark was snapped
/// the caller is expected to realign segment boundaries.
pub fn snap_landmark(
    sp: &mut SegmentedProfile,
    outline: &Outline,
    landmark: Landmark,
    target: Point2<f64>,
) -> Result<Option<SnapOutcome>> {
    if outline.len() != sp.len() {
        return Err(ProfileError::ProfileLengthMismatch {
            expected: sp.len(),
            found: outline.len(),
        });
    }
    let Some((index, distance)) = outline.nearest_index(target) else {
        debug!("No border point near ({}, {}) for {}", target.x, target.y, landmark);
        return Ok(None);
    };

    let previous = sp.set_landmark(landmark.clone(), index)?;
    debug!(
        "Snapped {} from {:?} to {} (distance {:.3})",
        landmark, previous, index, distance
    );
    Ok(Some(SnapOutcome {
        landmark,
        previous,
        index,
        distance,
    }))
}
