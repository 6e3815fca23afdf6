use thiserror::Error;

use crate::profile::landmark::Landmark;
use crate::profile::segment::SegmentId;

/// Errors raised by the profile, segment and landmark model.
///
/// Every variant aborts only the single nucleus being processed; batch
/// callers log it and carry on with the next record.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("cannot interpolate to length {requested}: profile has {segments} segments")]
    InvalidLength { requested: usize, segments: usize },

    #[error("reference landmark missing from {0} profile")]
    MissingReferenceLandmark(&'static str),

    #[error("segment count mismatch: source has {source_count}, target has {target_count}")]
    SegmentCountMismatch {
        source_count: usize,
        target_count: usize,
    },

    #[error("profile length mismatch: expected {expected}, found {found}")]
    ProfileLengthMismatch { expected: usize, found: usize },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("outline needs at least 3 points, found {0}")]
    TooFewPoints(usize),

    #[error("index {index} is outside profile of length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("segment {0} not found")]
    MissingSegment(SegmentId),

    #[error("landmark {0} not found")]
    MissingLandmark(Landmark),

    #[error("invalid landmark name: {0:?}")]
    InvalidLandmark(String),

    #[error("segment update rejected: {0}")]
    SegmentUpdate(String),
}

pub type Result<T> = std::result::Result<T, ProfileError>;
