//! Closed-contour profiles of nuclei: outline measurement, segmentation
//! and landmarks, with length normalisation, landmark snapping and
//! cross-dataset segment remapping.

pub mod config;
pub mod entry;
pub mod error;
pub mod io;
pub mod outline;
pub mod processing;
pub mod profile;
mod utils;

#[cfg(feature = "python")]
mod python_bind;

pub use config::Config;
pub use error::{ProfileError, Result};
pub use outline::profiler::ProfileType;
pub use outline::Outline;
pub use processing::{interpolate, interpolate_outline, remap, snap_landmark, RemapReport, SnapOutcome};
pub use profile::{CircularIndex, Landmark, Profile, Segment, SegmentId, SegmentedProfile};
