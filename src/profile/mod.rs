pub mod circular;
pub mod landmark;
#[allow(clippy::module_inception)]
pub mod profile;
pub mod segment;
pub mod segmented;

pub use circular::CircularIndex;
pub use landmark::Landmark;
pub use profile::Profile;
pub use segment::{Segment, SegmentId};
pub use segmented::SegmentedProfile;
