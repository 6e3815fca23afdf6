pub mod batch;
pub mod interpolate;
pub mod migrate;
pub mod remap;
pub mod snap;

pub use interpolate::{interpolate, interpolate_outline};
pub use remap::{remap, RemapReport};
pub use snap::{snap_landmark, SnapOutcome};
