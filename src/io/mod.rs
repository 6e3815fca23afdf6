pub mod input;
pub mod output;
pub mod record;

pub use record::{DatasetRecord, Nucleus, NucleusRecord};
