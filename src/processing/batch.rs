use log::warn;
use rayon::prelude::*;

use crate::io::NucleusRecord;

/// Runs `f` on every record in parallel. A failing record is logged and
/// yields `None`; the others are unaffected.
pub fn process_nuclei<R, F>(records: &[NucleusRecord], f: F) -> Vec<Option<R>>
where
    R: Send,
    F: Fn(&NucleusRecord) -> anyhow::Result<R> + Sync,
{
    records
        .par_iter()
        .map(|record| match f(record) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("Nucleus {}: {:#}", record.id, e);
                None
            }
        })
        .collect()
}

/// As [`process_nuclei`], with each task owning its record mutably.
pub fn process_nuclei_mut<R, F>(records: &mut [NucleusRecord], f: F) -> Vec<Option<R>>
where
    R: Send,
    F: Fn(&mut NucleusRecord) -> anyhow::Result<R> + Sync,
{
    records
        .par_iter_mut()
        .map(|record| match f(record) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("Nucleus {}: {:#}", record.id, e);
                None
            }
        })
        .collect()
}
