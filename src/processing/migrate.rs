use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::collections::HashMap;

use super::batch::process_nuclei_mut;
use super::remap::remap;
use crate::config::Config;
use crate::io::{DatasetRecord, NucleusRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub remapped: usize,
    pub unmatched: usize,
    pub failed: usize,
}

/// Copies segment and landmark positions from `source` onto every nucleus
/// of `target` that is the same detected object.
///
/// Nuclei without a counterpart in `source` are left as they are, as is
/// any nucleus whose remap fails.
pub fn migrate_dataset(source: &DatasetRecord, target: &mut DatasetRecord, config: &Config) -> MigrationSummary {
    let mut by_object: HashMap<String, &NucleusRecord> = HashMap::with_capacity(source.nuclei.len());
    for record in &source.nuclei {
        by_object.entry(record.object_key()).or_insert(record);
    }

    let results = process_nuclei_mut(&mut target.nuclei, |record| {
        let Some(source_record) = by_object.get(&record.object_key()) else {
            debug!("Nucleus {} has no counterpart in {}", record.id, source.name);
            return Ok(false);
        };
        *record = migrate_nucleus(source_record, record, config)?;
        Ok(true)
    });

    let mut summary = MigrationSummary::default();
    for result in results {
        match result {
            Some(true) => summary.remapped += 1,
            Some(false) => summary.unmatched += 1,
            None => summary.failed += 1,
        }
    }
    info!(
        "Migrated {} -> {}: {} remapped, {} unmatched, {} failed",
        source.name, target.name, summary.remapped, summary.unmatched, summary.failed
    );
    summary
}

/// Remaps one matched pair and returns the corrected target record.
pub fn migrate_nucleus(
    source: &NucleusRecord,
    target: &NucleusRecord,
    config: &Config,
) -> Result<NucleusRecord> {
    let source_nucleus = source
        .to_nucleus(&config.profile)
        .with_context(|| format!("failed to load source nucleus {}", source.id))?;
    let mut target_nucleus = target
        .to_nucleus(&config.profile)
        .with_context(|| format!("failed to load target nucleus {}", target.id))?;

    let report = remap(&source_nucleus.profile, &mut target_nucleus.profile)?;
    for (target_id, source_id) in &report.mapping {
        debug!("Segment {} <- {}", target_id, source_id);
    }

    let min_length = config.segments.min_length;
    if let Some(short) = target_nucleus
        .profile
        .segments()
        .iter()
        .find(|s| s.length() < min_length)
    {
        bail!("{} is shorter than the minimum of {}", short, min_length);
    }
    Ok(target_nucleus.to_record())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::record::tests::ellipse_record;
    use crate::io::record::LandmarkRecord;
    use crate::profile::Landmark;

    fn dataset(name: &str, nuclei: Vec<NucleusRecord>) -> DatasetRecord {
        DatasetRecord {
            name: name.to_string(),
            nuclei,
        }
    }

    #[test]
    fn test_matched_nucleus_takes_source_positions() {
        let mut source_record = ellipse_record("s1", [10, 40]);
        source_record.landmarks.push(LandmarkRecord {
            name: Landmark::TopVertical,
            index: 25,
        });
        let mut target_record = ellipse_record("t1", [12, 44]);
        target_record.landmarks.push(LandmarkRecord {
            name: Landmark::TopVertical,
            index: 20,
        });
        let target_ids: Vec<_> = target_record.segments.iter().map(|s| s.id).collect();

        let source = dataset("old", vec![source_record]);
        let mut target = dataset("new", vec![target_record]);
        let summary = migrate_dataset(&source, &mut target, &Config::default());
        assert_eq!(
            summary,
            MigrationSummary {
                remapped: 1,
                unmatched: 0,
                failed: 0
            }
        );

        let migrated = &target.nuclei[0];
        assert_eq!(migrated.id, "t1");
        let mut bounds: Vec<_> = migrated.segments.iter().map(|s| (s.id, s.start, s.end)).collect();
        bounds.sort_by_key(|b| b.1);
        assert_eq!(bounds, vec![(target_ids[0], 10, 40), (target_ids[1], 40, 10)]);
        let find = |lm: Landmark| migrated.landmarks.iter().find(|l| l.name == lm).map(|l| l.index);
        assert_eq!(find(Landmark::Reference), Some(10));
        assert_eq!(find(Landmark::TopVertical), Some(25));
    }

    #[test]
    fn test_unmatched_and_failed_nuclei_untouched() {
        let source = dataset("old", vec![ellipse_record("s1", [10, 40])]);

        let mut moved = ellipse_record("t1", [12, 44]);
        moved.com.0 += 0.5;
        let mut three_segments = ellipse_record("t2", [12, 44]);
        three_segments.segments = crate::utils::test_utils::segments_at(&[12, 30, 44], 60)
            .into_iter()
            .map(|s| crate::io::record::SegmentRecord {
                id: s.id,
                start: s.start(),
                end: s.end(),
            })
            .collect();
        let mut target = dataset("new", vec![moved.clone(), three_segments.clone()]);

        let summary = migrate_dataset(&source, &mut target, &Config::default());
        assert_eq!(summary.unmatched, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(target.nuclei, vec![moved, three_segments]);
    }

    #[test]
    fn test_short_segments_rejected() {
        let source = ellipse_record("s1", [10, 13]);
        let target = ellipse_record("t1", [12, 44]);
        let mut config = Config::default();
        config.segments.min_length = 5;
        assert!(migrate_nucleus(&source, &target, &config).is_err());
        config.segments.min_length = 3;
        assert!(migrate_nucleus(&source, &target, &config).is_ok());
    }
}
