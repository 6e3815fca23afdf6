use anyhow::{anyhow, Context, Result};
use crossbeam::thread;
use std::path::Path;

use crate::config::Config;
use crate::io::input::{apply_landmark_rows, read_landmark_rows, ImportSummary};
use crate::io::output::{build_export_rows, write_export};
use crate::io::DatasetRecord;
use crate::processing::batch::process_nuclei;
use crate::processing::migrate::{migrate_dataset, MigrationSummary};

/// Snaps curated landmark coordinates onto the nuclei of a dataset and
/// writes the updated dataset to `output_path`.
pub fn run_landmark_import<P: AsRef<Path>>(
    dataset_path: P,
    landmark_path: P,
    output_path: P,
    config: &Config,
) -> Result<ImportSummary> {
    let mut dataset = DatasetRecord::read(&dataset_path)?;
    let rows = read_landmark_rows(&landmark_path)?;

    let loaded = process_nuclei(&dataset.nuclei, |record| record.to_nucleus(&config.profile));
    let (mut nuclei, mut positions) = (Vec::new(), Vec::new());
    for (i, nucleus) in loaded.into_iter().enumerate() {
        if let Some(n) = nucleus {
            nuclei.push(n);
            positions.push(i);
        }
    }

    let summary = apply_landmark_rows(&mut nuclei, &rows, &config.import);
    for (nucleus, i) in nuclei.iter().zip(positions) {
        dataset.nuclei[i] = nucleus.to_record();
    }
    dataset
        .write(&output_path)
        .with_context(|| format!("failed to write dataset {:?}", output_path.as_ref()))?;
    Ok(summary)
}

/// Transplants segments and landmarks from the source dataset onto the
/// matching nuclei of the target dataset.
pub fn run_migration<P: AsRef<Path> + Sync>(
    source_path: P,
    target_path: P,
    output_path: P,
    config: &Config,
) -> Result<MigrationSummary> {
    let (source, mut target) = thread::scope(|s| -> Result<_> {
        let source_handle = s.spawn(|_| {
            DatasetRecord::read(&source_path).context("failed to load source dataset")
        });
        let target_handle = s.spawn(|_| {
            DatasetRecord::read(&target_path).context("failed to load target dataset")
        });

        let source = source_handle
            .join()
            .map_err(|_| anyhow!("source loader panicked"))??;
        let target = target_handle
            .join()
            .map_err(|_| anyhow!("target loader panicked"))??;
        Ok((source, target))
    })
    .map_err(|_| anyhow!("dataset loading panicked"))??;

    let summary = migrate_dataset(&source, &mut target, config);
    target
        .write(&output_path)
        .with_context(|| format!("failed to write dataset {:?}", output_path.as_ref()))?;
    Ok(summary)
}

/// Writes the normalised measurement table for a dataset. Returns the
/// number of nuclei exported.
pub fn run_export<P: AsRef<Path>>(dataset_path: P, output_path: P, config: &Config) -> Result<usize> {
    let dataset = DatasetRecord::read(&dataset_path)?;
    let nuclei: Vec<_> = process_nuclei(&dataset.nuclei, |record| record.to_nucleus(&config.profile))
        .into_iter()
        .flatten()
        .collect();

    let rows = build_export_rows(&nuclei, &config.export);
    write_export(&output_path, &rows, &config.export)?;
    Ok(rows.len())
}
