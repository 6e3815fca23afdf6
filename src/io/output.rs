use anyhow::{Context, Result};
use csv::WriterBuilder;
use log::{info, warn};
use nalgebra::distance;
use rayon::prelude::*;
use std::path::Path;

use super::record::Nucleus;
use crate::config::ExportSection;
use crate::outline::Outline;
use crate::processing::interpolate::interpolate;
use crate::profile::Segment;

/// Smallest multiple of `base` that is at least `longest`.
pub fn choose_profile_length(longest: usize, base: usize) -> usize {
    let base = base.max(1);
    longest.div_ceil(base).max(1) * base
}

/// Border length covered by `segment`, in outline units.
pub fn segment_path_length(outline: &Outline, segment: &Segment) -> f64 {
    let start = segment.start() as isize;
    (0..segment.length() as isize)
        .map(|step| distance(&outline.point(start + step), &outline.point(start + step + 1)))
        .sum()
}

/// One exported table row, before formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub id: String,
    pub image: String,
    pub area: f64,
    pub perimeter: f64,
    /// `(path length, start, end)` per segment, from the reference
    pub segments: Vec<(f64, usize, usize)>,
    pub profile: Vec<f64>,
}

/// Builds the table row of one nucleus at the shared length `norm_len`.
pub fn export_row(nucleus: &Nucleus, norm_len: usize, settings: &ExportSection) -> Result<ExportRow> {
    let normalised = interpolate(&nucleus.profile, norm_len)
        .with_context(|| format!("failed to normalise nucleus {}", nucleus.id))?;
    let segments = normalised
        .segments_from_reference()
        .into_iter()
        .map(|seg| {
            // path length is measured on the original border
            let original = nucleus.profile.segment(seg.id)?;
            Ok((segment_path_length(&nucleus.outline, original), seg.start(), seg.end()))
        })
        .collect::<crate::error::Result<Vec<_>>>()?;

    let profile = if settings.include_profiles {
        let rp = nucleus.profile.reference_index().unwrap_or(0) as isize;
        nucleus
            .profile
            .profile()
            .start_from(rp)
            .interpolate(settings.profile_samples)
            .with_context(|| format!("failed to sample profile of nucleus {}", nucleus.id))?
            .values()
            .to_vec()
    } else {
        Vec::new()
    };

    Ok(ExportRow {
        id: nucleus.id.clone(),
        image: nucleus.image.clone(),
        area: nucleus.outline.area(),
        perimeter: nucleus.outline.perimeter(),
        segments,
        profile,
    })
}

/// Rows for every nucleus that can be exported. A nucleus that fails is
/// logged and left out.
pub fn build_export_rows(nuclei: &[Nucleus], settings: &ExportSection) -> Vec<ExportRow> {
    let longest = nuclei.iter().map(|n| n.profile.len()).max().unwrap_or(0);
    let norm_len = choose_profile_length(longest, settings.profile_length);

    let rows: Vec<ExportRow> = nuclei
        .par_iter()
        .filter_map(|nucleus| match export_row(nucleus, norm_len, settings) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!("Nucleus {} left out of export: {:#}", nucleus.id, e);
                None
            }
        })
        .collect();
    if rows.len() < nuclei.len() {
        warn!("{} of {} nuclei could not be exported", nuclei.len() - rows.len(), nuclei.len());
    }
    rows
}

/// Writes one tab separated row per nucleus.
pub fn write_export<P: AsRef<Path>>(path: P, rows: &[ExportRow], settings: &ExportSection) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)
            .context(format!("Could not create output directory: {:?}", parent))?;
    }
    let mut wtr = WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&path)
        .with_context(|| format!("failed to create export file {:?}", path.as_ref()))?;

    let segment_count = rows.first().map(|r| r.segments.len()).unwrap_or(0);
    let write_segments = rows.iter().all(|r| r.segments.len() == segment_count);
    if !write_segments {
        warn!("Nuclei have differing segment counts; segment columns omitted");
    }

    let mut header = vec![
        "id".to_string(),
        "image".to_string(),
        "area".to_string(),
        "perimeter".to_string(),
    ];
    if write_segments {
        for i in 0..segment_count {
            header.push(format!("Length_seg_{}_pixels", i));
            header.push(format!("Seg_{}_start", i));
            header.push(format!("Seg_{}_end", i));
        }
    }
    if settings.include_profiles {
        header.extend((0..settings.profile_samples).map(|i| format!("Profile_{}", i)));
    }
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.id.clone(),
            row.image.clone(),
            row.area.to_string(),
            row.perimeter.to_string(),
        ];
        if write_segments {
            for (length, start, end) in &row.segments {
                record.push(length.to_string());
                record.push(start.to_string());
                record.push(end.to_string());
            }
        }
        record.extend(row.profile.iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    info!("Exported {} nuclei to {:?}", rows.len(), path.as_ref());
    Ok(())
}
