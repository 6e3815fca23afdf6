use anyhow::{Context, Result};
use csv::ReaderBuilder;
use log::{debug, info, warn};
use nalgebra::Point2;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::record::{image_file_name, Nucleus};
use crate::config::ImportSection;
use crate::outline::BoundingBox;
use crate::processing::snap::snap_landmark;
use crate::profile::Landmark;

/// Utility: detect whether the file uses comma or tab as delimiter.
pub(crate) fn detect_delimiter<P: AsRef<Path>>(path: P) -> Result<u8> {
    let file = File::open(&path).with_context(|| {
        format!(
            "failed to open file for delimiter sniffing: {:?}",
            path.as_ref()
        )
    })?;
    let mut reader = BufReader::new(file);
    let mut first_line = String::new();
    reader
        .read_line(&mut first_line)
        .with_context(|| "failed to read first line for delimiter detection")?;

    let tabs = first_line.matches('\t').count();
    let commas = first_line.matches(',').count();

    // tab separated unless commas clearly dominate
    if commas > tabs {
        Ok(b',')
    } else {
        Ok(b'\t')
    }
}

/// One curated landmark position in image coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LandmarkRow {
    pub image: String,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub landmark: String,
    pub x: f64,
    pub y: f64,
}

impl LandmarkRow {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            xmin: self.xmin,
            xmax: self.xmax,
            ymin: self.ymin,
            ymax: self.ymax,
        }
    }

    fn matches(&self, nucleus: &Nucleus) -> bool {
        image_file_name(&self.image) == nucleus.image_name()
            && self
                .bounding_box()
                .contains(Point2::new(nucleus.com.0, nucleus.com.1))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub applied: usize,
    /// Rows that resolved to no nucleus
    pub unmatched: usize,
    /// Rows that resolved but could not be applied
    pub failed: usize,
    /// Rows naming a landmark outside the known roles, when configured to skip them
    pub skipped: usize,
}

/// Reads a landmark table with a header row. Rows that do not parse are
/// logged and dropped.
pub fn read_landmark_rows<P: AsRef<Path>>(path: P) -> Result<Vec<LandmarkRow>> {
    let delim = detect_delimiter(&path)?;
    let file = File::open(&path)
        .with_context(|| format!("failed to open landmark file {:?}", path.as_ref()))?;
    let mut reader = ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for (line, result) in reader.deserialize::<LandmarkRow>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!("Skipping invalid landmark row {}: {}", line + 2, e),
        }
    }
    Ok(rows)
}

/// Snaps every row onto the border of the nucleus it belongs to.
pub fn apply_landmark_rows(
    nuclei: &mut [Nucleus],
    rows: &[LandmarkRow],
    settings: &ImportSection,
) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for row in rows {
        let landmark = match row.landmark.parse::<Landmark>() {
            Ok(lm) => lm,
            Err(e) => {
                warn!("Landmark row for {}: {}", row.image, e);
                summary.failed += 1;
                continue;
            }
        };

        let mut candidates = nuclei.iter_mut().filter(|n| row.matches(n));
        let Some(nucleus) = candidates.next() else {
            warn!(
                "No nucleus in {} with centre inside ({}-{}, {}-{})",
                row.image, row.xmin, row.xmax, row.ymin, row.ymax
            );
            summary.unmatched += 1;
            continue;
        };
        if candidates.next().is_some() {
            warn!(
                "Several nuclei in {} match the box for {}; using {}",
                row.image, landmark, nucleus.id
            );
        }

        // the landmark named by the orientation is held as the reference
        let landmark = if landmark == nucleus.reference_name {
            Landmark::Reference
        } else {
            landmark
        };
        if let Landmark::Custom(name) = &landmark {
            if settings.skip_unknown_landmarks {
                debug!("Skipping unknown landmark {:?}", name);
                summary.skipped += 1;
                continue;
            }
        }

        let is_reference = landmark.is_reference();
        match snap_landmark(
            &mut nucleus.profile,
            &nucleus.outline,
            landmark,
            Point2::new(row.x, row.y),
        ) {
            Ok(Some(_)) => {
                summary.applied += 1;
                if is_reference && !nucleus.profile.is_reference_aligned() {
                    warn!(
                        "Reference of nucleus {} moved off its segment boundary; segments need recalculating",
                        nucleus.id
                    );
                }
            }
            Ok(None) => {
                warn!("No border point found for nucleus {}", nucleus.id);
                summary.failed += 1;
            }
            Err(e) => {
                warn!("Could not place landmark on nucleus {}: {}", nucleus.id, e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Landmark import: {} applied, {} unmatched, {} failed, {} skipped",
        summary.applied, summary.unmatched, summary.failed, summary.skipped
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileSection;
    use crate::io::record::tests::ellipse_record;
    use crate::io::record::{LandmarkRecord, OrientationRecord};
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("nucleoprofile_input_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn nucleus() -> Nucleus {
        ellipse_record("n1", [5, 35])
            .to_nucleus(&ProfileSection::default())
            .unwrap()
    }

    fn row(landmark: &str, x: f64, y: f64) -> LandmarkRow {
        LandmarkRow {
            image: "slide_01.tif".to_string(),
            xmin: 70.0,
            xmax: 130.0,
            ymin: 50.0,
            ymax: 110.0,
            landmark: landmark.to_string(),
            x,
            y,
        }
    }

    #[test]
    fn test_detect_delimiter() {
        let tsv = write_temp("d.tsv", "image\txmin\txmax\n");
        let csv = write_temp("d.csv", "image,xmin,xmax\n");
        assert_eq!(detect_delimiter(&tsv).unwrap(), b'\t');
        assert_eq!(detect_delimiter(&csv).unwrap(), b',');
    }

    #[test]
    fn test_read_rows_skips_bad_lines() {
        let path = write_temp(
            "rows.tsv",
            "image\txmin\txmax\tymin\tymax\tlandmark\tx\ty\n\
             slide_01.tif\t70\t130\t50\t110\tTOP_VERTICAL\t100.0\t92.0\n\
             slide_01.tif\t70\tbad\t50\t110\tTOP_VERTICAL\t100.0\t92.0\n\
             slide_01.tif\t70\t130\t50\t110\ttail\t90.5\t80.0\n",
        );
        let rows = read_landmark_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].landmark, "TOP_VERTICAL");
        assert_eq!(rows[1].x, 90.5);
    }

    #[test]
    fn test_apply_snaps_to_matching_nucleus() {
        let mut nuclei = vec![nucleus()];
        let target = nuclei[0].outline.points()[20];
        let summary = apply_landmark_rows(
            &mut nuclei,
            &[row("top", target.x, target.y)],
            &ImportSection::default(),
        );
        assert_eq!(summary.applied, 1);
        assert_eq!(nuclei[0].profile.landmark(&Landmark::TopVertical), Some(20));
    }

    #[test]
    fn test_unmatched_rows_are_counted() {
        let mut nuclei = vec![nucleus()];
        let mut other_image = row("top", 100.0, 90.0);
        other_image.image = "slide_02.tif".to_string();
        let mut far_box = row("top", 100.0, 90.0);
        far_box.xmin = 500.0;
        far_box.xmax = 600.0;
        let summary = apply_landmark_rows(&mut nuclei, &[other_image, far_box], &ImportSection::default());
        assert_eq!(summary.unmatched, 2);
        assert_eq!(summary.applied, 0);
    }

    #[test]
    fn test_orientation_landmark_moves_the_reference() {
        let mut record = ellipse_record("n1", [5, 35]);
        record.landmarks = vec![LandmarkRecord {
            name: Landmark::TopVertical,
            index: 5,
        }];
        record.orientation = Some(OrientationRecord {
            reference: Landmark::TopVertical,
        });
        let mut nuclei = vec![record.to_nucleus(&ProfileSection::default()).unwrap()];
        let target = nuclei[0].outline.points()[35];
        let summary = apply_landmark_rows(
            &mut nuclei,
            &[row("TOP_VERTICAL", target.x, target.y)],
            &ImportSection::default(),
        );
        assert_eq!(summary.applied, 1);
        assert_eq!(nuclei[0].profile.reference_index(), Some(35));
        assert_eq!(nuclei[0].profile.landmark(&Landmark::TopVertical), None);

        let back = nuclei[0].to_record();
        assert_eq!(
            back.landmarks,
            vec![LandmarkRecord {
                name: Landmark::TopVertical,
                index: 35,
            }]
        );
        assert!(back.to_nucleus(&ProfileSection::default()).is_ok());
    }

    #[test]
    fn test_custom_orientation_landmark_is_not_skipped() {
        let tail = Landmark::Custom("tail".to_string());
        let mut record = ellipse_record("n1", [5, 35]);
        record.landmarks = vec![LandmarkRecord {
            name: tail.clone(),
            index: 5,
        }];
        record.orientation = Some(OrientationRecord { reference: tail });
        let mut nuclei = vec![record.to_nucleus(&ProfileSection::default()).unwrap()];
        let target = nuclei[0].outline.points()[35];
        let summary = apply_landmark_rows(
            &mut nuclei,
            &[row("tail", target.x, target.y)],
            &ImportSection {
                skip_unknown_landmarks: true,
            },
        );
        assert_eq!(summary.applied, 1);
        assert_eq!(nuclei[0].profile.reference_index(), Some(35));
    }

    #[test]
    fn test_unknown_landmarks() {
        let mut nuclei = vec![nucleus()];
        let rows = [row("tail", 100.0, 90.0), row("", 100.0, 90.0)];
        let summary = apply_landmark_rows(
            &mut nuclei,
            &rows,
            &ImportSection {
                skip_unknown_landmarks: true,
            },
        );
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);

        let summary = apply_landmark_rows(&mut nuclei, &rows[..1], &ImportSection::default());
        assert_eq!(summary.applied, 1);
        assert!(nuclei[0]
            .profile
            .landmark(&Landmark::Custom("tail".to_string()))
            .is_some());
    }
}
