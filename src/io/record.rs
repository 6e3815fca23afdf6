use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::ProfileSection;
use crate::outline::profiler::create_profile;
use crate::outline::Outline;
use crate::profile::{Landmark, Segment, SegmentId, SegmentedProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub id: SegmentId,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkRecord {
    pub name: Landmark,
    pub index: usize,
}

/// Names the landmark that plays the reference role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientationRecord {
    pub reference: Landmark,
}

/// One nucleus as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NucleusRecord {
    pub id: String,
    /// Path of the source image
    pub image: String,
    #[serde(rename = "CoM")]
    pub com: (f64, f64),
    pub xpoints: String,
    pub ypoints: String,
    #[serde(rename = "Segment", default)]
    pub segments: Vec<SegmentRecord>,
    #[serde(rename = "Landmark", default)]
    pub landmarks: Vec<LandmarkRecord>,
    #[serde(rename = "Orientation", default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<OrientationRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub name: String,
    pub nuclei: Vec<NucleusRecord>,
}

/// A nucleus ready for analysis: outline, segmented profile and the name
/// the reference landmark is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct Nucleus {
    pub id: String,
    pub image: String,
    pub com: (f64, f64),
    pub outline: Outline,
    pub profile: SegmentedProfile,
    pub reference_name: Landmark,
    xpoints: String,
    ypoints: String,
}

impl NucleusRecord {
    /// Whether both records describe the same detected object: identical
    /// centre of mass and identical border text.
    pub fn same_object(&self, other: &NucleusRecord) -> bool {
        self.object_key() == other.object_key()
    }

    /// Text that is equal for two records exactly when they are the same
    /// object.
    pub fn object_key(&self) -> String {
        format!("{:?}\n{}\n{}", self.com, self.xpoints, self.ypoints)
    }

    pub fn outline(&self) -> Result<Outline> {
        let xs = parse_points(&self.xpoints).context("bad xpoints")?;
        let ys = parse_points(&self.ypoints).context("bad ypoints")?;
        Outline::from_xy(&xs, &ys).with_context(|| format!("nucleus {} has no valid outline", self.id))
    }

    fn reference_name(&self) -> Landmark {
        self.orientation
            .as_ref()
            .map(|o| o.reference.clone())
            .unwrap_or(Landmark::Reference)
    }

    /// Rebuilds the outline, recomputes its profile and attaches the
    /// stored segments and landmarks.
    pub fn to_nucleus(&self, settings: &ProfileSection) -> Result<Nucleus> {
        let outline = self.outline()?;
        let profile = create_profile(&outline, settings.kind, settings.window_for(outline.len()))?;
        let len = profile.len();

        let reference_name = self.reference_name();
        let mut landmarks: BTreeMap<Landmark, usize> = BTreeMap::new();
        for lm in &self.landmarks {
            let name = if lm.name == reference_name {
                Landmark::Reference
            } else {
                lm.name.clone()
            };
            if landmarks.insert(name.clone(), lm.index).is_some() {
                bail!(
                    "nucleus {} stores landmark {} twice (reference is {})",
                    self.id,
                    name,
                    reference_name
                );
            }
        }

        let sp = if self.segments.is_empty() {
            let mut sp = SegmentedProfile::unsegmented(profile)?;
            for (lm, index) in landmarks {
                sp.set_landmark(lm, index)?;
            }
            sp
        } else {
            let segments = self
                .segments
                .iter()
                .map(|s| Segment::new(s.id, s.start, s.end, len))
                .collect::<crate::error::Result<Vec<_>>>()?;
            SegmentedProfile::new(profile, segments, landmarks)?
        };

        Ok(Nucleus {
            id: self.id.clone(),
            image: self.image.clone(),
            com: self.com,
            outline,
            profile: sp,
            reference_name,
            xpoints: self.xpoints.clone(),
            ypoints: self.ypoints.clone(),
        })
    }
}

impl Nucleus {
    /// Writes the nucleus back in stored form. Border text and centre of
    /// mass are kept exactly as read so the record stays matchable.
    pub fn to_record(&self) -> NucleusRecord {
        let segments = if self.profile.segment_count() == 1 && self.profile.segments()[0].id.is_default() {
            Vec::new()
        } else {
            self.profile
                .segments()
                .iter()
                .map(|s| SegmentRecord {
                    id: s.id,
                    start: s.start(),
                    end: s.end(),
                })
                .collect()
        };
        let landmarks = self
            .profile
            .landmarks()
            .iter()
            .map(|(lm, index)| LandmarkRecord {
                name: if lm.is_reference() {
                    self.reference_name.clone()
                } else {
                    lm.clone()
                },
                index: *index,
            })
            .collect();
        let orientation = (!self.reference_name.is_reference()).then(|| OrientationRecord {
            reference: self.reference_name.clone(),
        });

        NucleusRecord {
            id: self.id.clone(),
            image: self.image.clone(),
            com: self.com,
            xpoints: self.xpoints.clone(),
            ypoints: self.ypoints.clone(),
            segments,
            landmarks,
            orientation,
        }
    }

    /// File name of the source image, without directories.
    pub fn image_name(&self) -> &str {
        image_file_name(&self.image)
    }
}

pub fn image_file_name(image: &str) -> &str {
    image.rsplit(['/', '\\']).next().unwrap_or(image)
}

/// Formats coordinates as `[x0, x1, ...]`.
pub fn format_points(values: &[f64]) -> String {
    let inner: Vec<String> = values.iter().map(|v| format!("{:?}", v)).collect();
    format!("[{}]", inner.join(", "))
}

pub fn parse_points(text: &str) -> Result<Vec<f64>> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| anyhow!("points text must be enclosed in brackets: {:?}", text))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<f64>()
                .with_context(|| format!("invalid coordinate {:?}", t))
        })
        .collect()
}

impl DatasetRecord {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .with_context(|| format!("failed to open dataset {:?}", path.as_ref()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse dataset {:?}", path.as_ref()))
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Could not create output directory: {:?}", parent))?;
        }
        let file = File::create(&path)
            .with_context(|| format!("failed to create dataset {:?}", path.as_ref()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .with_context(|| format!("failed to serialise dataset {:?}", path.as_ref()))?;
        writer
            .flush()
            .with_context(|| format!("failed to flush dataset {:?}", path.as_ref()))?;
        Ok(())
    }
}
