//! Run configuration, loaded from a TOML file.
//!
//! Every field has a default so an empty file, or no file at all, is a
//! valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::outline::profiler::{window_size, ProfileType};

mod defaults {
    pub fn window_proportion() -> f64 {
        0.05
    }

    pub fn min_length() -> usize {
        1
    }

    pub fn profile_length() -> usize {
        1000
    }

    pub fn profile_samples() -> usize {
        100
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileSection,

    #[serde(default)]
    pub segments: SegmentSection,

    #[serde(default)]
    pub export: ExportSection,

    #[serde(default)]
    pub import: ImportSection,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {:?}", path.as_ref()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config file {:?}", path.as_ref()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if !(self.profile.window_proportion > 0.0 && self.profile.window_proportion < 0.5) {
            anyhow::bail!(
                "profile.window_proportion must be in (0, 0.5), got {}",
                self.profile.window_proportion
            );
        }
        if self.segments.min_length == 0 {
            anyhow::bail!("segments.min_length must be at least 1");
        }
        if self.export.profile_length == 0 {
            anyhow::bail!("export.profile_length must be at least 1");
        }
        if self.export.profile_samples == 0 {
            anyhow::bail!("export.profile_samples must be at least 1");
        }
        Ok(())
    }
}

/// How profiles are derived from outlines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileSection {
    /// Angle window as a fraction of the outline length
    #[serde(default = "defaults::window_proportion")]
    pub window_proportion: f64,

    #[serde(default)]
    pub kind: ProfileType,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            window_proportion: defaults::window_proportion(),
            kind: ProfileType::default(),
        }
    }
}

impl ProfileSection {
    pub fn window_for(&self, outline_len: usize) -> usize {
        window_size(outline_len, self.window_proportion)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentSection {
    /// Shortest segment accepted after a migration
    #[serde(default = "defaults::min_length")]
    pub min_length: usize,
}

impl Default for SegmentSection {
    fn default() -> Self {
        Self {
            min_length: defaults::min_length(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportSection {
    /// Base length profiles are normalised to
    #[serde(default = "defaults::profile_length")]
    pub profile_length: usize,

    /// Number of profile values written per nucleus
    #[serde(default = "defaults::profile_samples")]
    pub profile_samples: usize,

    #[serde(default)]
    pub include_profiles: bool,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            profile_length: defaults::profile_length(),
            profile_samples: defaults::profile_samples(),
            include_profiles: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSection {
    /// Skip rows naming a landmark that is not one of the known roles
    /// instead of importing it as a custom landmark
    #[serde(default)]
    pub skip_unknown_landmarks: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_relative_eq!(config.profile.window_proportion, 0.05);
        assert_eq!(config.export.profile_length, 1000);
        assert_eq!(config.export.profile_samples, 100);
        assert!(!config.export.include_profiles);
        assert_eq!(config.segments.min_length, 1);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [profile]
            kind = "radius"

            [export]
            include_profiles = true
            "#,
        )
        .unwrap();
        assert_eq!(config.profile.kind, ProfileType::Radius);
        assert_relative_eq!(config.profile.window_proportion, 0.05);
        assert!(config.export.include_profiles);
        assert_eq!(config.export.profile_length, 1000);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(Config::from_toml("[profile]\nwindow_proportion = 0.7").is_err());
        assert!(Config::from_toml("[segments]\nmin_length = 0").is_err());
        assert!(Config::from_toml("[profile]\nkind = \"width\"").is_err());
        assert!(Config::from_toml("[export]\nprofile_samples = 0").is_err());
        assert!(Config::from_toml("[export]\ninclude_profiles = false\nprofile_samples = 0").is_err());
    }

    #[test]
    fn test_window_for_outline() {
        let section = ProfileSection::default();
        assert_eq!(section.window_for(200), 10);
        assert_eq!(section.window_for(5), 1);
    }
}
