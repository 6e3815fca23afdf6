use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ProfileError;

/// Named border positions used for orientation and alignment.
///
/// Known roles are closed variants; anything else a dataset defines is kept
/// as `Custom` so it survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Landmark {
    /// Canonical rotational and segmentation anchor.
    Reference,
    OrientationPoint,
    TopVertical,
    BottomVertical,
    Y,
    X,
    Custom(String),
}

impl Landmark {
    pub fn as_str(&self) -> &str {
        match self {
            Landmark::Reference => "REFERENCE",
            Landmark::OrientationPoint => "ORIENTATION_POINT",
            Landmark::TopVertical => "TOP_VERTICAL",
            Landmark::BottomVertical => "BOTTOM_VERTICAL",
            Landmark::Y => "Y",
            Landmark::X => "X",
            Landmark::Custom(name) => name,
        }
    }

    /// A dataset-defined landmark. Names that would parse back as one of
    /// the known roles are refused so the name survives a round trip.
    pub fn custom(name: &str) -> Result<Self, ProfileError> {
        let trimmed = name.trim();
        if trimmed.is_empty() || Landmark::known(trimmed).is_some() {
            return Err(ProfileError::InvalidLandmark(name.to_string()));
        }
        Ok(Landmark::Custom(trimmed.to_string()))
    }

    /// Case-insensitive; older datasets spell the roles differently.
    fn known(name: &str) -> Option<Landmark> {
        let key = name.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        let landmark = match key.as_str() {
            "REFERENCE" | "REFERENCE_POINT" | "RP" => Landmark::Reference,
            "ORIENTATION_POINT" | "ORIENTATION" | "OP" => Landmark::OrientationPoint,
            "TOP_VERTICAL" | "TOP" | "TV" => Landmark::TopVertical,
            "BOTTOM_VERTICAL" | "BOTTOM" | "BV" => Landmark::BottomVertical,
            "Y" => Landmark::Y,
            "X" => Landmark::X,
            _ => return None,
        };
        Some(landmark)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Landmark::Reference)
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Landmark {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Landmark::known(s) {
            Some(landmark) => Ok(landmark),
            None => Landmark::custom(s),
        }
    }
}

impl Serialize for Landmark {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Landmark {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_legacy_names() {
        assert_eq!("REFERENCE".parse::<Landmark>().unwrap(), Landmark::Reference);
        assert_eq!(
            "reference_point".parse::<Landmark>().unwrap(),
            Landmark::Reference
        );
        assert_eq!("Top".parse::<Landmark>().unwrap(), Landmark::TopVertical);
        assert_eq!(
            "orientation point".parse::<Landmark>().unwrap(),
            Landmark::OrientationPoint
        );
        assert_eq!("y".parse::<Landmark>().unwrap(), Landmark::Y);
    }

    #[test]
    fn test_parse_custom_and_empty() {
        assert_eq!(
            "tail tip".parse::<Landmark>().unwrap(),
            Landmark::Custom("tail tip".to_string())
        );
        assert!("   ".parse::<Landmark>().is_err());
    }

    #[test]
    fn test_custom_names_cannot_shadow_known_roles() {
        assert!(Landmark::custom("tv").is_err());
        assert!(Landmark::custom(" Top ").is_err());
        assert!(Landmark::custom("reference-point").is_err());

        let tail = Landmark::custom("tail tip").unwrap();
        assert_eq!(tail.to_string().parse::<Landmark>().unwrap(), tail);
        let json = serde_json::to_string(&tail).unwrap();
        assert_eq!(serde_json::from_str::<Landmark>(&json).unwrap(), tail);
    }

    #[test]
    fn test_display_round_trip() {
        for lm in [
            Landmark::Reference,
            Landmark::OrientationPoint,
            Landmark::TopVertical,
            Landmark::BottomVertical,
            Landmark::Y,
            Landmark::X,
        ] {
            assert_eq!(lm.to_string().parse::<Landmark>().unwrap(), lm);
        }
    }

    #[test]
    fn test_serde_as_plain_string() {
        let json = serde_json::to_string(&Landmark::TopVertical).unwrap();
        assert_eq!(json, "\"TOP_VERTICAL\"");
        let back: Landmark = serde_json::from_str("\"REFERENCE_POINT\"").unwrap();
        assert_eq!(back, Landmark::Reference);
    }
}
