use serde::{Deserialize, Serialize};

/// Preservation flags for a single generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(rename = "strictPose", default)]
    pub preserve_pose: bool,
    #[serde(rename = "keepFace", default)]
    pub preserve_face: bool,
    #[serde(rename = "lockLocation", default)]
    pub preserve_location: bool,
    #[serde(rename = "lockProduct", default)]
    pub preserve_product_label: bool,
    #[serde(rename = "blackAndWhite", default)]
    pub monochrome: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreservationFlag {
    Pose,
    Face,
    Location,
    ProductLabel,
    Monochrome,
}

impl PreservationFlag {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "pose" | "strict_pose" | "strictpose" => Some(PreservationFlag::Pose),
            "face" | "keep_face" | "keepface" | "identity" => Some(PreservationFlag::Face),
            "location" | "background" | "lock_location" | "locklocation" => {
                Some(PreservationFlag::Location)
            }
            "product" | "label" | "product_label" | "lock_product" | "lockproduct" => {
                Some(PreservationFlag::ProductLabel)
            }
            "monochrome" | "black_and_white" | "blackandwhite" => {
                Some(PreservationFlag::Monochrome)
            }
            _ => None,
        }
    }
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(mut self, flag: PreservationFlag, value: bool) -> Self {
        self.set(flag, value);
        self
    }

    pub fn set(&mut self, flag: PreservationFlag, value: bool) {
        match flag {
            PreservationFlag::Pose => self.preserve_pose = value,
            PreservationFlag::Face => self.preserve_face = value,
            PreservationFlag::Location => self.preserve_location = value,
            PreservationFlag::ProductLabel => self.preserve_product_label = value,
            PreservationFlag::Monochrome => self.monochrome = value,
        }
    }

    pub fn get(&self, flag: PreservationFlag) -> bool {
        match flag {
            PreservationFlag::Pose => self.preserve_pose,
            PreservationFlag::Face => self.preserve_face,
            PreservationFlag::Location => self.preserve_location,
            PreservationFlag::ProductLabel => self.preserve_product_label,
            PreservationFlag::Monochrome => self.monochrome,
        }
    }
}
