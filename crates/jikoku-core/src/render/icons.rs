//! Train-type icon map

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::DesignConfig;
use crate::timetable::TrainType;
use crate::Result;

const BUNDLED_ICONS: &str = include_str!("../../assets/icons.json");

/// 列車種別ごとのアイコン URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconMap {
    pub local: String,
    pub rapid: String,
    pub regional_rapid: String,
}

impl IconMap {
    pub fn bundled() -> Result<Self> {
        Ok(serde_json::from_str(BUNDLED_ICONS)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load(config: &DesignConfig) -> Result<Self> {
        match &config.icons_path {
            Some(path) => Self::from_file(path),
            None => Self::bundled(),
        }
    }

    /// Unknown types fall back to the regional rapid icon.
    pub fn icon_for(&self, train_type: &TrainType) -> &str {
        match train_type {
            TrainType::Local => self.local.as_str(),
            TrainType::Rapid => self.rapid.as_str(),
            TrainType::RegionalRapid | TrainType::Other(_) => self.regional_rapid.as_str(),
        }
    }
}
