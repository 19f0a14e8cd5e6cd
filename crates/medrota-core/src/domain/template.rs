//! The weekly calendar template: the repeating pattern of slots that is
//! projected onto concrete dates.

use serde::{Deserialize, Serialize};

use super::DayType;

/// A horizontal band of the template grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRowBand {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub order: u32,
}

/// A vertical band; its day type decides which dates a slot applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateColBand {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub order: u32,
    #[serde(rename = "dayType")]
    pub day_type: DayType,
}

/// Links a template block to the section it schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateBlock {
    pub id: String,
    #[serde(rename = "sectionId")]
    pub section_id: String,
    #[serde(rename = "requiredSlots", default)]
    pub required_slots: u32,
}

/// A slot of the weekly template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSlot {
    pub id: String,
    #[serde(rename = "locationId")]
    pub location_id: String,
    #[serde(rename = "rowBandId")]
    pub row_band_id: String,
    #[serde(rename = "colBandId")]
    pub col_band_id: String,
    #[serde(rename = "blockId")]
    pub block_id: String,
    /// Head-count needed on every date this slot applies to.
    #[serde(rename = "requiredSlots", default)]
    pub required_slots: u32,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    #[serde(rename = "endDayOffset", default)]
    pub end_day_offset: u32,
}

/// Per-location slice of the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyTemplateLocation {
    #[serde(rename = "locationId")]
    pub location_id: String,
    #[serde(rename = "rowBands", default)]
    pub row_bands: Vec<TemplateRowBand>,
    #[serde(rename = "colBands", default)]
    pub col_bands: Vec<TemplateColBand>,
    #[serde(default)]
    pub slots: Vec<TemplateSlot>,
}

/// The full weekly template, version 4 of the state schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WeeklyTemplate {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub blocks: Vec<TemplateBlock>,
    #[serde(default)]
    pub locations: Vec<WeeklyTemplateLocation>,
}

impl WeeklyTemplate {
    pub fn block(&self, block_id: &str) -> Option<&TemplateBlock> {
        self.blocks.iter().find(|b| b.id == block_id)
    }
}
