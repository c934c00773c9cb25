//! Workflow stage slots.
//!
//! A fish moves camera -> sedation -> measurement. Each slot holds the
//! in-progress record for the fish currently at that station, or nothing.

use std::{fmt, str::FromStr};

use anyhow::{anyhow, Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Camera,
    Sedation,
    Measurement,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Camera, Stage::Sedation, Stage::Measurement];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Camera => "camera",
            Stage::Sedation => "sedation",
            Stage::Measurement => "measurement",
        }
    }

    /// The station a fish moves to after this one, if any.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Camera => Some(Stage::Sedation),
            Stage::Sedation => Some(Stage::Measurement),
            Stage::Measurement => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "camera" => Ok(Stage::Camera),
            "sedation" => Ok(Stage::Sedation),
            "measurement" => Ok(Stage::Measurement),
            other => Err(anyhow!("unknown stage '{other}'")),
        }
    }
}

/// In-progress record for one stage.
///
/// Only the icon index is interpreted here; everything else the capture
/// workflow stores rides along untouched in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    #[serde(default)]
    pub icon_idx: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StageRecord {
    pub fn with_icon(icon_idx: usize) -> Self {
        Self {
            icon_idx: Some(icon_idx),
            extra: Map::new(),
        }
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.extra.insert(key.to_string(), Value::String(value.into()));
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    pub fn stamp(&mut self, key: &str, at: DateTime<Utc>) {
        self.set_text(key, at.to_rfc3339());
    }

    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.text(key)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Stages {
    pub camera: Option<StageRecord>,
    pub sedation: Option<StageRecord>,
    pub measurement: Option<StageRecord>,
}

impl Stages {
    pub fn slot(&self, stage: Stage) -> Option<&StageRecord> {
        match stage {
            Stage::Camera => self.camera.as_ref(),
            Stage::Sedation => self.sedation.as_ref(),
            Stage::Measurement => self.measurement.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, stage: Stage) -> &mut Option<StageRecord> {
        match stage {
            Stage::Camera => &mut self.camera,
            Stage::Sedation => &mut self.sedation,
            Stage::Measurement => &mut self.measurement,
        }
    }

    pub fn is_active(&self, stage: Stage) -> bool {
        self.slot(stage).is_some()
    }

    pub fn icons_in_use(&self) -> Vec<usize> {
        Stage::ALL
            .iter()
            .filter_map(|stage| self.slot(*stage).and_then(|record| record.icon_idx))
            .collect()
    }
}
