//! Fish entry data models.
//!
//! `MeasurementDraft` is what the measurement station submits; it only turns
//! into a `FishEntry` once the validator accepts it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Timestamps collected while a fish moves through the stations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTimes {
    pub capture_start: DateTime<Utc>,
    pub capture_end: DateTime<Utc>,
    pub sedation_end: DateTime<Utc>,
    pub measurement_end: DateTime<Utc>,
}

/// A completed, validated measurement record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FishEntry {
    pub fish_id: String,
    pub weight: f64,
    pub length: f64,
    pub width: Option<f64>,
    pub breadth: Option<f64>,
    #[serde(default)]
    pub circumference: Option<f64>,
    #[serde(flatten)]
    pub times: WorkflowTimes,
    pub notes: Option<String>,
}

/// One raw measurement field as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Measurement {
    /// Null or empty input.
    #[default]
    Absent,
    Value(f64),
    /// Text that does not read as a finite number.
    Invalid(String),
}

impl Measurement {
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Measurement::Absent;
        }
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Measurement::Value(value),
            _ => Measurement::Invalid(raw.to_string()),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Measurement::Value(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Measurement::Value(value)
        } else {
            Measurement::Invalid(value.to_string())
        }
    }
}

impl From<Option<f64>> for Measurement {
    fn from(value: Option<f64>) -> Self {
        value.map(Measurement::from).unwrap_or_default()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Measurement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<RawField>::deserialize(deserializer)? {
            None => Measurement::Absent,
            Some(RawField::Number(value)) => Measurement::from(value),
            Some(RawField::Text(text)) => Measurement::parse(&text),
        })
    }
}

impl Serialize for Measurement {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Measurement::Absent => serializer.serialize_none(),
            Measurement::Value(value) => serializer.serialize_f64(*value),
            Measurement::Invalid(text) => serializer.serialize_str(text),
        }
    }
}

/// Measurements as submitted by the measurement station, not yet validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementDraft {
    pub fish_id: String,
    #[serde(default)]
    pub weight: Measurement,
    #[serde(default)]
    pub length: Measurement,
    #[serde(default)]
    pub width: Measurement,
    #[serde(default)]
    pub breadth: Measurement,
    #[serde(default)]
    pub circumference: Measurement,
    #[serde(flatten)]
    pub times: WorkflowTimes,
    #[serde(default)]
    pub notes: Option<String>,
}
