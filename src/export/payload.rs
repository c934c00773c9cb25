//! Request bodies for the intake backend.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::models::{FishEntry, SamplingInfo};

fn iso(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Body of `POST /samples/{collectionId}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SamplePayload {
    pub fish_id: String,
    pub weight_g: f64,
    pub length_mm: f64,
    pub width_mm: Option<f64>,
    pub breadth_mm: Option<f64>,
    pub circumference_mm: Option<f64>,
    pub capture_start: String,
    pub capture_end: String,
    pub sedation_end: String,
    pub measurement_end: String,
    pub notes: Option<String>,
}

impl From<&FishEntry> for SamplePayload {
    fn from(entry: &FishEntry) -> Self {
        Self {
            fish_id: entry.fish_id.clone(),
            weight_g: entry.weight,
            length_mm: entry.length,
            width_mm: entry.width,
            breadth_mm: entry.breadth,
            circumference_mm: entry.circumference,
            capture_start: iso(&entry.times.capture_start),
            capture_end: iso(&entry.times.capture_end),
            sedation_end: iso(&entry.times.sedation_end),
            measurement_end: iso(&entry.times.measurement_end),
            notes: entry.notes.clone().filter(|notes| !notes.is_empty()),
        }
    }
}

/// One fish in a batch save, carrying the session's pen, location and species.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFish<'a> {
    #[serde(flatten)]
    pub entry: &'a FishEntry,
    pub pen_id: &'a str,
    pub location: Option<&'a str>,
    pub species: &'a str,
}

/// Body of `POST /save`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSaveRequest<'a> {
    pub collection_name: &'a str,
    pub fish: Vec<BatchFish<'a>>,
}

impl<'a> BatchSaveRequest<'a> {
    pub fn new(info: &'a SamplingInfo, entries: &'a [FishEntry]) -> Self {
        let fish = entries
            .iter()
            .map(|entry| BatchFish {
                entry,
                pen_id: &info.pen_id,
                location: info.location.as_deref(),
                species: &info.species,
            })
            .collect();
        Self {
            collection_name: &info.name,
            fish,
        }
    }
}

/// Body of `POST /collections`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollectionRequest<'a> {
    pub name: &'a str,
    pub pen_id: &'a str,
    pub species: &'a str,
    pub location: Option<&'a str>,
    pub notes: Option<&'a str>,
}

impl<'a> From<&'a SamplingInfo> for NewCollectionRequest<'a> {
    fn from(info: &'a SamplingInfo) -> Self {
        Self {
            name: info.name.trim(),
            pen_id: &info.pen_id,
            species: &info.species,
            location: info.location.as_deref(),
            notes: info.notes.as_deref().filter(|notes| !notes.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::WorkflowTimes;

    fn entry() -> FishEntry {
        let at = DateTime::parse_from_rfc3339("2025-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        FishEntry {
            fish_id: "F-9".into(),
            weight: 1250.0,
            length: 455.0,
            width: None,
            breadth: Some(48.0),
            circumference: None,
            times: WorkflowTimes {
                capture_start: at,
                capture_end: at,
                sedation_end: at,
                measurement_end: at,
            },
            notes: Some(String::new()),
        }
    }

    #[test]
    fn sample_payload_uses_backend_names_and_nulls() {
        let value = serde_json::to_value(SamplePayload::from(&entry())).unwrap();
        assert_eq!(
            value,
            json!({
                "fishId": "F-9",
                "weightG": 1250.0,
                "lengthMm": 455.0,
                "widthMm": null,
                "breadthMm": 48.0,
                "circumferenceMm": null,
                "captureStart": "2025-03-01T09:00:00.000Z",
                "captureEnd": "2025-03-01T09:00:00.000Z",
                "sedationEnd": "2025-03-01T09:00:00.000Z",
                "measurementEnd": "2025-03-01T09:00:00.000Z",
                "notes": null
            })
        );
    }

    #[test]
    fn batch_request_enriches_every_fish() {
        let info = SamplingInfo {
            name: "Spring run".into(),
            ..SamplingInfo::default()
        };
        let entries = [entry(), entry()];
        let value = serde_json::to_value(BatchSaveRequest::new(&info, &entries)).unwrap();

        assert_eq!(value["collectionName"], "Spring run");
        let fish = value["fish"].as_array().unwrap();
        assert_eq!(fish.len(), 2);
        assert_eq!(fish[0]["fishId"], "F-9");
        assert_eq!(fish[0]["weight"], 1250.0);
        assert_eq!(fish[0]["penId"], "880");
        assert_eq!(fish[0]["location"], "bergen_workshop");
        assert_eq!(fish[0]["species"], "atlantic_salmon");
    }

    #[test]
    fn new_collection_request_carries_session_metadata() {
        let info = SamplingInfo {
            name: " Autumn grading ".into(),
            pen_id: "412".into(),
            notes: Some(String::new()),
            ..SamplingInfo::default()
        };
        let value = serde_json::to_value(NewCollectionRequest::from(&info)).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Autumn grading",
                "penId": "412",
                "species": "atlantic_salmon",
                "location": "bergen_workshop",
                "notes": null
            })
        );
    }
}
