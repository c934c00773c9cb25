//! Operator-facing actions over the application state.
//!
//! Each handler returns the message to show the operator, or the error text
//! to show instead. Nothing here is fatal; every failure can be fixed by the
//! operator and the action retried.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    export::write_csv_file,
    models::{
        CollectionSummary, Measurement, MeasurementDraft, SamplingInfo, SamplingPatch, Stage,
        StageRecord, WorkflowTimes,
    },
    AppState,
};

const FISH_ID: &str = "fishId";
const CAPTURE_START: &str = "captureStart";
const CAPTURE_END: &str = "captureEnd";
const SEDATION_END: &str = "sedationEnd";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOverview {
    pub camera_active: bool,
    pub sedation_active: bool,
    pub measurement_active: bool,
    pub entry_count: usize,
    pub sampling_info: SamplingInfo,
}

/// Raw measurement fields as typed at the measurement station.
#[derive(Debug, Clone, Default)]
pub struct MeasurementInput {
    pub weight: String,
    pub length: String,
    pub width: String,
    pub breadth: String,
    pub circumference: String,
    pub notes: Option<String>,
}

pub fn get_overview(state: &AppState) -> SessionOverview {
    let store = &state.store;
    SessionOverview {
        camera_active: store.camera_stage_active(),
        sedation_active: store.sedation_stage_active(),
        measurement_active: store.measurement_stage_active(),
        entry_count: store.entries().len(),
        sampling_info: store.sampling_info().clone(),
    }
}

/// Put a new fish in front of the camera.
pub fn begin_intake(state: &mut AppState, fish_id: Option<String>) -> Result<String, String> {
    let fish_id = fish_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut record = StageRecord::with_icon(state.store.unused_icon_index());
    record.set_text(FISH_ID, fish_id.clone());
    record.stamp(CAPTURE_START, Utc::now());

    state
        .store
        .begin_stage(Stage::Camera, record)
        .map_err(|e| e.to_string())?;
    Ok(format!("Fish {fish_id} entered the camera stage"))
}

/// Close the stage `from` and hand its fish to the next station.
pub fn advance_stage(state: &mut AppState, from: Stage) -> Result<String, String> {
    let end_key = match from {
        Stage::Camera => CAPTURE_END,
        Stage::Sedation => SEDATION_END,
        Stage::Measurement => return Err("measurement is the last stage; record the fish".into()),
    };
    if let Some(next) = from.next() {
        if state.store.is_stage_active(next) {
            return Err(format!("{next} stage is already active"));
        }
    }

    let now = Utc::now();
    state
        .store
        .update_stage(from, |record| record.stamp(end_key, now))
        .map_err(|e| e.to_string())?;
    let to = state.store.advance_stage(from).map_err(|e| e.to_string())?;
    Ok(format!("Moved fish from {from} to {to}"))
}

/// Abandon whatever fish is in `stage`.
pub fn clear_stage(state: &mut AppState, stage: Stage) -> Result<String, String> {
    match state.store.complete_stage(stage) {
        Some(_) => Ok(format!("Cleared {stage} stage")),
        None => Err(format!("{stage} stage is not active")),
    }
}

fn required_time(record: &StageRecord, key: &str) -> Result<DateTime<Utc>, String> {
    record
        .timestamp(key)
        .ok_or_else(|| format!("measurement record is missing {key}"))
}

fn build_draft(
    record: &StageRecord,
    input: MeasurementInput,
    measured_at: DateTime<Utc>,
) -> Result<MeasurementDraft, String> {
    let fish_id = record
        .text(FISH_ID)
        .ok_or_else(|| format!("measurement record is missing {FISH_ID}"))?;

    Ok(MeasurementDraft {
        fish_id: fish_id.to_string(),
        weight: Measurement::parse(&input.weight),
        length: Measurement::parse(&input.length),
        width: Measurement::parse(&input.width),
        breadth: Measurement::parse(&input.breadth),
        circumference: Measurement::parse(&input.circumference),
        times: WorkflowTimes {
            capture_start: required_time(record, CAPTURE_START)?,
            capture_end: required_time(record, CAPTURE_END)?,
            sedation_end: required_time(record, SEDATION_END)?,
            measurement_end: measured_at,
        },
        notes: input.notes,
    })
}

/// Validate the measurement of the fish at the measurement station and
/// append it to the session. On rejection the fish stays at the station so
/// the values can be re-entered.
pub fn record_measurement(
    state: &mut AppState,
    input: MeasurementInput,
) -> Result<usize, String> {
    let record = state
        .store
        .stage_record(Stage::Measurement)
        .ok_or_else(|| "measurement stage is not active".to_string())?;
    let draft = build_draft(record, input, Utc::now())?;

    let count = state
        .store
        .record_entry(draft)
        .map_err(|rejection| format!("Invalid measurement: {rejection}"))?;
    state.store.complete_stage(Stage::Measurement);
    Ok(count)
}

/// Send the most recent entry to the active collection.
pub async fn submit_latest(state: &AppState) -> Result<String, String> {
    let entry = state
        .store
        .entries()
        .last()
        .ok_or_else(|| "No data to save".to_string())?;
    state
        .remote
        .submit_entry(state.store.sampling_info(), entry)
        .await
        .map_err(|e| format!("Failed to save fish: {e}"))?;
    Ok(format!("Saved fish {} to the collection", entry.fish_id))
}

pub async fn save_entries(state: &AppState, quiet: bool) -> Result<String, String> {
    let saved = state
        .remote
        .submit_batch(state.store.sampling_info(), state.store.entries())
        .await
        .map_err(|e| format!("Failed to save to backend: {e}"))?;
    if quiet {
        Ok(String::new())
    } else {
        Ok(format!("Successfully saved {saved} fish to backend"))
    }
}

pub fn export_entries(state: &AppState, dir: &Path) -> Result<String, String> {
    let written = write_csv_file(
        dir,
        state.store.entries(),
        state.store.sampling_info(),
        Utc::now(),
    )
    .map_err(|e| format!("{e:#}"))?;
    match written {
        Some(path) => Ok(format!("Exported to {}", path.display())),
        None => Err("No data to export".into()),
    }
}

pub async fn list_collections(state: &AppState) -> Result<Vec<CollectionSummary>, String> {
    state
        .remote
        .list_collections()
        .await
        .map_err(|e| format!("Failed to load collections: {e}"))
}

pub async fn select_collection(state: &mut AppState, collection_id: i64) -> Result<String, String> {
    let collections = list_collections(state).await?;
    let collection = collections
        .iter()
        .find(|collection| collection.id == collection_id)
        .ok_or_else(|| format!("Collection {collection_id} not found"))?;
    state.store.select_collection(collection);
    Ok(format!("Selected collection {} ({})", collection.name, collection.id))
}

/// Create a backend collection from the session metadata and make it the
/// active one. `name` overrides the session name when given.
pub async fn start_collection(
    state: &mut AppState,
    name: Option<String>,
) -> Result<String, String> {
    let mut info = state.store.sampling_info().clone();
    if let Some(name) = name {
        info.name = name;
    }
    let name = info.name.trim().to_string();

    let collection_id = state
        .remote
        .create_collection(&info)
        .await
        .map_err(|e| format!("Failed to start collection: {e}"))?;
    state.store.set_active_collection(collection_id, &name);
    Ok(format!("Started collection {name} ({collection_id})"))
}

pub fn update_sampling_info(state: &mut AppState, patch: SamplingPatch) -> SamplingInfo {
    state.store.update_sampling_info(patch);
    state.store.sampling_info().clone()
}

pub fn reset_session(state: &mut AppState) -> String {
    state.store.reset_session();
    "Session cleared".into()
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::{config::Config, remote::RemoteClient, session::SessionStore};

    fn state() -> AppState {
        let config = Config::default();
        AppState {
            store: SessionStore::detached(),
            remote: RemoteClient::with_base("http://127.0.0.1:9", None).unwrap(),
            config,
        }
    }

    fn walk_to_measurement(state: &mut AppState, fish_id: &str) {
        begin_intake(state, Some(fish_id.into())).unwrap();
        advance_stage(state, Stage::Camera).unwrap();
        advance_stage(state, Stage::Sedation).unwrap();
    }

    fn input(weight: &str, length: &str) -> MeasurementInput {
        MeasurementInput {
            weight: weight.into(),
            length: length.into(),
            ..MeasurementInput::default()
        }
    }

    #[test]
    fn full_workflow_records_an_entry_with_stage_times() {
        let mut state = state();
        walk_to_measurement(&mut state, "F-1");
        assert!(get_overview(&state).measurement_active);

        let count = record_measurement(&mut state, input("500", "300")).unwrap();
        assert_eq!(count, 1);

        let entry = &state.store.entries()[0];
        assert_eq!(entry.fish_id, "F-1");
        assert!(entry.times.capture_start <= entry.times.capture_end);
        assert!(entry.times.sedation_end <= entry.times.measurement_end);

        let overview = get_overview(&state);
        assert!(!overview.measurement_active);
        assert_eq!(overview.entry_count, 1);
    }

    #[test]
    fn rejected_measurement_keeps_the_fish_at_the_station() {
        let mut state = state();
        walk_to_measurement(&mut state, "F-1");

        let err = record_measurement(&mut state, input("5", "300")).unwrap_err();
        assert!(err.contains("weight"), "{err}");
        assert!(state.store.measurement_stage_active());
        assert!(state.store.entries().is_empty());

        assert_eq!(record_measurement(&mut state, input("500", "300")), Ok(1));
    }

    #[test]
    fn measuring_requires_an_active_station() {
        let mut state = state();
        assert!(record_measurement(&mut state, input("500", "300")).is_err());
    }

    #[test]
    fn advancing_into_a_busy_station_leaves_the_record_unstamped() {
        let mut state = state();
        begin_intake(&mut state, Some("F-1".into())).unwrap();
        advance_stage(&mut state, Stage::Camera).unwrap();
        begin_intake(&mut state, Some("F-2".into())).unwrap();

        assert!(advance_stage(&mut state, Stage::Camera).is_err());
        let camera = state.store.stage_record(Stage::Camera).unwrap();
        assert_eq!(camera.text(FISH_ID), Some("F-2"));
        assert_eq!(camera.timestamp(CAPTURE_END), None);

        assert!(advance_stage(&mut state, Stage::Measurement).is_err());
        assert!(clear_stage(&mut state, Stage::Measurement).is_err());
    }

    #[test]
    fn export_reports_empty_session() {
        let state = state();
        let dir = tempdir().unwrap();
        assert_eq!(
            export_entries(&state, dir.path()),
            Err("No data to export".to_string())
        );
    }

    #[test]
    fn export_writes_recorded_entries() {
        let mut state = state();
        walk_to_measurement(&mut state, "F-1");
        record_measurement(&mut state, input("500", "300")).unwrap();

        let dir = tempdir().unwrap();
        let message = export_entries(&state, dir.path()).unwrap();
        assert!(message.starts_with("Exported to "));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn reset_clears_entries_and_keeps_pen() {
        let mut state = state();
        update_sampling_info(
            &mut state,
            SamplingPatch {
                pen_id: Some("412".into()),
                ..SamplingPatch::default()
            },
        );
        walk_to_measurement(&mut state, "F-1");
        record_measurement(&mut state, input("500", "300")).unwrap();

        reset_session(&mut state);
        let overview = get_overview(&state);
        assert_eq!(overview.entry_count, 0);
        assert_eq!(overview.sampling_info.pen_id, "412");
    }

    #[tokio::test]
    async fn saving_an_empty_session_is_reported() {
        let state = state();
        assert_eq!(
            save_entries(&state, false).await,
            Err("Failed to save to backend: No data to save".to_string())
        );
    }

    #[tokio::test]
    async fn starting_an_unnamed_collection_is_reported() {
        let mut state = state();
        let err = start_collection(&mut state, None).await.unwrap_err();
        assert_eq!(err, "Failed to start collection: A collection needs a name");
        assert_eq!(state.store.sampling_info().collection_id, None);
    }

    #[tokio::test]
    async fn started_collection_becomes_active() {
        use axum::{routing::post, Json, Router};
        use serde_json::{json, Value};

        async fn create(Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(body["name"], "Autumn grading");
            Json(json!({ "collectionId": 7 }))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/api/collections", post(create));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut state = state();
        state.remote = RemoteClient::with_base(&format!("http://{addr}/api"), None).unwrap();

        let message = start_collection(&mut state, Some(" Autumn grading ".into()))
            .await
            .unwrap();
        assert_eq!(message, "Started collection Autumn grading (7)");
        let info = state.store.sampling_info();
        assert_eq!(info.collection_id, Some(7));
        assert_eq!(info.name, "Autumn grading");
    }

    #[tokio::test]
    async fn submitting_without_collection_is_reported() {
        let mut state = state();
        walk_to_measurement(&mut state, "F-1");
        record_measurement(&mut state, input("500", "300")).unwrap();

        let err = submit_latest(&state).await.unwrap_err();
        assert!(err.contains("No collection selected"), "{err}");
        assert_eq!(state.store.entries().len(), 1);
    }
}
