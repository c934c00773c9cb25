//! In-memory session state mirrored to a [`Persistence`] port.
//!
//! The store owns the stage slots, the ordered entry sequence and the
//! sampling-session metadata. Storage is only read at construction; after
//! that every mutation writes the affected record back under its key.
//!
//! A snapshot that is missing or fails to decode is a cache miss: the store
//! falls back to the default for that record and carries on. Write failures
//! are logged and leave the in-memory state as the source of truth.

use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::{
    log_error, log_info, log_warn,
    models::{
        CollectionSummary, FishEntry, MeasurementDraft, SamplingInfo, SamplingPatch, Stage,
        StageRecord, Stages,
    },
    storage::{MemoryPersistence, Persistence, ENTRIES_KEY, SAMPLING_INFO_KEY, STAGES_KEY},
    validation::{validate_draft, Rejection},
};

const ENABLE_LOGS: bool = true;

/// Number of distinct fish icons the stations can show.
pub const FISH_ICON_COUNT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("{0} stage is already active")]
    SlotOccupied(Stage),
    #[error("{0} stage is not active")]
    SlotEmpty(Stage),
    #[error("{0} is the last stage")]
    NoNextStage(Stage),
}

pub struct SessionStore {
    stages: Stages,
    entries: Vec<FishEntry>,
    sampling: SamplingInfo,
    persistence: Box<dyn Persistence>,
}

impl SessionStore {
    /// Seed the store from whatever the persistence layer holds.
    pub fn initialize(persistence: Box<dyn Persistence>) -> Self {
        let stages = load_snapshot(&*persistence, STAGES_KEY);
        let entries: Vec<FishEntry> = load_snapshot(&*persistence, ENTRIES_KEY);
        let sampling = load_snapshot(&*persistence, SAMPLING_INFO_KEY);

        log_info!("Session store loaded with {} entries", entries.len());

        Self {
            stages,
            entries,
            sampling,
            persistence,
        }
    }

    /// A store with no durable layer behind it.
    pub fn detached() -> Self {
        Self::initialize(Box::new(MemoryPersistence::new()))
    }

    pub fn stages(&self) -> &Stages {
        &self.stages
    }

    pub fn entries(&self) -> &[FishEntry] {
        &self.entries
    }

    pub fn sampling_info(&self) -> &SamplingInfo {
        &self.sampling
    }

    pub fn is_stage_active(&self, stage: Stage) -> bool {
        self.stages.is_active(stage)
    }

    pub fn camera_stage_active(&self) -> bool {
        self.is_stage_active(Stage::Camera)
    }

    pub fn sedation_stage_active(&self) -> bool {
        self.is_stage_active(Stage::Sedation)
    }

    pub fn measurement_stage_active(&self) -> bool {
        self.is_stage_active(Stage::Measurement)
    }

    pub fn stage_record(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.slot(stage)
    }

    pub fn begin_stage(&mut self, stage: Stage, record: StageRecord) -> Result<(), StageError> {
        let slot = self.stages.slot_mut(stage);
        if slot.is_some() {
            return Err(StageError::SlotOccupied(stage));
        }
        *slot = Some(record);
        self.mirror_stages();
        Ok(())
    }

    /// Hand the record in `from` over to the following stage.
    pub fn advance_stage(&mut self, from: Stage) -> Result<Stage, StageError> {
        let to = from.next().ok_or(StageError::NoNextStage(from))?;
        if !self.stages.is_active(from) {
            return Err(StageError::SlotEmpty(from));
        }
        if self.stages.is_active(to) {
            return Err(StageError::SlotOccupied(to));
        }
        let record = self.stages.slot_mut(from).take();
        *self.stages.slot_mut(to) = record;
        self.mirror_stages();
        Ok(to)
    }

    /// Apply `update` to the record held in `stage`.
    pub fn update_stage<F>(&mut self, stage: Stage, update: F) -> Result<(), StageError>
    where
        F: FnOnce(&mut StageRecord),
    {
        let record = self
            .stages
            .slot_mut(stage)
            .as_mut()
            .ok_or(StageError::SlotEmpty(stage))?;
        update(record);
        self.mirror_stages();
        Ok(())
    }

    pub fn complete_stage(&mut self, stage: Stage) -> Option<StageRecord> {
        let record = self.stages.slot_mut(stage).take();
        if record.is_some() {
            self.mirror_stages();
        }
        record
    }

    /// A random icon index that no active stage is showing.
    pub fn unused_icon_index(&self) -> usize {
        let in_use = self.stages.icons_in_use();
        let free: Vec<usize> = (0..FISH_ICON_COUNT)
            .filter(|idx| !in_use.contains(idx))
            .collect();
        let mut rng = rand::thread_rng();
        if free.is_empty() {
            return rng.gen_range(0..FISH_ICON_COUNT);
        }
        free[rng.gen_range(0..free.len())]
    }

    /// Validate and append an entry, returning the new entry count.
    pub fn record_entry(&mut self, draft: MeasurementDraft) -> Result<usize, Rejection> {
        let fish_id = draft.fish_id.clone();
        let entry = validate_draft(draft).map_err(|rejection| {
            log_warn!("Rejected fish {fish_id}: {rejection}");
            rejection
        })?;

        self.entries.push(entry);
        mirror(self.persistence.as_mut(), ENTRIES_KEY, &self.entries);
        log_info!("Recorded fish {fish_id} ({} total)", self.entries.len());
        Ok(self.entries.len())
    }

    pub fn update_sampling_info(&mut self, patch: SamplingPatch) {
        self.sampling.apply(patch);
        self.mirror_sampling();
    }

    pub fn select_collection(&mut self, collection: &CollectionSummary) {
        self.set_active_collection(collection.id, &collection.name);
    }

    /// Point the session at a backend collection, e.g. one just created.
    pub fn set_active_collection(&mut self, collection_id: i64, name: &str) {
        self.sampling.collection_id = Some(collection_id);
        self.sampling.name = name.to_string();
        self.mirror_sampling();
    }

    /// Drop all persisted state and start a fresh session.
    ///
    /// Stages and entries are emptied. Sampling metadata follows the
    /// field-level reset policy and is written back so the retained fields
    /// outlive a restart.
    pub fn reset_session(&mut self) {
        if let Err(err) = self.persistence.clear() {
            log_error!("Failed to clear session storage: {err:#}");
        }

        self.stages = Stages::default();
        self.entries.clear();
        self.sampling.reset_for_new_session();
        self.mirror_sampling();

        log_info!("Session reset");
    }

    fn mirror_stages(&mut self) {
        mirror(self.persistence.as_mut(), STAGES_KEY, &self.stages);
    }

    fn mirror_sampling(&mut self) {
        mirror(self.persistence.as_mut(), SAMPLING_INFO_KEY, &self.sampling);
    }
}

fn mirror<T: Serialize>(persistence: &mut dyn Persistence, key: &str, value: &T) {
    let serialized = match serde_json::to_string(value) {
        Ok(serialized) => serialized,
        Err(err) => {
            log_error!("Failed to serialize '{key}': {err}");
            return;
        }
    };
    if let Err(err) = persistence.save(key, &serialized) {
        log_error!("Failed to persist '{key}': {err:#}");
    }
}

fn load_snapshot<T>(persistence: &dyn Persistence, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match persistence.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            log_warn!("Failed to read '{key}', using defaults: {err:#}");
            return T::default();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|err| {
        log_warn!("Discarding unreadable '{key}' snapshot: {err}");
        T::default()
    })
}
