//! Sampling-session metadata.
//!
//! One `SamplingInfo` describes the collection every captured fish belongs
//! to. Clearing a session only resets the fields marked in
//! [`RESET_POLICY`]; the physical setup (pen, species, location) is usually
//! reused for the next collection.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PEN_ID: &str = "880";
pub const DEFAULT_SPECIES: &str = "atlantic_salmon";
pub const DEFAULT_LOCATION: &str = "bergen_workshop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingField {
    CollectionId,
    Name,
    PenId,
    Species,
    Location,
    Notes,
}

/// Whether a field goes back to its default when the session is cleared.
#[derive(Debug, Clone, Copy)]
pub struct FieldPolicy {
    pub field: SamplingField,
    pub reset_on_clear: bool,
}

pub const RESET_POLICY: [FieldPolicy; 6] = [
    FieldPolicy {
        field: SamplingField::CollectionId,
        reset_on_clear: true,
    },
    FieldPolicy {
        field: SamplingField::Name,
        reset_on_clear: true,
    },
    FieldPolicy {
        field: SamplingField::PenId,
        reset_on_clear: false,
    },
    FieldPolicy {
        field: SamplingField::Species,
        reset_on_clear: false,
    },
    FieldPolicy {
        field: SamplingField::Location,
        reset_on_clear: false,
    },
    FieldPolicy {
        field: SamplingField::Notes,
        reset_on_clear: true,
    },
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SamplingInfo {
    #[serde(default)]
    pub collection_id: Option<i64>,
    #[serde(default)]
    pub name: String,
    pub pen_id: String,
    pub species: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Default for SamplingInfo {
    fn default() -> Self {
        Self {
            collection_id: None,
            name: String::new(),
            pen_id: DEFAULT_PEN_ID.into(),
            species: DEFAULT_SPECIES.into(),
            location: Some(DEFAULT_LOCATION.into()),
            notes: None,
        }
    }
}

/// Partial update of the session metadata; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingPatch {
    pub name: Option<String>,
    pub pen_id: Option<String>,
    pub species: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl SamplingInfo {
    /// Restore every field whose policy says `reset_on_clear`.
    pub fn reset_for_new_session(&mut self) {
        let defaults = SamplingInfo::default();
        for policy in RESET_POLICY.iter().filter(|policy| policy.reset_on_clear) {
            self.copy_field(&defaults, policy.field);
        }
    }

    fn copy_field(&mut self, from: &SamplingInfo, field: SamplingField) {
        match field {
            SamplingField::CollectionId => self.collection_id = from.collection_id,
            SamplingField::Name => self.name = from.name.clone(),
            SamplingField::PenId => self.pen_id = from.pen_id.clone(),
            SamplingField::Species => self.species = from.species.clone(),
            SamplingField::Location => self.location = from.location.clone(),
            SamplingField::Notes => self.notes = from.notes.clone(),
        }
    }

    pub fn apply(&mut self, patch: SamplingPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(pen_id) = patch.pen_id {
            self.pen_id = pen_id;
        }
        if let Some(species) = patch.species {
            self.species = species;
        }
        if let Some(location) = patch.location {
            self.location = Some(location).filter(|value| !value.is_empty());
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes).filter(|value| !value.is_empty());
        }
    }
}
