//! Key-value persistence behind the session store.
//!
//! The store mirrors each of its records under a fixed key as JSON text.
//! Implementations only move strings around; decoding and the fallback to
//! defaults live in the store.

use std::collections::HashMap;

use anyhow::Result;

mod migrations;
pub mod sqlite;

pub use sqlite::SqlitePersistence;

pub const STAGES_KEY: &str = "stages";
pub const ENTRIES_KEY: &str = "entries";
pub const SAMPLING_INFO_KEY: &str = "samplingInfo";

pub trait Persistence: Send {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// In-process storage, used when no durable layer is available.
#[derive(Debug, Default, Clone)]
pub struct MemoryPersistence {
    values: HashMap<String, String>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.values.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_persistence_round_trips_and_clears() {
        let mut storage = MemoryPersistence::new().with_value(STAGES_KEY, "{}");
        storage.save(ENTRIES_KEY, "[]").unwrap();

        assert_eq!(storage.load(STAGES_KEY).unwrap().as_deref(), Some("{}"));
        assert_eq!(storage.load(ENTRIES_KEY).unwrap().as_deref(), Some("[]"));

        storage.clear().unwrap();
        assert_eq!(storage.load(STAGES_KEY).unwrap(), None);
    }
}
