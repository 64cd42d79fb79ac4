//! In-memory track snapshot store.
//!
//! Pairs are immutable snapshots: a timing correction produces a new pair
//! that replaces the stored one wholesale, and deletion discards both tracks
//! together. There is no persistence; state lives for the server's lifetime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::AppError;
use crate::model::TrackPair;

/// Id-keyed store of track pairs.
#[derive(Default)]
pub struct TrackStore {
    next_id: AtomicU64,
    pairs: RwLock<HashMap<u64, TrackPair>>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new pair and returns its id.
    pub fn insert(&self, pair: TrackPair) -> Result<u64, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let mut pairs = self.write_pairs()?;
        pairs.insert(id, pair);
        Ok(id)
    }

    /// Returns a snapshot of the pair with the given id.
    pub fn get(&self, id: u64) -> Result<Option<TrackPair>, AppError> {
        let pairs = self
            .pairs
            .read()
            .map_err(|_| AppError::internal("track store lock poisoned"))?;
        Ok(pairs.get(&id).cloned())
    }

    /// Swaps in a replacement snapshot; returns `false` when the id is gone.
    pub fn replace(&self, id: u64, pair: TrackPair) -> Result<bool, AppError> {
        let mut pairs = self.write_pairs()?;
        match pairs.get_mut(&id) {
            Some(slot) => {
                *slot = pair;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Discards the pair; returns `false` when the id is gone.
    pub fn remove(&self, id: u64) -> Result<bool, AppError> {
        let mut pairs = self.write_pairs()?;
        Ok(pairs.remove(&id).is_some())
    }

    fn write_pairs(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<u64, TrackPair>>, AppError> {
        self.pairs
            .write()
            .map_err(|_| AppError::internal("track store lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TimedTrack, TrackMetadata, TrackPair};

    fn pair(title: &str) -> TrackPair {
        let track = |language: &str| TimedTrack {
            metadata: TrackMetadata {
                title: title.to_string(),
                artist: "Artist".to_string(),
                duration_ms: 1_000,
                language: language.to_string(),
                version: "1.0".to_string(),
            },
            segments: vec![],
        };
        TrackPair {
            source: track("es-ES"),
            translation: track("en-US"),
        }
    }

    #[test]
    fn insert_assigns_distinct_ids() {
        let store = TrackStore::new();
        let first = store.insert(pair("One")).unwrap();
        let second = store.insert(pair("Two")).unwrap();
        assert_ne!(first, second);
        assert_eq!(
            store.get(first).unwrap().unwrap().source.metadata.title,
            "One"
        );
    }

    #[test]
    fn replace_swaps_the_whole_pair() {
        let store = TrackStore::new();
        let id = store.insert(pair("Before")).unwrap();
        assert!(store.replace(id, pair("After")).unwrap());
        assert_eq!(
            store.get(id).unwrap().unwrap().source.metadata.title,
            "After"
        );
    }

    #[test]
    fn replace_and_remove_report_missing_ids() {
        let store = TrackStore::new();
        assert!(!store.replace(42, pair("Nope")).unwrap());
        assert!(!store.remove(42).unwrap());

        let id = store.insert(pair("Gone")).unwrap();
        assert!(store.remove(id).unwrap());
        assert!(store.get(id).unwrap().is_none());
    }
}
