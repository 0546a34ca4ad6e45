//! In-process store backed by hash maps.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{ProgressStore, StoreResult};
use crate::types::{AtomicItemProgress, LearnerActivityState, SequenceProgress};

type RecordKey = (String, String);

fn key(learner_id: &str, id: &str) -> RecordKey {
    (learner_id.to_string(), id.to_string())
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    atomic: RwLock<HashMap<RecordKey, AtomicItemProgress>>,
    sequences: RwLock<HashMap<RecordKey, SequenceProgress>>,
    activity: RwLock<HashMap<String, LearnerActivityState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atomic_count(&self) -> usize {
        self.atomic.read().len()
    }

    pub fn sequence_count(&self) -> usize {
        self.sequences.read().len()
    }

    /// All activity states, ordered by learner id
    pub fn learners(&self) -> Vec<LearnerActivityState> {
        let mut states: Vec<LearnerActivityState> =
            self.activity.read().values().cloned().collect();
        states.sort_by(|a, b| a.learner_id.cmp(&b.learner_id));
        states
    }
}

impl ProgressStore for MemoryStore {
    fn load_atomic(
        &self,
        learner_id: &str,
        item_id: &str,
    ) -> StoreResult<Option<AtomicItemProgress>> {
        Ok(self.atomic.read().get(&key(learner_id, item_id)).cloned())
    }

    fn save_atomic(&self, record: &AtomicItemProgress) -> StoreResult<()> {
        self.atomic
            .write()
            .insert(key(&record.learner_id, &record.item_id), record.clone());
        Ok(())
    }

    fn load_sequence(
        &self,
        learner_id: &str,
        sequence_id: &str,
    ) -> StoreResult<Option<SequenceProgress>> {
        Ok(self.sequences.read().get(&key(learner_id, sequence_id)).cloned())
    }

    fn save_sequence(&self, record: &SequenceProgress) -> StoreResult<()> {
        self.sequences
            .write()
            .insert(key(&record.learner_id, &record.sequence_id), record.clone());
        Ok(())
    }

    fn load_activity(&self, learner_id: &str) -> StoreResult<Option<LearnerActivityState>> {
        Ok(self.activity.read().get(learner_id).cloned())
    }

    fn save_activity(&self, state: &LearnerActivityState) -> StoreResult<()> {
        self.activity
            .write()
            .insert(state.learner_id.clone(), state.clone());
        Ok(())
    }

    fn atomic_for_learner(
        &self,
        learner_id: &str,
        item_ids: &[String],
    ) -> StoreResult<Vec<AtomicItemProgress>> {
        let map = self.atomic.read();
        Ok(item_ids
            .iter()
            .filter_map(|id| map.get(&key(learner_id, id)).cloned())
            .collect())
    }

    fn sequences_for_learner(
        &self,
        learner_id: &str,
        sequence_ids: &[String],
    ) -> StoreResult<Vec<SequenceProgress>> {
        let map = self.sequences.read();
        Ok(sequence_ids
            .iter()
            .filter_map(|id| map.get(&key(learner_id, id)).cloned())
            .collect())
    }
}
