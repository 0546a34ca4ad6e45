//! Progress store boundary
//!
//! The engine only needs keyed load/save of the three record kinds plus bulk
//! reads of a learner's records for a rank. How those are persisted is up to
//! the implementation; [`MemoryStore`] keeps everything in process.

pub mod memory;

pub use memory::MemoryStore;

use thiserror::Error;

use crate::types::{AtomicItemProgress, LearnerActivityState, SequenceProgress};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed persistence for progress records.
///
/// Implementations do not need to serialize writers; `ProgressEngine` holds a
/// per-record lock across each load/save pair.
pub trait ProgressStore: Send + Sync {
    fn load_atomic(
        &self,
        learner_id: &str,
        item_id: &str,
    ) -> StoreResult<Option<AtomicItemProgress>>;
    fn save_atomic(&self, record: &AtomicItemProgress) -> StoreResult<()>;

    fn load_sequence(
        &self,
        learner_id: &str,
        sequence_id: &str,
    ) -> StoreResult<Option<SequenceProgress>>;
    fn save_sequence(&self, record: &SequenceProgress) -> StoreResult<()>;

    fn load_activity(&self, learner_id: &str) -> StoreResult<Option<LearnerActivityState>>;
    fn save_activity(&self, state: &LearnerActivityState) -> StoreResult<()>;

    /// Existing atomic records of a learner among `item_ids`; missing ids are skipped
    fn atomic_for_learner(
        &self,
        learner_id: &str,
        item_ids: &[String],
    ) -> StoreResult<Vec<AtomicItemProgress>>;

    /// Existing sequence records of a learner among `sequence_ids`
    fn sequences_for_learner(
        &self,
        learner_id: &str,
        sequence_ids: &[String],
    ) -> StoreResult<Vec<SequenceProgress>>;
}
