//! Progress engine
//!
//! Wires the pure transformations to a [`ProgressStore`]. Every write path is a
//! load, transform, save sequence held under a lock keyed by the record, so two
//! events for the same (learner, item) never interleave while events for
//! different records run in parallel.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use parking_lot::Mutex;
use thiserror::Error;

use crate::advancement;
use crate::config::Config;
use crate::error::ProgressError;
use crate::leitner;
use crate::sanitize::ensure_step_counts;
use crate::sequence;
use crate::store::{ProgressStore, StoreError};
use crate::streak;
use crate::types::{
    AdvancementSnapshot, AtomicItemProgress, LearnerActivityState, PracticeRun, SequenceProgress,
    SequenceVariant,
};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// How a sequence record is set up when a learner first practices it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceSetup {
    Pattern,
    Sparring { total_steps: u32 },
}

impl SequenceSetup {
    pub fn variant(&self) -> SequenceVariant {
        match self {
            SequenceSetup::Pattern => SequenceVariant::Pattern,
            SequenceSetup::Sparring { .. } => SequenceVariant::SparringSequence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LockKey {
    Atomic(String, String),
    Sequence(String, String),
    Activity(String),
}

/// Per-record write locks; entries are dropped once no caller holds them
#[derive(Default)]
struct KeyedLocks {
    table: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    fn with_lock<T>(&self, key: LockKey, f: impl FnOnce() -> T) -> T {
        let entry = {
            let mut table = self.table.lock();
            Arc::clone(table.entry(key.clone()).or_default())
        };

        let result = {
            let _guard = entry.lock();
            f()
        };

        let mut table = self.table.lock();
        // table + this caller; nobody else can clone without the table lock
        if Arc::strong_count(&entry) == 2 {
            table.remove(&key);
        }
        result
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().len()
    }
}

pub struct ProgressEngine<S: ProgressStore> {
    store: S,
    locks: KeyedLocks,
    day_offset: FixedOffset,
}

impl<S: ProgressStore> ProgressEngine<S> {
    /// `day_offset` places midnight for streak calendar days
    pub fn new(store: S, day_offset: FixedOffset) -> Self {
        Self {
            store,
            locks: KeyedLocks::default(),
            day_offset,
        }
    }

    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(store, config.day_offset())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ========== Terminology ==========

    /// Record an answer, creating the item record on first use
    pub fn answer(
        &self,
        learner_id: &str,
        item_id: &str,
        is_correct: bool,
        response_time_seconds: f64,
        now: DateTime<Utc>,
    ) -> EngineResult<AtomicItemProgress> {
        let key = LockKey::Atomic(learner_id.to_string(), item_id.to_string());
        self.locks.with_lock(key, || -> EngineResult<AtomicItemProgress> {
            let current = match self.store.load_atomic(learner_id, item_id)? {
                Some(record) => record,
                None => AtomicItemProgress::new(learner_id, item_id, now),
            };
            let next = leitner::record_answer(&current, is_correct, response_time_seconds, now)
                .inspect_err(|e| {
                    tracing::warn!(learner_id, item_id, error = %e, "answer rejected")
                })?;
            self.store.save_atomic(&next)?;

            tracing::debug!(
                learner_id,
                item_id,
                is_correct,
                leitner_box = next.leitner_box,
                mastery = %next.mastery_level,
                "answer recorded"
            );
            Ok(next)
        })
    }

    /// Due terminology among `item_ids`, earliest first. Items never reviewed
    /// are due immediately and come back as fresh, unsaved records.
    pub fn due_items(
        &self,
        learner_id: &str,
        item_ids: &[String],
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<AtomicItemProgress>> {
        let records = self.rank_terms(learner_id, item_ids, now)?;
        Ok(leitner::due_items(&records, now).into_iter().cloned().collect())
    }

    // ========== Sequences ==========

    /// Create the sequence record if the learner has none yet.
    ///
    /// An existing record is returned as-is, even if `setup` differs.
    pub fn begin_sequence(
        &self,
        learner_id: &str,
        sequence_id: &str,
        setup: SequenceSetup,
        now: DateTime<Utc>,
    ) -> EngineResult<SequenceProgress> {
        if let SequenceSetup::Sparring { total_steps } = setup {
            ensure_step_counts(total_steps, None)?;
        }

        let key = LockKey::Sequence(learner_id.to_string(), sequence_id.to_string());
        self.locks.with_lock(key, || -> EngineResult<SequenceProgress> {
            if let Some(existing) = self.store.load_sequence(learner_id, sequence_id)? {
                return Ok(existing);
            }
            let record = match setup {
                SequenceSetup::Pattern => {
                    SequenceProgress::new_pattern(learner_id, sequence_id, now)
                }
                SequenceSetup::Sparring { total_steps } => {
                    SequenceProgress::new_sparring(learner_id, sequence_id, total_steps, now)
                }
            };
            self.store.save_sequence(&record)?;
            tracing::info!(
                learner_id,
                sequence_id,
                variant = setup.variant().as_str(),
                "sequence started"
            );
            Ok(record)
        })
    }

    pub fn complete_run(
        &self,
        learner_id: &str,
        sequence_id: &str,
        variant: SequenceVariant,
        run: &PracticeRun,
    ) -> EngineResult<SequenceProgress> {
        let key = LockKey::Sequence(learner_id.to_string(), sequence_id.to_string());
        self.locks.with_lock(key, || -> EngineResult<SequenceProgress> {
            let current = self
                .store
                .load_sequence(learner_id, sequence_id)?
                .ok_or_else(|| {
                    StoreError::NotFound(format!("sequence {sequence_id} for learner {learner_id}"))
                })?;
            let next = sequence::record_run(&current, run, variant)
                .inspect_err(|e| {
                    tracing::warn!(learner_id, sequence_id, error = %e, "run rejected")
                })?;
            self.store.save_sequence(&next)?;

            tracing::debug!(
                learner_id,
                sequence_id,
                practice_count = next.practice_count,
                average_accuracy = next.average_accuracy,
                mastery = %next.mastery_level,
                "practice run recorded"
            );
            Ok(next)
        })
    }

    // ========== Activity ==========

    /// Create a learner profile and record its zero-duration activation.
    /// Returns the stored state if the profile already exists.
    pub fn create_profile(
        &self,
        learner_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<LearnerActivityState> {
        let key = LockKey::Activity(learner_id.to_string());
        self.locks.with_lock(key, || -> EngineResult<LearnerActivityState> {
            if let Some(existing) = self.store.load_activity(learner_id)? {
                return Ok(existing);
            }
            let fresh = LearnerActivityState::new(learner_id, now);
            let state =
                streak::record_activity(&fresh, 0.0, now.with_timezone(&self.day_offset))?;
            self.store.save_activity(&state)?;
            tracing::info!(learner_id, "learner profile created");
            Ok(state)
        })
    }

    pub fn record_activity(
        &self,
        learner_id: &str,
        study_time_seconds: f64,
        now: DateTime<Utc>,
    ) -> EngineResult<LearnerActivityState> {
        let key = LockKey::Activity(learner_id.to_string());
        self.locks.with_lock(key, || -> EngineResult<LearnerActivityState> {
            let current = self
                .store
                .load_activity(learner_id)?
                .ok_or_else(|| StoreError::NotFound(format!("learner {learner_id}")))?;
            let next = streak::record_activity(
                &current,
                study_time_seconds,
                now.with_timezone(&self.day_offset),
            )?;
            self.store.save_activity(&next)?;

            if next.streak_days != current.streak_days {
                tracing::info!(
                    learner_id,
                    from = current.streak_days,
                    to = next.streak_days,
                    "streak changed"
                );
            }
            Ok(next)
        })
    }

    // ========== Advancement ==========

    /// Advancement snapshot for the terms and sequences of the learner's
    /// current rank. Terms the learner has never answered count as not
    /// mastered. Reads take no record locks.
    pub fn evaluate_advancement(
        &self,
        learner_id: &str,
        item_ids: &[String],
        sequence_ids: &[String],
        now: DateTime<Utc>,
    ) -> EngineResult<AdvancementSnapshot> {
        let terms = self.rank_terms(learner_id, item_ids, now)?;
        let sequence_ids = distinct_ids(sequence_ids);
        let sequences = self.store.sequences_for_learner(learner_id, &sequence_ids)?;
        let snapshot = advancement::evaluate(&terms, &sequences);

        tracing::info!(
            learner_id,
            fraction = snapshot.terminology_mastery_fraction,
            mastered_patterns = snapshot.mastered_sequence_count,
            eligible = snapshot.eligible,
            "advancement evaluated"
        );
        Ok(snapshot)
    }

    /// Stored records for each distinct id in `item_ids`, with fresh
    /// placeholders for missing ones
    fn rank_terms(
        &self,
        learner_id: &str,
        item_ids: &[String],
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<AtomicItemProgress>> {
        let item_ids = distinct_ids(item_ids);
        let mut stored: HashMap<String, AtomicItemProgress> = self
            .store
            .atomic_for_learner(learner_id, &item_ids)?
            .into_iter()
            .map(|r| (r.item_id.clone(), r))
            .collect();

        Ok(item_ids
            .iter()
            .map(|id| {
                stored
                    .remove(id)
                    .unwrap_or_else(|| AtomicItemProgress::new(learner_id, id.as_str(), now))
            })
            .collect())
    }

    #[cfg(test)]
    fn held_locks(&self) -> usize {
        self.locks.len()
    }
}

/// First occurrence of each id, in input order
fn distinct_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}
