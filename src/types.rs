//! Common Types and Constants
//!
//! Progress records shared by the scheduler, the sequence tracker, the streak
//! calculator and the advancement evaluator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Lowest Leitner box
pub const MIN_BOX: u8 = 1;

/// Highest Leitner box
pub const MAX_BOX: u8 = 5;

/// Review interval in days for boxes 1..=5
pub const BOX_INTERVAL_DAYS: [i64; 5] = [1, 3, 7, 14, 30];

/// Run accuracy that counts as a correct pattern run
pub const PATTERN_CORRECT_RUN_ACCURACY: f64 = 0.90;

/// Terminology fraction required for advancement
pub const ADVANCEMENT_TERMINOLOGY_FRACTION: f64 = 0.8;

/// Mastered patterns required for advancement
pub const ADVANCEMENT_MIN_MASTERED_PATTERNS: usize = 1;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

// ==================== Mastery ====================

/// Four-stage ordinal classification of a learner's command of one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum MasteryLevel {
    #[default]
    Learning,
    Familiar,
    Proficient,
    Mastered,
}

impl MasteryLevel {
    /// Terminology mastery, keyed only on the current correct-answer streak
    pub fn from_consecutive_correct(consecutive_correct: u32) -> Self {
        match consecutive_correct {
            0..=2 => MasteryLevel::Learning,
            3..=5 => MasteryLevel::Familiar,
            6..=9 => MasteryLevel::Proficient,
            _ => MasteryLevel::Mastered,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MasteryLevel::Learning => "learning",
            MasteryLevel::Familiar => "familiar",
            MasteryLevel::Proficient => "proficient",
            MasteryLevel::Mastered => "mastered",
        }
    }
}

impl std::fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Terminology ====================

/// Leitner progress for one (learner, atomic item) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomicItemProgress {
    pub learner_id: String,
    pub item_id: String,
    /// Leitner box, 1..=5
    #[serde(rename = "box")]
    pub leitner_box: u8,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub consecutive_correct: u32,
    /// Always `correct_count + incorrect_count`
    pub total_reviews: u32,
    pub average_response_time_seconds: f64,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_date: DateTime<Utc>,
    pub mastery_level: MasteryLevel,
    pub created_at: DateTime<Utc>,
}

impl AtomicItemProgress {
    /// A fresh record in box 1, due immediately
    pub fn new(
        learner_id: impl Into<String>,
        item_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            learner_id: learner_id.into(),
            item_id: item_id.into(),
            leitner_box: MIN_BOX,
            correct_count: 0,
            incorrect_count: 0,
            consecutive_correct: 0,
            total_reviews: 0,
            average_response_time_seconds: 0.0,
            last_reviewed_at: None,
            next_review_date: now,
            mastery_level: MasteryLevel::Learning,
            created_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_review_date
    }

    /// Share of answers that were correct, 0 before the first answer
    pub fn accuracy(&self) -> f64 {
        if self.total_reviews == 0 {
            0.0
        } else {
            self.correct_count as f64 / self.total_reviews as f64
        }
    }
}

// ==================== Sequences ====================

/// Which mastery model a sequence follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SequenceVariant {
    /// Movement pattern, re-practiced indefinitely for polish
    Pattern,
    /// Step-sparring sequence walked linearly through fixed steps
    SparringSequence,
}

impl SequenceVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceVariant::Pattern => "pattern",
            SequenceVariant::SparringSequence => "sparringSequence",
        }
    }
}

/// Pattern-specific progress pointers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternTrack {
    pub consecutive_correct_runs: u32,
    pub next_review_date: DateTime<Utc>,
}

/// Sparring-specific step cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparringTrack {
    pub steps_completed: u32,
    /// 1-based step the learner should work on next
    pub current_step: u32,
    pub total_steps: u32,
}

impl SparringTrack {
    pub fn completion_rate(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        self.steps_completed as f64 / self.total_steps as f64
    }

    pub fn is_complete(&self) -> bool {
        self.steps_completed >= self.total_steps
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "camelCase")]
pub enum SequenceTrack {
    Pattern(PatternTrack),
    SparringSequence(SparringTrack),
}

impl SequenceTrack {
    pub fn variant(&self) -> SequenceVariant {
        match self {
            SequenceTrack::Pattern(_) => SequenceVariant::Pattern,
            SequenceTrack::SparringSequence(_) => SequenceVariant::SparringSequence,
        }
    }
}

/// Progress for one (learner, sequence) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceProgress {
    pub learner_id: String,
    pub sequence_id: String,
    pub practice_count: u32,
    /// Running mean of run accuracy, 0..=1
    pub average_accuracy: f64,
    /// Best single-run accuracy, never decreases
    pub best_run_accuracy: f64,
    pub total_practice_time_seconds: f64,
    pub mastery_level: MasteryLevel,
    pub last_practiced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub track: SequenceTrack,
}

impl SequenceProgress {
    /// A movement pattern record, suggested for practice right away
    pub fn new_pattern(
        learner_id: impl Into<String>,
        sequence_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::with_track(
            learner_id,
            sequence_id,
            now,
            SequenceTrack::Pattern(PatternTrack {
                consecutive_correct_runs: 0,
                next_review_date: now,
            }),
        )
    }

    /// A sparring record positioned on step 1.
    ///
    /// `total_steps` is not checked here; `SparringPolicy` rejects zero-step
    /// tracks when a run is recorded.
    pub fn new_sparring(
        learner_id: impl Into<String>,
        sequence_id: impl Into<String>,
        total_steps: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self::with_track(
            learner_id,
            sequence_id,
            now,
            SequenceTrack::SparringSequence(SparringTrack {
                steps_completed: 0,
                current_step: 1,
                total_steps,
            }),
        )
    }

    fn with_track(
        learner_id: impl Into<String>,
        sequence_id: impl Into<String>,
        now: DateTime<Utc>,
        track: SequenceTrack,
    ) -> Self {
        Self {
            learner_id: learner_id.into(),
            sequence_id: sequence_id.into(),
            practice_count: 0,
            average_accuracy: 0.0,
            best_run_accuracy: 0.0,
            total_practice_time_seconds: 0.0,
            mastery_level: MasteryLevel::Learning,
            last_practiced_at: None,
            created_at: now,
            track,
        }
    }

    pub fn variant(&self) -> SequenceVariant {
        self.track.variant()
    }

    /// Review date for patterns; sparring sequences are practiced on demand
    pub fn next_review_date(&self) -> Option<DateTime<Utc>> {
        match &self.track {
            SequenceTrack::Pattern(p) => Some(p.next_review_date),
            SequenceTrack::SparringSequence(_) => None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_date().is_some_and(|due| now >= due)
    }

    /// Step completion in percent, sparring sequences only
    pub fn progress_percentage(&self) -> Option<f64> {
        match &self.track {
            SequenceTrack::SparringSequence(s) => Some(s.completion_rate() * 100.0),
            SequenceTrack::Pattern(_) => None,
        }
    }
}

/// One completed practice run of a sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeRun {
    /// Run accuracy, 0..=1
    pub accuracy: f64,
    pub duration_seconds: f64,
    /// Highest step reached in this run (sparring only)
    #[serde(default)]
    pub steps_completed: Option<u32>,
    pub completed_at: DateTime<Utc>,
}

impl PracticeRun {
    pub fn new(accuracy: f64, duration_seconds: f64, completed_at: DateTime<Utc>) -> Self {
        Self {
            accuracy,
            duration_seconds,
            steps_completed: None,
            completed_at,
        }
    }

    pub fn with_steps(mut self, steps_completed: u32) -> Self {
        self.steps_completed = Some(steps_completed);
        self
    }
}

// ==================== Activity ====================

/// Daily streak and study-time totals for one learner profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerActivityState {
    pub learner_id: String,
    pub streak_days: u32,
    pub last_active_at: DateTime<Utc>,
    pub total_study_time_seconds: f64,
}

impl LearnerActivityState {
    pub fn new(learner_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            learner_id: learner_id.into(),
            streak_days: 0,
            last_active_at: now,
            total_study_time_seconds: 0.0,
        }
    }
}

// ==================== Advancement ====================

/// On-demand view of whether a learner may progress to the next rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancementSnapshot {
    pub terminology_mastery_fraction: f64,
    pub mastered_sequence_count: usize,
    pub eligible: bool,
    pub mastered_term_count: usize,
    pub term_count: usize,
}
