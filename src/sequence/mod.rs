//! Sequence Mastery Tracker
//!
//! Movement patterns and step-sparring sequences share a record shape but not
//! an algorithm. The shared run bookkeeping lives here; each variant's mastery
//! model is a [`SequenceProgressPolicy`]:
//!
//! - [`PatternPolicy`] - consecutive good runs plus average accuracy, with a
//!   spaced re-practice date
//! - [`SparringPolicy`] - linear step completion, no review date

pub mod pattern;
pub mod sparring;

pub use pattern::PatternPolicy;
pub use sparring::SparringPolicy;

use crate::error::{ProgressError, ProgressResult};
use crate::sanitize::{ensure_non_negative_seconds, ensure_unit_interval, increment_count};
use crate::types::{PracticeRun, SequenceProgress, SequenceVariant};

/// Variant-specific half of a practice-run update
pub trait SequenceProgressPolicy: Send + Sync {
    fn variant(&self) -> SequenceVariant;

    /// Reject runs this variant cannot apply, before anything is updated
    fn validate(&self, progress: &SequenceProgress, run: &PracticeRun) -> ProgressResult<()>;

    /// Update the variant track and mastery level.
    ///
    /// Called after the shared counters already include `run`.
    fn apply(&self, progress: &mut SequenceProgress, run: &PracticeRun) -> ProgressResult<()>;
}

static PATTERN_POLICY: PatternPolicy = PatternPolicy;
static SPARRING_POLICY: SparringPolicy = SparringPolicy;

pub fn policy_for(variant: SequenceVariant) -> &'static dyn SequenceProgressPolicy {
    match variant {
        SequenceVariant::Pattern => &PATTERN_POLICY,
        SequenceVariant::SparringSequence => &SPARRING_POLICY,
    }
}

/// Apply one completed practice run and return the updated record
pub fn record_run(
    record: &SequenceProgress,
    run: &PracticeRun,
    variant: SequenceVariant,
) -> ProgressResult<SequenceProgress> {
    ensure_unit_interval("accuracy", run.accuracy)?;
    ensure_non_negative_seconds("durationSeconds", run.duration_seconds)?;
    if record.variant() != variant {
        return Err(ProgressError::invalid(
            "variant",
            format!(
                "record {} is a {} but the run was submitted as a {}",
                record.sequence_id,
                record.variant().as_str(),
                variant.as_str()
            ),
        ));
    }

    let policy = policy_for(variant);
    policy.validate(record, run)?;

    let mut next = record.clone();
    apply_common(&mut next, run)?;
    policy.apply(&mut next, run)?;
    Ok(next)
}

/// Counters every variant keeps the same way
fn apply_common(progress: &mut SequenceProgress, run: &PracticeRun) -> ProgressResult<()> {
    progress.practice_count = increment_count("practiceCount", progress.practice_count)?;
    progress.total_practice_time_seconds += run.duration_seconds;

    let n = progress.practice_count as f64;
    progress.average_accuracy = (progress.average_accuracy * (n - 1.0) + run.accuracy) / n;

    progress.best_run_accuracy = progress.best_run_accuracy.max(run.accuracy);
    progress.last_practiced_at = Some(run.completed_at);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MasteryLevel;
    use chrono::{DateTime, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 4, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_policy_lookup_matches_variant() {
        assert_eq!(policy_for(SequenceVariant::Pattern).variant(), SequenceVariant::Pattern);
        assert_eq!(
            policy_for(SequenceVariant::SparringSequence).variant(),
            SequenceVariant::SparringSequence
        );
    }

    #[test]
    fn test_common_counters() {
        let record = SequenceProgress::new_pattern("l", "do-san", t0());
        let first_run = PracticeRun::new(0.6, 45.0, t0());
        let first = record_run(&record, &first_run, SequenceVariant::Pattern).unwrap();
        let second_run = PracticeRun::new(0.8, 30.0, t0());
        let second = record_run(&first, &second_run, SequenceVariant::Pattern).unwrap();

        assert_eq!(second.practice_count, 2);
        assert_eq!(second.total_practice_time_seconds, 75.0);
        assert!((second.average_accuracy - 0.7).abs() < 1e-12);
        assert_eq!(second.best_run_accuracy, 0.8);
        assert_eq!(second.last_practiced_at, Some(t0()));
    }

    #[test]
    fn test_best_run_never_decreases() {
        let mut record = SequenceProgress::new_sparring("l", "3-step-2", 5, t0());
        for acc in [0.9, 0.4, 0.7] {
            record = record_run(
                &record,
                &PracticeRun::new(acc, 10.0, t0()),
                SequenceVariant::SparringSequence,
            )
            .unwrap();
        }
        assert_eq!(record.best_run_accuracy, 0.9);
    }

    #[test]
    fn test_rejects_out_of_range_accuracy() {
        let record = SequenceProgress::new_pattern("l", "won-hyo", t0());
        let err = record_run(&record, &PracticeRun::new(1.2, 10.0, t0()), SequenceVariant::Pattern)
            .unwrap_err();
        assert_eq!(err.field(), "accuracy");
        let err = record_run(&record, &PracticeRun::new(0.5, -3.0, t0()), SequenceVariant::Pattern)
            .unwrap_err();
        assert_eq!(err.field(), "durationSeconds");
    }

    #[test]
    fn test_rejects_variant_mismatch() {
        let record = SequenceProgress::new_pattern("l", "won-hyo", t0());
        let err = record_run(
            &record,
            &PracticeRun::new(0.5, 10.0, t0()),
            SequenceVariant::SparringSequence,
        )
        .unwrap_err();
        assert_eq!(err.field(), "variant");
    }

    #[test]
    fn test_rejects_exhausted_practice_counter() {
        let mut record = SequenceProgress::new_pattern("l", "yul-gok", t0());
        record.practice_count = u32::MAX;
        let err = record_run(&record, &PracticeRun::new(0.8, 10.0, t0()), SequenceVariant::Pattern)
            .unwrap_err();
        assert_eq!(err.field(), "practiceCount");
    }

    #[test]
    fn test_rejected_run_leaves_record_untouched() {
        let record = SequenceProgress::new_sparring("l", "3-step-1", 4, t0());
        let bad = PracticeRun::new(1.0, 10.0, t0()).with_steps(7);
        assert!(record_run(&record, &bad, SequenceVariant::SparringSequence).is_err());
        assert_eq!(record.practice_count, 0);
        assert_eq!(record.mastery_level, MasteryLevel::Learning);
    }
}
