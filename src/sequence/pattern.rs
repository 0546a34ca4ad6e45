//! Movement pattern mastery.
//!
//! Patterns are polished indefinitely, so mastery asks for a run of good
//! performances and a high overall average at the same time. The re-practice
//! date grows with the mastery level and is scaled by how accurate the learner
//! has been overall.

use chrono::{DateTime, Duration, Utc};

use super::SequenceProgressPolicy;
use crate::error::{ProgressError, ProgressResult};
use crate::sanitize::increment_count;
use crate::types::{
    MasteryLevel, PracticeRun, SequenceProgress, SequenceTrack, SequenceVariant,
    PATTERN_CORRECT_RUN_ACCURACY, SECONDS_PER_DAY,
};

const MULTIPLIER_MIN: f64 = 0.5;
const MULTIPLIER_MAX: f64 = 2.0;
const MULTIPLIER_SCALE: f64 = 1.5;

/// (min consecutive good runs, min average accuracy, level), evaluated top-down
const RUN_THRESHOLDS: [(u32, f64, MasteryLevel); 2] = [
    (5, 0.95, MasteryLevel::Mastered),
    (3, 0.85, MasteryLevel::Proficient),
];

const FAMILIAR_MIN_PRACTICE: u32 = 3;
const FAMILIAR_MIN_AVERAGE: f64 = 0.70;

#[derive(Debug, Clone, Copy, Default)]
pub struct PatternPolicy;

impl PatternPolicy {
    pub fn mastery_level(
        consecutive_correct_runs: u32,
        average_accuracy: f64,
        practice_count: u32,
    ) -> MasteryLevel {
        for (min_runs, min_avg, level) in RUN_THRESHOLDS {
            if consecutive_correct_runs >= min_runs && average_accuracy >= min_avg {
                return level;
            }
        }
        if practice_count >= FAMILIAR_MIN_PRACTICE && average_accuracy >= FAMILIAR_MIN_AVERAGE {
            return MasteryLevel::Familiar;
        }
        MasteryLevel::Learning
    }

    pub fn base_interval_days(level: MasteryLevel) -> f64 {
        match level {
            MasteryLevel::Learning => 1.0,
            MasteryLevel::Familiar => 3.0,
            MasteryLevel::Proficient => 7.0,
            MasteryLevel::Mastered => 30.0,
        }
    }

    /// Scales the base interval. The 0.5 floor binds below 1/3 average
    /// accuracy; the 2.0 ceiling is out of reach for accuracy within [0, 1].
    pub fn performance_multiplier(average_accuracy: f64) -> f64 {
        (average_accuracy * MULTIPLIER_SCALE).clamp(MULTIPLIER_MIN, MULTIPLIER_MAX)
    }

    pub fn review_interval(level: MasteryLevel, average_accuracy: f64) -> Duration {
        let days = Self::base_interval_days(level) * Self::performance_multiplier(average_accuracy);
        Duration::milliseconds((days * SECONDS_PER_DAY * 1000.0).round() as i64)
    }

    pub fn next_review_date(
        level: MasteryLevel,
        average_accuracy: f64,
        completed_at: DateTime<Utc>,
    ) -> DateTime<Utc> {
        completed_at + Self::review_interval(level, average_accuracy)
    }
}

impl SequenceProgressPolicy for PatternPolicy {
    fn variant(&self) -> SequenceVariant {
        SequenceVariant::Pattern
    }

    fn validate(&self, progress: &SequenceProgress, _run: &PracticeRun) -> ProgressResult<()> {
        match progress.track {
            SequenceTrack::Pattern(_) => Ok(()),
            _ => Err(ProgressError::invalid("variant", "pattern policy needs a pattern track")),
        }
    }

    fn apply(&self, progress: &mut SequenceProgress, run: &PracticeRun) -> ProgressResult<()> {
        let SequenceTrack::Pattern(track) = &mut progress.track else {
            return Err(ProgressError::invalid("variant", "pattern policy needs a pattern track"));
        };

        if run.accuracy >= PATTERN_CORRECT_RUN_ACCURACY {
            track.consecutive_correct_runs =
                increment_count("consecutiveCorrectRuns", track.consecutive_correct_runs)?;
        } else {
            track.consecutive_correct_runs = 0;
        }

        let level = Self::mastery_level(
            track.consecutive_correct_runs,
            progress.average_accuracy,
            progress.practice_count,
        );
        track.next_review_date =
            Self::next_review_date(level, progress.average_accuracy, run.completed_at);
        progress.mastery_level = level;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::record_run;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn run(acc: f64) -> PracticeRun {
        PracticeRun::new(acc, 60.0, t0())
    }

    fn practice(accuracies: &[f64]) -> SequenceProgress {
        let mut record = SequenceProgress::new_pattern("learner", "chon-ji", t0());
        for &acc in accuracies {
            record = record_run(&record, &run(acc), SequenceVariant::Pattern).unwrap();
        }
        record
    }

    fn runs(record: &SequenceProgress) -> u32 {
        match &record.track {
            SequenceTrack::Pattern(p) => p.consecutive_correct_runs,
            _ => panic!("expected pattern track"),
        }
    }

    #[test]
    fn test_five_perfect_runs_master_the_pattern() {
        let record = practice(&[1.0; 5]);
        assert_eq!(runs(&record), 5);
        assert_eq!(record.average_accuracy, 1.0);
        assert_eq!(record.mastery_level, MasteryLevel::Mastered);
        assert_eq!(record.total_practice_time_seconds, 300.0);
        // 30 days * 1.5
        assert_eq!(record.next_review_date(), Some(t0() + Duration::days(45)));
    }

    #[test]
    fn test_poor_sixth_run_drops_to_familiar() {
        let record = practice(&[1.0, 1.0, 1.0, 1.0, 1.0, 0.5]);
        assert_eq!(runs(&record), 0);
        assert!((record.average_accuracy - 5.5 / 6.0).abs() < 1e-12);
        assert_eq!(record.mastery_level, MasteryLevel::Familiar);
        assert_eq!(record.best_run_accuracy, 1.0);
    }

    #[test]
    fn test_correct_run_threshold_is_inclusive() {
        let record = practice(&[0.9]);
        assert_eq!(runs(&record), 1);
        let record = practice(&[0.89]);
        assert_eq!(runs(&record), 0);
    }

    #[test]
    fn test_runs_alone_do_not_master() {
        // Five good runs, but the early misses keep the average below 0.95.
        let record = practice(&[0.2, 0.2, 0.9, 0.9, 0.9, 0.9, 0.9]);
        assert_eq!(runs(&record), 5);
        assert!(record.average_accuracy < 0.95);
        assert_ne!(record.mastery_level, MasteryLevel::Mastered);
    }

    #[test]
    fn test_average_alone_does_not_master() {
        assert_eq!(PatternPolicy::mastery_level(4, 1.0, 20), MasteryLevel::Proficient);
        assert_eq!(PatternPolicy::mastery_level(2, 1.0, 20), MasteryLevel::Familiar);
    }

    #[test]
    fn test_familiar_needs_three_practices() {
        assert_eq!(PatternPolicy::mastery_level(0, 0.8, 2), MasteryLevel::Learning);
        assert_eq!(PatternPolicy::mastery_level(0, 0.8, 3), MasteryLevel::Familiar);
        assert_eq!(PatternPolicy::mastery_level(0, 0.69, 3), MasteryLevel::Learning);
    }

    #[test]
    fn test_multiplier_floor_shortens_learning_interval() {
        assert_eq!(PatternPolicy::performance_multiplier(0.2), 0.5);
        let record = practice(&[0.2]);
        assert_eq!(record.mastery_level, MasteryLevel::Learning);
        assert_eq!(record.next_review_date(), Some(t0() + Duration::hours(12)));
    }

    #[test]
    fn test_multiplier_floor_applies_to_mastered_level() {
        // Not reachable from real runs, the interval rule itself does not guard it.
        let interval = PatternPolicy::review_interval(MasteryLevel::Mastered, 0.1);
        assert_eq!(interval, Duration::days(15));
    }

    #[test]
    fn test_multiplier_ceiling_unreachable_for_valid_accuracy() {
        assert_eq!(PatternPolicy::performance_multiplier(1.0), 1.5);
        assert_eq!(PatternPolicy::performance_multiplier(2.0), 2.0);
    }

    #[test]
    fn test_interval_keyed_by_new_level() {
        let record = practice(&[0.9, 0.9, 0.9]);
        assert_eq!(record.mastery_level, MasteryLevel::Proficient);
        let expected =
            PatternPolicy::review_interval(MasteryLevel::Proficient, record.average_accuracy);
        assert_eq!(record.next_review_date(), Some(t0() + expected));
    }
}
