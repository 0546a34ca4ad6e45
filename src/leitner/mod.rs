//! Leitner Review Scheduler
//!
//! Moves a terminology item between five boxes:
//! - a correct answer promotes one box (capped at 5)
//! - an incorrect answer sends the item back to box 1 and resets mastery
//!
//! The review date is a pure function of the box, see [`BOX_INTERVAL_DAYS`].

use chrono::{DateTime, Duration, Utc};

use crate::error::ProgressResult;
use crate::sanitize::{ensure_atomic_record, ensure_non_negative_seconds, increment_count};
use crate::types::{AtomicItemProgress, MasteryLevel, BOX_INTERVAL_DAYS, MAX_BOX, MIN_BOX};

/// Fixed review interval for a box
pub fn box_interval(leitner_box: u8) -> Duration {
    let idx = leitner_box.clamp(MIN_BOX, MAX_BOX) as usize - 1;
    Duration::days(BOX_INTERVAL_DAYS[idx])
}

/// Apply one answer to a terminology record and return the updated record.
///
/// Update order matters for the running mean: the review counter is bumped
/// first and the mean is taken against the new count.
pub fn record_answer(
    record: &AtomicItemProgress,
    is_correct: bool,
    response_time_seconds: f64,
    now: DateTime<Utc>,
) -> ProgressResult<AtomicItemProgress> {
    ensure_non_negative_seconds("responseTimeSeconds", response_time_seconds)?;
    ensure_atomic_record(record)?;

    let mut next = record.clone();

    next.total_reviews = increment_count("totalReviews", next.total_reviews)?;
    next.last_reviewed_at = Some(now);

    let n = next.total_reviews as f64;
    next.average_response_time_seconds =
        (next.average_response_time_seconds * (n - 1.0) + response_time_seconds) / n;

    if is_correct {
        next.correct_count = increment_count("correctCount", next.correct_count)?;
        next.consecutive_correct =
            increment_count("consecutiveCorrect", next.consecutive_correct)?;
        next.leitner_box = (next.leitner_box + 1).min(MAX_BOX);
        next.mastery_level = MasteryLevel::from_consecutive_correct(next.consecutive_correct);
    } else {
        if record.mastery_level > MasteryLevel::Learning || record.leitner_box > MIN_BOX {
            tracing::debug!(
                item_id = %record.item_id,
                from_box = record.leitner_box,
                from_level = %record.mastery_level,
                "incorrect answer resets item to box 1"
            );
        }
        next.incorrect_count = increment_count("incorrectCount", next.incorrect_count)?;
        next.consecutive_correct = 0;
        next.leitner_box = MIN_BOX;
        next.mastery_level = MasteryLevel::Learning;
    }

    next.next_review_date = now + box_interval(next.leitner_box);

    Ok(next)
}

/// Records due at `now`, earliest review date first, lower box first on ties
pub fn due_items<'a, I>(records: I, now: DateTime<Utc>) -> Vec<&'a AtomicItemProgress>
where
    I: IntoIterator<Item = &'a AtomicItemProgress>,
{
    let mut due: Vec<&AtomicItemProgress> =
        records.into_iter().filter(|r| r.is_due(now)).collect();
    due.sort_by(|a, b| {
        a.next_review_date
            .cmp(&b.next_review_date)
            .then(a.leitner_box.cmp(&b.leitner_box))
    });
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 18, 30, 0).unwrap()
    }

    fn fresh() -> AtomicItemProgress {
        AtomicItemProgress::new("learner-1", "charyot", t0())
    }

    fn answer_n(mut record: AtomicItemProgress, n: usize, correct: bool) -> AtomicItemProgress {
        for _ in 0..n {
            record = record_answer(&record, correct, 2.0, t0()).unwrap();
        }
        record
    }

    #[test]
    fn test_interval_ladder() {
        assert_eq!(box_interval(1), Duration::days(1));
        assert_eq!(box_interval(2), Duration::days(3));
        assert_eq!(box_interval(3), Duration::days(7));
        assert_eq!(box_interval(4), Duration::days(14));
        assert_eq!(box_interval(5), Duration::days(30));
    }

    #[test]
    fn test_first_correct_answer() {
        let next = record_answer(&fresh(), true, 3.5, t0()).unwrap();
        assert_eq!(next.total_reviews, 1);
        assert_eq!(next.correct_count, 1);
        assert_eq!(next.incorrect_count, 0);
        assert_eq!(next.consecutive_correct, 1);
        assert_eq!(next.leitner_box, 2);
        assert_eq!(next.average_response_time_seconds, 3.5);
        assert_eq!(next.last_reviewed_at, Some(t0()));
        assert_eq!(next.next_review_date, t0() + Duration::days(3));
        assert_eq!(next.mastery_level, MasteryLevel::Learning);
    }

    #[test]
    fn test_input_record_is_not_mutated() {
        let record = fresh();
        let _ = record_answer(&record, true, 1.0, t0()).unwrap();
        assert_eq!(record, fresh());
    }

    #[test]
    fn test_full_leitner_cycle() {
        let mut record = fresh();
        for i in 1..=10u32 {
            record = record_answer(&record, true, 2.0, t0()).unwrap();
            if i < 10 {
                assert_ne!(record.mastery_level, MasteryLevel::Mastered, "answer {i}");
            }
        }
        assert_eq!(record.leitner_box, 5);
        assert_eq!(record.consecutive_correct, 10);
        assert_eq!(record.mastery_level, MasteryLevel::Mastered);

        let record = record_answer(&record, false, 2.0, t0()).unwrap();
        assert_eq!(record.leitner_box, 1);
        assert_eq!(record.mastery_level, MasteryLevel::Learning);
        assert_eq!(record.consecutive_correct, 0);
        assert_eq!(record.correct_count, 10);
        assert_eq!(record.incorrect_count, 1);
        assert_eq!(record.total_reviews, 11);
        assert_eq!(record.next_review_date, t0() + Duration::days(1));
    }

    #[test]
    fn test_mastery_progression_through_brackets() {
        let record = answer_n(fresh(), 3, true);
        assert_eq!(record.mastery_level, MasteryLevel::Familiar);
        let record = answer_n(record, 3, true);
        assert_eq!(record.mastery_level, MasteryLevel::Proficient);
        let record = answer_n(record, 4, true);
        assert_eq!(record.mastery_level, MasteryLevel::Mastered);
    }

    #[test]
    fn test_box_caps_at_five() {
        let record = answer_n(fresh(), 12, true);
        assert_eq!(record.leitner_box, 5);
        assert_eq!(record.next_review_date, t0() + Duration::days(30));
    }

    #[test]
    fn test_incorrect_from_box_one_stays_in_box_one() {
        let next = record_answer(&fresh(), false, 4.0, t0()).unwrap();
        assert_eq!(next.leitner_box, 1);
        assert_eq!(next.incorrect_count, 1);
        assert_eq!(next.mastery_level, MasteryLevel::Learning);
    }

    #[test]
    fn test_running_mean_of_response_times() {
        let mut record = fresh();
        for (i, rt) in [2.0, 4.0, 9.0].into_iter().enumerate() {
            record = record_answer(&record, i % 2 == 0, rt, t0()).unwrap();
        }
        assert!((record.average_response_time_seconds - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_negative_response_time() {
        let err = record_answer(&fresh(), true, -1.0, t0()).unwrap_err();
        assert_eq!(err.field(), "responseTimeSeconds");
    }

    #[test]
    fn test_rejects_out_of_range_box() {
        let mut record = fresh();
        record.leitner_box = 9;
        assert!(record_answer(&record, true, 1.0, t0()).is_err());
    }

    #[test]
    fn test_rejects_exhausted_review_counter() {
        let mut record = fresh();
        record.total_reviews = u32::MAX;
        record.incorrect_count = u32::MAX;
        let err = record_answer(&record, false, 1.0, t0()).unwrap_err();
        assert_eq!(err.field(), "totalReviews");
    }

    #[test]
    fn test_due_items_ordering() {
        let now = t0();
        let mut early = AtomicItemProgress::new("l", "a", now - Duration::days(3));
        early.leitner_box = 3;
        let mut tie_low = AtomicItemProgress::new("l", "b", now - Duration::days(1));
        tie_low.leitner_box = 1;
        let mut tie_high = AtomicItemProgress::new("l", "c", now - Duration::days(1));
        tie_high.leitner_box = 2;
        let future =
            record_answer(&AtomicItemProgress::new("l", "d", now), true, 1.0, now).unwrap();

        let records = vec![tie_high.clone(), future, early.clone(), tie_low.clone()];
        let due = due_items(&records, now);
        let ids: Vec<&str> = due.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
