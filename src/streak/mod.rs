//! Daily Streak Calculator
//!
//! Calendar days are taken in the time zone of the `now` passed in, so the
//! caller decides where midnight falls. `last_active_at` is stored in UTC and
//! converted into that zone before comparing.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::ProgressResult;
use crate::sanitize::{ensure_non_negative_seconds, increment_count};
use crate::types::LearnerActivityState;

/// Apply one activity event and return the updated learner state.
///
/// A zero-duration event on a fresh profile (creation, profile switch) only
/// stamps `last_active_at`; the streak starts with the first real study time.
pub fn record_activity<Tz: TimeZone>(
    state: &LearnerActivityState,
    study_time_seconds: f64,
    now: DateTime<Tz>,
) -> ProgressResult<LearnerActivityState> {
    ensure_non_negative_seconds("studyTimeSeconds", study_time_seconds)?;

    let mut next = state.clone();
    next.total_study_time_seconds += study_time_seconds;

    let today = now.date_naive();
    let last_active_day = state.last_active_at.with_timezone(&now.timezone()).date_naive();

    if state.streak_days == 0 {
        if study_time_seconds > 0.0 {
            next.streak_days = 1;
        }
    } else {
        let days_since_active = (today - last_active_day).num_days();
        if days_since_active < 0 {
            tracing::warn!(
                learner_id = %state.learner_id,
                days_since_active,
                "activity is earlier than the last recorded one, streak left unchanged"
            );
        } else if days_since_active == 1 {
            next.streak_days = increment_count("streakDays", next.streak_days)?;
        } else if days_since_active > 1 {
            tracing::debug!(
                learner_id = %state.learner_id,
                previous_streak = state.streak_days,
                days_since_active,
                "activity gap resets streak"
            );
            next.streak_days = 1;
        }
    }

    next.last_active_at = now.with_timezone(&Utc);
    Ok(next)
}
