//! Input Sanitization
//!
//! 输入校验：所有进入调度器与追踪器的数值都必须有限且在范围内。
//!
//! Functions:
//! - Non-negative duration checks
//! - Unit-interval accuracy checks
//! - Record shape checks (Leitner box, step counts)
//! - Overflow-checked counter increments

use crate::error::{ProgressError, ProgressResult};
use crate::types::{AtomicItemProgress, MAX_BOX, MIN_BOX};

/// 检查数值是否为 NaN 或 Inf
pub fn is_invalid_value(x: f64) -> bool {
    x.is_nan() || x.is_infinite()
}

/// 校验时长类输入 (秒)，必须有限且非负
pub fn ensure_non_negative_seconds(field: &'static str, value: f64) -> ProgressResult<f64> {
    if is_invalid_value(value) {
        return Err(ProgressError::invalid(field, format!("{value} is not a finite number")));
    }
    if value < 0.0 {
        return Err(ProgressError::invalid(field, format!("{value} is negative")));
    }
    Ok(value)
}

/// 校验准确率，必须位于 [0, 1]
pub fn ensure_unit_interval(field: &'static str, value: f64) -> ProgressResult<f64> {
    if is_invalid_value(value) {
        return Err(ProgressError::invalid(field, format!("{value} is not a finite number")));
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ProgressError::invalid(field, format!("{value} is outside [0, 1]")));
    }
    Ok(value)
}

/// 计数器加一，溢出视为损坏的记录
pub fn increment_count(field: &'static str, value: u32) -> ProgressResult<u32> {
    value
        .checked_add(1)
        .ok_or_else(|| ProgressError::invalid(field, format!("{value} cannot be incremented")))
}

/// 校验 Leitner 记录的不变量
pub fn ensure_atomic_record(record: &AtomicItemProgress) -> ProgressResult<()> {
    if !(MIN_BOX..=MAX_BOX).contains(&record.leitner_box) {
        return Err(ProgressError::invalid(
            "box",
            format!("{} is outside {MIN_BOX}..={MAX_BOX}", record.leitner_box),
        ));
    }
    let answered = record.correct_count.checked_add(record.incorrect_count);
    if answered != Some(record.total_reviews) {
        return Err(ProgressError::invalid(
            "totalReviews",
            format!(
                "{} does not equal correct {} + incorrect {}",
                record.total_reviews, record.correct_count, record.incorrect_count
            ),
        ));
    }
    Ok(())
}

/// 校验步数：总步数必须为正，单次完成步数不得超过总步数
pub fn ensure_step_counts(total_steps: u32, steps_this_run: Option<u32>) -> ProgressResult<()> {
    if total_steps == 0 {
        return Err(ProgressError::invalid("totalSteps", "a sequence needs at least one step"));
    }
    if let Some(steps) = steps_this_run {
        if steps > total_steps {
            return Err(ProgressError::invalid(
                "stepsCompleted",
                format!("{steps} exceeds the sequence's {total_steps} steps"),
            ));
        }
    }
    Ok(())
}
