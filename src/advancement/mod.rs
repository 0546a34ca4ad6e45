//! Advancement Evaluator
//!
//! Aggregates a learner's progress for the current rank into an
//! [`AdvancementSnapshot`]. Only terminology and movement patterns gate
//! advancement; sparring mastery is reported elsewhere.
//!
//! The evaluator reads borrowed records and never mutates them.

use rayon::prelude::*;

use crate::types::{
    AdvancementSnapshot, AtomicItemProgress, MasteryLevel, SequenceProgress, SequenceVariant,
    ADVANCEMENT_MIN_MASTERED_PATTERNS, ADVANCEMENT_TERMINOLOGY_FRACTION,
};

/// Record count above which counting is spread across the rayon pool
const PARALLEL_THRESHOLD: usize = 4096;

pub fn is_eligible(terminology_mastery_fraction: f64, mastered_pattern_count: usize) -> bool {
    terminology_mastery_fraction >= ADVANCEMENT_TERMINOLOGY_FRACTION
        && mastered_pattern_count >= ADVANCEMENT_MIN_MASTERED_PATTERNS
}

pub fn evaluate(
    atomic_records: &[AtomicItemProgress],
    sequence_records: &[SequenceProgress],
) -> AdvancementSnapshot {
    let mastered_term_count = count_mastered_terms(atomic_records);
    let term_count = atomic_records.len();

    let terminology_mastery_fraction = if term_count == 0 {
        0.0
    } else {
        mastered_term_count as f64 / term_count as f64
    };

    let mastered_sequence_count = count_mastered_patterns(sequence_records);

    AdvancementSnapshot {
        terminology_mastery_fraction,
        mastered_sequence_count,
        eligible: is_eligible(terminology_mastery_fraction, mastered_sequence_count),
        mastered_term_count,
        term_count,
    }
}

fn count_mastered_terms(records: &[AtomicItemProgress]) -> usize {
    let mastered = |r: &&AtomicItemProgress| r.mastery_level == MasteryLevel::Mastered;
    if records.len() >= PARALLEL_THRESHOLD {
        records.par_iter().filter(mastered).count()
    } else {
        records.iter().filter(mastered).count()
    }
}

fn count_mastered_patterns(records: &[SequenceProgress]) -> usize {
    let mastered_pattern = |r: &&SequenceProgress| {
        r.variant() == SequenceVariant::Pattern && r.mastery_level == MasteryLevel::Mastered
    };
    if records.len() >= PARALLEL_THRESHOLD {
        records.par_iter().filter(mastered_pattern).count()
    } else {
        records.iter().filter(mastered_pattern).count()
    }
}
