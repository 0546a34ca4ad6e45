//! Step-sparring mastery.
//!
//! A sparring sequence is walked through a fixed number of steps. Mastery is
//! about reaching the end and repeating the full sequence, so it is keyed on the
//! completion rate and the practice count. There is no review date.

use super::SequenceProgressPolicy;
use crate::error::{ProgressError, ProgressResult};
use crate::sanitize::ensure_step_counts;
use crate::types::{MasteryLevel, PracticeRun, SequenceProgress, SequenceTrack, SequenceVariant};

const MASTERED_MIN_PRACTICE: u32 = 10;
const PROFICIENT_MIN_PRACTICE: u32 = 5;
const FAMILIAR_MIN_COMPLETION: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default)]
pub struct SparringPolicy;

impl SparringPolicy {
    pub fn mastery_level(completion_rate: f64, practice_count: u32) -> MasteryLevel {
        if completion_rate >= 1.0 && practice_count >= MASTERED_MIN_PRACTICE {
            MasteryLevel::Mastered
        } else if completion_rate >= 1.0 && practice_count >= PROFICIENT_MIN_PRACTICE {
            MasteryLevel::Proficient
        } else if completion_rate >= FAMILIAR_MIN_COMPLETION {
            MasteryLevel::Familiar
        } else {
            MasteryLevel::Learning
        }
    }
}

impl SequenceProgressPolicy for SparringPolicy {
    fn variant(&self) -> SequenceVariant {
        SequenceVariant::SparringSequence
    }

    fn validate(&self, progress: &SequenceProgress, run: &PracticeRun) -> ProgressResult<()> {
        match &progress.track {
            SequenceTrack::SparringSequence(track) => {
                ensure_step_counts(track.total_steps, run.steps_completed)
            }
            _ => Err(ProgressError::invalid("variant", "sparring policy needs a sparring track")),
        }
    }

    fn apply(&self, progress: &mut SequenceProgress, run: &PracticeRun) -> ProgressResult<()> {
        let SequenceTrack::SparringSequence(track) = &mut progress.track else {
            return Err(ProgressError::invalid("variant", "sparring policy needs a sparring track"));
        };

        if let Some(steps) = run.steps_completed {
            track.steps_completed = track.steps_completed.max(steps);
        }
        track.current_step = if track.steps_completed < track.total_steps {
            track.steps_completed + 1
        } else {
            track.total_steps
        };

        progress.mastery_level =
            Self::mastery_level(track.completion_rate(), progress.practice_count);
        Ok(())
    }
}
