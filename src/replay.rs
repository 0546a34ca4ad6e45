//! JSON-lines event replay
//!
//! Feeds a recorded stream of progress events through a [`ProgressEngine`] and
//! writes one JSON result per event. Handy for auditing how a learner's records
//! evolved; nothing is persisted beyond the engine's store.

use std::io::{BufRead, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{EngineError, ProgressEngine, SequenceSetup};
use crate::store::ProgressStore;
use crate::types::{
    AdvancementSnapshot, AtomicItemProgress, LearnerActivityState, PracticeRun, SequenceProgress,
    SequenceVariant,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ReplayEvent {
    CreateProfile {
        learner_id: String,
        at: DateTime<Utc>,
    },
    Activity {
        learner_id: String,
        study_time_seconds: f64,
        at: DateTime<Utc>,
    },
    Answer {
        learner_id: String,
        item_id: String,
        correct: bool,
        response_time_seconds: f64,
        at: DateTime<Utc>,
    },
    BeginSequence {
        learner_id: String,
        sequence_id: String,
        variant: SequenceVariant,
        #[serde(default)]
        total_steps: Option<u32>,
        at: DateTime<Utc>,
    },
    Run {
        learner_id: String,
        sequence_id: String,
        variant: SequenceVariant,
        accuracy: f64,
        duration_seconds: f64,
        #[serde(default)]
        steps_completed: Option<u32>,
        at: DateTime<Utc>,
    },
    Evaluate {
        learner_id: String,
        item_ids: Vec<String>,
        sequence_ids: Vec<String>,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "camelCase")]
pub enum ReplayOutput {
    Activity(LearnerActivityState),
    Term(AtomicItemProgress),
    Sequence(SequenceProgress),
    Advancement(AdvancementSnapshot),
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sparring sequence {0} needs totalSteps")]
    MissingTotalSteps(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Counts from one replay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
    pub malformed: usize,
}

pub fn apply_event<S: ProgressStore>(
    engine: &ProgressEngine<S>,
    event: ReplayEvent,
) -> Result<ReplayOutput, ReplayError> {
    let output = match event {
        ReplayEvent::CreateProfile { learner_id, at } => {
            ReplayOutput::Activity(engine.create_profile(&learner_id, at)?)
        }
        ReplayEvent::Activity {
            learner_id,
            study_time_seconds,
            at,
        } => ReplayOutput::Activity(engine.record_activity(&learner_id, study_time_seconds, at)?),
        ReplayEvent::Answer {
            learner_id,
            item_id,
            correct,
            response_time_seconds,
            at,
        } => ReplayOutput::Term(engine.answer(
            &learner_id,
            &item_id,
            correct,
            response_time_seconds,
            at,
        )?),
        ReplayEvent::BeginSequence {
            learner_id,
            sequence_id,
            variant,
            total_steps,
            at,
        } => {
            let setup = match variant {
                SequenceVariant::Pattern => SequenceSetup::Pattern,
                SequenceVariant::SparringSequence => SequenceSetup::Sparring {
                    total_steps: total_steps
                        .ok_or_else(|| ReplayError::MissingTotalSteps(sequence_id.clone()))?,
                },
            };
            ReplayOutput::Sequence(engine.begin_sequence(&learner_id, &sequence_id, setup, at)?)
        }
        ReplayEvent::Run {
            learner_id,
            sequence_id,
            variant,
            accuracy,
            duration_seconds,
            steps_completed,
            at,
        } => {
            let run = PracticeRun {
                accuracy,
                duration_seconds,
                steps_completed,
                completed_at: at,
            };
            ReplayOutput::Sequence(engine.complete_run(&learner_id, &sequence_id, variant, &run)?)
        }
        ReplayEvent::Evaluate {
            learner_id,
            item_ids,
            sequence_ids,
            at,
        } => ReplayOutput::Advancement(engine.evaluate_advancement(
            &learner_id,
            &item_ids,
            &sequence_ids,
            at,
        )?),
    };
    Ok(output)
}

/// Replay every line of `input`, writing results to `output`.
///
/// Malformed lines and rejected events are logged and counted; only I/O
/// failures abort the pass. Blank lines and `#` comments are skipped.
pub fn replay<S, R, W>(
    engine: &ProgressEngine<S>,
    input: R,
    mut output: W,
) -> Result<ReplaySummary, ReplayError>
where
    S: ProgressStore,
    R: BufRead,
    W: Write,
{
    let mut summary = ReplaySummary::default();

    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let event: ReplayEvent = match serde_json::from_str(trimmed) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(line = line_no, error = %err, "malformed event");
                summary.malformed += 1;
                continue;
            }
        };

        match apply_event(engine, event) {
            Ok(result) => {
                serde_json::to_writer(&mut output, &result)?;
                output.write_all(b"\n")?;
                summary.applied += 1;
            }
            Err(err) => {
                tracing::warn!(line = line_no, error = %err, "event rejected");
                summary.rejected += 1;
            }
        }
    }

    output.flush()?;
    Ok(summary)
}
