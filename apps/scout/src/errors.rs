use thiserror::Error;

use crate::generation::{FailureKind, GenerationError};
use crate::pipeline::{RunState, StageKind};

/// Crate-level error type returned by the pipeline.
/// Retrieval failures never reach this type; they degrade inside the stage.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Resume text is unusable: {0}")]
    ExtractionInput(String),

    #[error("Stage {position} ({stage}) failed: {source}")]
    StageFailed {
        stage: StageKind,
        position: usize,
        #[source]
        source: GenerationError,
    },

    #[error("Invalid pipeline definition: {0}")]
    InvalidPipeline(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ScoutError {
    /// Failure classification of a stage error; `None` for errors raised outside a stage.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ScoutError::StageFailed { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    pub fn failed_stage(&self) -> Option<(usize, StageKind)> {
        match self {
            ScoutError::StageFailed { stage, position, .. } => Some((*position, *stage)),
            _ => None,
        }
    }

    /// Terminal run state corresponding to this error, when it came from a stage.
    pub fn run_state(&self) -> Option<RunState> {
        match self {
            ScoutError::StageFailed {
                stage,
                position,
                source,
            } => Some(RunState::Failed {
                position: *position,
                stage: *stage,
                reason: source.kind(),
            }),
            _ => None,
        }
    }
}
