//! Per-run state machine:
//! `Pending → Running(1) → … → Running(n) → Completed`, or `Running(k) → Failed(k)`.

use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info};

use crate::generation::FailureKind;
use crate::pipeline::stages::StageKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Pending,
    /// `position` is 1-based.
    Running { position: usize, stage: StageKind },
    Completed,
    Failed {
        position: usize,
        stage: StageKind,
        reason: FailureKind,
    },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed { .. })
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: &RunState) -> bool {
        match (self, next) {
            (RunState::Pending, RunState::Running { position: 1, .. }) => true,
            (RunState::Running { position: a, .. }, RunState::Running { position: b, .. }) => *b == a + 1,
            (RunState::Running { position: a, stage: s }, RunState::Failed { position: b, stage: t, .. }) => {
                a == b && s == t
            }
            (RunState::Running { .. }, RunState::Completed) => true,
            // A pipeline whose stages were all skipped still completes.
            (RunState::Pending, RunState::Completed) => true,
            _ => false,
        }
    }
}

/// Tracks one run's state and mirrors it to an optional progress channel.
pub(crate) struct RunTracker<'a> {
    state: RunState,
    progress: Option<&'a watch::Sender<RunState>>,
}

impl<'a> RunTracker<'a> {
    pub(crate) fn new(progress: Option<&'a watch::Sender<RunState>>) -> Self {
        let tracker = Self {
            state: RunState::Pending,
            progress,
        };
        tracker.publish();
        tracker
    }

    pub(crate) fn state(&self) -> RunState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_advance_to(&next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        match next {
            RunState::Running { position, stage } => info!("Stage {} ({}) running", position, stage),
            RunState::Completed => info!("Pipeline completed"),
            RunState::Failed {
                position,
                stage,
                reason,
            } => error!("Stage {} ({}) failed: {}", position, stage, reason),
            RunState::Pending => {}
        }
        self.state = next;
        self.publish();
    }

    fn publish(&self) {
        if let Some(tx) = self.progress {
            tx.send_replace(self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(position: usize, stage: StageKind) -> RunState {
        RunState::Running { position, stage }
    }

    #[test]
    fn test_legal_transitions() {
        let s1 = running(1, StageKind::ResumeAnalysis);
        let s2 = running(2, StageKind::JobSearch);
        assert!(RunState::Pending.can_advance_to(&s1));
        assert!(s1.can_advance_to(&s2));
        assert!(s2.can_advance_to(&RunState::Completed));
        assert!(s1.can_advance_to(&RunState::Failed {
            position: 1,
            stage: StageKind::ResumeAnalysis,
            reason: FailureKind::SchemaValidationFailure,
        }));
    }

    #[test]
    fn test_illegal_transitions() {
        let s1 = running(1, StageKind::ResumeAnalysis);
        assert!(!RunState::Pending.can_advance_to(&running(2, StageKind::JobSearch)));
        assert!(!s1.can_advance_to(&running(3, StageKind::ApplicationEmails)));
        assert!(!RunState::Completed.can_advance_to(&s1));
        assert!(!s1.can_advance_to(&RunState::Failed {
            position: 2,
            stage: StageKind::JobSearch,
            reason: FailureKind::GenerationFailure,
        }));
    }

    #[test]
    fn test_terminal_states() {
        assert!(RunState::Completed.is_terminal());
        assert!(!RunState::Pending.is_terminal());
        assert!(!running(1, StageKind::ResumeAnalysis).is_terminal());
    }

    #[test]
    fn test_tracker_publishes_to_progress_channel() {
        let (tx, rx) = watch::channel(RunState::Completed);
        let mut tracker = RunTracker::new(Some(&tx));
        assert_eq!(*rx.borrow(), RunState::Pending);
        tracker.advance(running(1, StageKind::ResumeAnalysis));
        assert_eq!(*rx.borrow(), running(1, StageKind::ResumeAnalysis));
        assert_eq!(tracker.state(), running(1, StageKind::ResumeAnalysis));
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let json = serde_json::to_value(RunState::Failed {
            position: 1,
            stage: StageKind::ResumeAnalysis,
            reason: FailureKind::SchemaValidationFailure,
        })
        .unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["stage"], "resume_analysis");
        assert_eq!(json["reason"], "SchemaValidationFailure");
    }
}
