use outreach_logging::{outreach_debug, outreach_warn};

use crate::{Stage, StageResult};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StageStatus {
    #[default]
    Pending,
    Complete(StageResult),
}

impl StageStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, StageStatus::Complete(_))
    }

    pub fn result(&self) -> Option<&StageResult> {
        match self {
            StageStatus::Complete(result) => Some(result),
            StageStatus::Pending => None,
        }
    }
}

/// What `ProgressState::try_record` did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// First write wins; the later payload was discarded.
    AlreadyComplete,
    /// The payload shape does not belong to the stage.
    Mismatched,
}

/// Immutable read of per-stage completion and payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    stages: [StageStatus; 3],
}

impl ProgressSnapshot {
    pub fn status(&self, stage: Stage) -> &StageStatus {
        &self.stages[stage.index()]
    }

    pub fn is_stage_complete(&self, stage: Stage) -> bool {
        self.status(stage).is_complete()
    }

    pub fn completed_count(&self) -> usize {
        self.stages.iter().filter(|s| s.is_complete()).count()
    }

    /// All three stages have completed.
    pub fn is_complete(&self) -> bool {
        self.completed_count() == Stage::ALL.len()
    }

    pub fn summary(&self, stage: Stage) -> Option<&str> {
        self.status(stage).result().and_then(StageResult::as_summary)
    }

    pub fn emails(&self) -> Option<&[String]> {
        self.status(Stage::Emails)
            .result()
            .and_then(StageResult::as_emails)
    }

    /// Stages in declared order with their status.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &StageStatus)> {
        Stage::ALL.into_iter().zip(self.stages.iter())
    }
}

/// Monotonic accumulator of stage results for one session.
///
/// A stage moves from pending to complete exactly once and never changes
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressState {
    current: ProgressSnapshot,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `stage` complete with `result` and returns the updated snapshot.
    /// Duplicates and mismatched payloads leave the state untouched.
    pub fn record(&mut self, stage: Stage, result: StageResult) -> ProgressSnapshot {
        self.try_record(stage, result);
        self.snapshot()
    }

    pub fn try_record(&mut self, stage: Stage, result: StageResult) -> RecordOutcome {
        if !result.fits(stage) {
            outreach_warn!("Ignoring {stage} update with mismatched payload");
            return RecordOutcome::Mismatched;
        }
        let slot = &mut self.current.stages[stage.index()];
        if slot.is_complete() {
            outreach_warn!("Ignoring duplicate {stage} update; stage already complete");
            return RecordOutcome::AlreadyComplete;
        }
        outreach_debug!("Stage {stage} complete");
        *slot = StageStatus::Complete(result);
        RecordOutcome::Recorded
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.current.clone()
    }

    pub fn is_stage_complete(&self, stage: Stage) -> bool {
        self.current.is_stage_complete(stage)
    }
}
