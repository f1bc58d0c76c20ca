use crate::view_model::{AppViewModel, SelectorView};
use crate::{
    Company, ProgressState, RecordOutcome, SessionKey, Side, Stage, StageResult, MIN_QUERY_LEN,
};

pub type SessionId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Streaming,
    Complete,
    Failed {
        message: String,
    },
    Cancelled,
}

impl SessionPhase {
    pub fn is_live(&self) -> bool {
        matches!(self, SessionPhase::Streaming)
    }

    /// The run has ended one way or another.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            SessionPhase::Complete | SessionPhase::Failed { .. } | SessionPhase::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Selector {
    pub(crate) query: String,
    pub(crate) results: Vec<Company>,
    pub(crate) selected: Option<Company>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActiveSession {
    pub(crate) id: SessionId,
    pub(crate) key: SessionKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    source: Selector,
    target: Selector,
    min_query_len: usize,
    next_session_id: SessionId,
    session: Option<ActiveSession>,
    phase: SessionPhase,
    progress: ProgressState,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_min_query_len(MIN_QUERY_LEN)
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_query_len(min_query_len: usize) -> Self {
        Self {
            source: Selector::default(),
            target: Selector::default(),
            min_query_len,
            next_session_id: 1,
            session: None,
            phase: SessionPhase::Idle,
            progress: ProgressState::new(),
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            source: selector_view(&self.source),
            target: selector_view(&self.target),
            can_start: self.source.selected.is_some() && self.target.selected.is_some(),
            phase: self.phase.clone(),
            session_id: self.session.as_ref().map(|s| s.id),
            session_key: self.session.as_ref().map(|s| s.key.clone()),
            progress: self.progress.snapshot(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn min_query_len(&self) -> usize {
        self.min_query_len
    }

    pub(crate) fn selector(&self, side: Side) -> &Selector {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    pub(crate) fn selector_mut(&mut self, side: Side) -> &mut Selector {
        match side {
            Side::Source => &mut self.source,
            Side::Target => &mut self.target,
        }
    }

    /// Key derived from the two selected companies' domains, if both are picked.
    pub(crate) fn selected_domains(&self) -> Option<(String, String)> {
        let source = self.source.selected.as_ref()?;
        let target = self.target.selected.as_ref()?;
        Some((source.domain.clone(), target.domain.clone()))
    }

    /// Id of the session that is currently streaming, if any.
    pub(crate) fn live_session(&self) -> Option<&ActiveSession> {
        if self.phase.is_live() {
            self.session.as_ref()
        } else {
            None
        }
    }

    /// Starts a fresh session. Progress from any previous session is discarded.
    pub(crate) fn begin_session(&mut self, key: SessionKey) -> SessionId {
        let id = self.next_session_id;
        self.next_session_id += 1;
        self.session = Some(ActiveSession { id, key });
        self.progress = ProgressState::new();
        self.phase = SessionPhase::Streaming;
        self.dirty = true;
        id
    }

    pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.dirty = true;
        }
    }

    pub(crate) fn apply_stage(&mut self, stage: Stage, result: StageResult) -> RecordOutcome {
        let outcome = self.progress.try_record(stage, result);
        if outcome == RecordOutcome::Recorded {
            self.dirty = true;
        }
        outcome
    }
}

fn selector_view(selector: &Selector) -> SelectorView {
    SelectorView {
        query: selector.query.clone(),
        results: selector.results.clone(),
        selected: selector.selected.clone(),
    }
}
