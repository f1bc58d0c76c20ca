use crate::{Company, ProgressSnapshot, SessionId, SessionKey, SessionPhase};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorView {
    pub query: String,
    pub results: Vec<Company>,
    pub selected: Option<Company>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub source: SelectorView,
    pub target: SelectorView,
    pub can_start: bool,
    pub phase: SessionPhase,
    pub session_id: Option<SessionId>,
    pub session_key: Option<SessionKey>,
    pub progress: ProgressSnapshot,
    pub dirty: bool,
}
