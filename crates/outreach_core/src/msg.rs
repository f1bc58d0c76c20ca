use crate::{Company, SessionId, Side, Stage, StageResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited a company search box (raw text, not yet debounced).
    QueryChanged { side: Side, query: String },
    /// Lookup results for a previously issued query.
    LookupCompleted {
        side: Side,
        query: String,
        companies: Vec<Company>,
    },
    /// User picked a company from the result list.
    CompanySelected { side: Side, company: Company },
    /// User cleared a picked company.
    SelectionCleared { side: Side },
    /// User asked for the outreach run for the two selected companies.
    StartClicked,
    /// User navigated away or aborted the run.
    CancelClicked,
    /// Engine decoded a stage event for a session.
    StageCompleted {
        session_id: SessionId,
        stage: Stage,
        result: StageResult,
    },
    /// Engine lost the connection before the terminal stage.
    StreamFailed {
        session_id: SessionId,
        message: String,
    },
    /// Engine released the connection after the terminal stage.
    StreamFinished { session_id: SessionId },
    /// Fallback for placeholder wiring.
    NoOp,
}
