use crate::{SessionId, SessionKey, Side};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run a (debounced) company lookup; supersedes any pending one for `side`.
    Lookup { side: Side, query: String },
    /// Drop any pending lookup for `side`.
    CancelLookup { side: Side },
    OpenSession {
        session_id: SessionId,
        key: SessionKey,
    },
    CloseSession { session_id: SessionId },
}
