use std::fmt;

use outreach_core::{Company, Msg, SessionId, Side, Stage, StageResult};

/// One named event as framed on the wire, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireEvent {
    pub name: String,
    pub data: String,
}

impl WireEvent {
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// A decoded stage completion ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEvent {
    pub stage: Stage,
    pub result: StageResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Stage {
        session_id: SessionId,
        stage: Stage,
        result: StageResult,
    },
    /// The connection failed before the terminal stage; the session is closed.
    Failed {
        session_id: SessionId,
        error: String,
    },
    /// The terminal stage arrived and the connection was released.
    Finished { session_id: SessionId },
    LookupCompleted {
        side: Side,
        query: String,
        companies: Vec<Company>,
    },
}

impl EngineEvent {
    /// The core message this event feeds into `outreach_core::update`.
    pub fn into_msg(self) -> Msg {
        match self {
            EngineEvent::Stage {
                session_id,
                stage,
                result,
            } => Msg::StageCompleted {
                session_id,
                stage,
                result,
            },
            EngineEvent::Failed { session_id, error } => Msg::StreamFailed {
                session_id,
                message: error,
            },
            EngineEvent::Finished { session_id } => Msg::StreamFinished { session_id },
            EngineEvent::LookupCompleted {
                side,
                query,
                companies,
            } => Msg::LookupCompleted {
                side,
                query,
                companies,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionError {
    pub kind: FailureKind,
    pub message: String,
}

impl ConnectionError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ConnectionError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    UnsupportedContentType { content_type: String },
    Timeout,
    IdleTimeout,
    Network,
    MalformedFrame,
    /// Server closed the stream before the terminal stage.
    EndedEarly,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::IdleTimeout => write!(f, "no events within idle timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::MalformedFrame => write!(f, "malformed event frame"),
            FailureKind::EndedEarly => write!(f, "stream ended before final stage"),
        }
    }
}
