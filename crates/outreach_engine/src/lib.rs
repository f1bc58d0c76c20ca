//! Outreach engine: event-stream sessions, company lookup and effect execution.
mod decode;
mod engine;
mod lookup;
mod session;
mod slot;
mod transport;
mod types;

pub use decode::{decode_event, DecodeError};
pub use engine::{EngineHandle, EngineOptions};
pub use lookup::{
    CompanyLookup, LookupDebouncer, LookupError, LookupSettings, ReqwestLookup,
    DEFAULT_LOOKUP_ENDPOINT,
};
pub use session::{SessionHandle, SessionObserver, StreamSession};
pub use slot::SessionSlot;
pub use transport::{
    stream_url, EventStream, EventTransport, ReqwestTransport, StreamSettings,
    DEFAULT_STREAM_ENDPOINT,
};
pub use types::{ConnectionError, EngineEvent, FailureKind, StageEvent, WireEvent};
