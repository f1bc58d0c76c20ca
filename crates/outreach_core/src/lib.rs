//! Outreach core: pure stage/progress model and the caller-side state machine.
mod company;
mod effect;
mod key;
mod msg;
mod progress;
mod stage;
mod state;
mod update;
mod view_model;

pub use company::{lookup_query, Company, Side, MIN_QUERY_LEN};
pub use effect::Effect;
pub use key::{InvalidKeyError, KeyPart, SessionKey};
pub use msg::Msg;
pub use progress::{ProgressSnapshot, ProgressState, RecordOutcome, StageStatus};
pub use stage::{Stage, StageResult};
pub use state::{AppState, SessionId, SessionPhase};
pub use update::update;
pub use view_model::{AppViewModel, SelectorView};
