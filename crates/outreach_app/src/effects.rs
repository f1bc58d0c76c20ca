use std::io;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use outreach_core::{Effect, Msg};
use outreach_engine::{EngineEvent, EngineHandle};
use outreach_logging::{outreach_debug, outreach_warn};

/// Hands core effects to the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            outreach_debug!("Executing {effect:?}");
            self.engine.execute(effect);
        }
    }

    /// Waits up to `timeout` for the next engine event. Fails once the engine
    /// thread has gone away.
    pub fn next_msg(&self, timeout: Duration) -> io::Result<Option<Msg>> {
        let event = match self.engine.recv_timeout(timeout) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => return Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "engine stopped before the run settled",
                ))
            }
        };
        if let EngineEvent::Failed { session_id, error } = &event {
            outreach_warn!("Session {session_id} failed: {error}");
        }
        Ok(Some(event.into_msg()))
    }
}
