use std::sync::Arc;

use outreach_core::{SessionId, SessionKey};
use outreach_logging::outreach_debug;

use crate::{SessionHandle, SessionObserver, StreamSession};

/// Holds at most one live session for a caller.
///
/// Opening a new session always tears the previous one down first, so two
/// connections for the same caller can never overlap.
#[derive(Default)]
pub struct SessionSlot {
    current: Option<(SessionId, SessionHandle)>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(
        &mut self,
        session: &StreamSession,
        session_id: SessionId,
        key: SessionKey,
        observer: Arc<dyn SessionObserver>,
    ) -> &SessionHandle {
        self.close_current();
        let handle = session.open(key, observer);
        &self.current.insert((session_id, handle)).1
    }

    /// Closes the session tagged `session_id` if it is the current one.
    pub fn close(&mut self, session_id: SessionId) -> bool {
        match &self.current {
            Some((current, _)) if *current == session_id => {
                self.close_current();
                true
            }
            _ => {
                outreach_debug!("Close for unknown session {session_id} ignored");
                false
            }
        }
    }

    pub fn close_current(&mut self) {
        if let Some((_, handle)) = self.current.take() {
            handle.close();
        }
    }

    pub fn current_id(&self) -> Option<SessionId> {
        self.current.as_ref().map(|(id, _)| *id)
    }

    pub fn current_key(&self) -> Option<&SessionKey> {
        self.current.as_ref().map(|(_, handle)| handle.key())
    }

    /// A session is held and has not reached a closed state yet.
    pub fn is_live(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_closed())
    }
}
