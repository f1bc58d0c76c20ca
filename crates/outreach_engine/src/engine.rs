use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use outreach_core::{Effect, SessionId, SessionKey, Side, Stage, StageResult};
use outreach_logging::{outreach_error, outreach_info};

use crate::lookup::{CompanyLookup, LookupDebouncer, LookupSettings, ReqwestLookup};
use crate::transport::{EventTransport, ReqwestTransport, StreamSettings};
use crate::{ConnectionError, EngineEvent, SessionObserver, SessionSlot, StreamSession};

enum EngineCommand {
    Open { session_id: SessionId, key: SessionKey },
    Close { session_id: SessionId },
    Lookup { side: Side, query: String },
    CancelLookup { side: Side },
    Stop,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub idle_timeout: Option<Duration>,
    pub debounce: Duration,
}

/// Runs sessions and lookups on a background runtime; results come back as
/// [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(stream: StreamSettings, lookup: LookupSettings) -> Self {
        let options = EngineOptions {
            idle_timeout: stream.idle_timeout,
            debounce: lookup.debounce,
        };
        Self::with_backends(
            Arc::new(ReqwestTransport::new(stream)),
            Arc::new(ReqwestLookup::new(lookup)),
            options,
        )
    }

    pub fn with_backends(
        transport: Arc<dyn EventTransport>,
        lookup: Arc<dyn CompanyLookup>,
        options: EngineOptions,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    outreach_error!("Failed to start engine runtime: {err}");
                    return;
                }
            };
            let session = StreamSession::new(transport, runtime.handle().clone())
                .with_idle_timeout(options.idle_timeout);
            let mut slot = SessionSlot::new();
            let mut debouncer =
                LookupDebouncer::new(lookup, runtime.handle().clone(), options.debounce);

            while let Ok(command) = cmd_rx.recv() {
                if matches!(command, EngineCommand::Stop) {
                    break;
                }
                handle_command(command, &session, &mut slot, &mut debouncer, &event_tx);
            }
            outreach_info!("Engine shutting down");
            slot.close_current();
        });

        Self { cmd_tx, event_rx }
    }

    /// Carries out an effect produced by the core update function.
    pub fn execute(&self, effect: Effect) {
        let command = match effect {
            Effect::OpenSession { session_id, key } => EngineCommand::Open { session_id, key },
            Effect::CloseSession { session_id } => EngineCommand::Close { session_id },
            Effect::Lookup { side, query } => EngineCommand::Lookup { side, query },
            Effect::CancelLookup { side } => EngineCommand::CancelLookup { side },
        };
        let _ = self.cmd_tx.send(command);
    }

    /// Closes the live session and ends the engine thread. Once it has exited,
    /// `recv_timeout` reports `Disconnected`.
    pub fn stop(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Stop);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// `Timeout` means nothing happened yet; `Disconnected` means the engine
    /// thread is gone and no event will ever arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, RecvTimeoutError> {
        self.event_rx.recv_timeout(timeout)
    }
}

fn handle_command(
    command: EngineCommand,
    session: &StreamSession,
    slot: &mut SessionSlot,
    debouncer: &mut LookupDebouncer,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Open { session_id, key } => {
            let observer = Arc::new(ChannelObserver {
                session_id,
                tx: event_tx.clone(),
            });
            slot.open(session, session_id, key, observer);
        }
        EngineCommand::Close { session_id } => {
            slot.close(session_id);
        }
        EngineCommand::Lookup { side, query } => {
            let tx = event_tx.clone();
            debouncer.schedule(side, query, move |query, companies| {
                let _ = tx.send(EngineEvent::LookupCompleted {
                    side,
                    query,
                    companies,
                });
            });
        }
        EngineCommand::CancelLookup { side } => debouncer.cancel(side),
        EngineCommand::Stop => {}
    }
}

/// Forwards one session's callbacks into the engine event channel.
struct ChannelObserver {
    session_id: SessionId,
    tx: mpsc::Sender<EngineEvent>,
}

impl SessionObserver for ChannelObserver {
    fn on_stage(&self, stage: Stage, result: StageResult) {
        let _ = self.tx.send(EngineEvent::Stage {
            session_id: self.session_id,
            stage,
            result,
        });
    }

    fn on_failure(&self, error: &ConnectionError) {
        let _ = self.tx.send(EngineEvent::Failed {
            session_id: self.session_id,
            error: error.to_string(),
        });
    }

    fn on_finished(&self) {
        let _ = self.tx.send(EngineEvent::Finished {
            session_id: self.session_id,
        });
    }
}
