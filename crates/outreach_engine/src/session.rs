//! One streaming connection per session, translated into ordered stage callbacks.
//!
//! Every exit path (terminal stage, explicit close, connection failure) goes
//! through [`Shared::shutdown`], which runs at most once and drops the
//! connection synchronously.

use std::cell::Cell;
use std::future::poll_fn;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::StreamExt;
use outreach_core::{InvalidKeyError, SessionKey, Stage, StageResult};
use outreach_logging::{
    outreach_debug, outreach_info, outreach_trace, outreach_warn, SessionContextGuard,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::transport::{EventStream, EventTransport};
use crate::{decode_event, ConnectionError, FailureKind, WireEvent};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Session whose observer is currently being called on this thread.
    static DISPATCHING: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Receives the typed updates of one session.
///
/// Calls for one session never overlap and arrive in wire order. None arrive
/// once [`SessionHandle::close`] has returned.
pub trait SessionObserver: Send + Sync {
    fn on_stage(&self, stage: Stage, result: StageResult);

    /// The connection failed before the terminal stage. Called at most once.
    fn on_failure(&self, error: &ConnectionError);

    /// The terminal stage was delivered and the connection released.
    fn on_finished(&self) {}
}

/// Opens sessions over a transport on a tokio runtime.
#[derive(Clone)]
pub struct StreamSession {
    transport: Arc<dyn EventTransport>,
    runtime: Handle,
    idle_timeout: Option<Duration>,
}

impl StreamSession {
    pub fn new(transport: Arc<dyn EventTransport>, runtime: Handle) -> Self {
        Self {
            transport,
            runtime,
            idle_timeout: None,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Establishes one connection for `key` and starts dispatching to `observer`.
    pub fn open(&self, key: SessionKey, observer: Arc<dyn SessionObserver>) -> SessionHandle {
        let id = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        {
            let _ctx = SessionContextGuard::enter(id);
            outreach_info!("Opening session for {key}");
        }
        let shared = Arc::new(Shared {
            id,
            closed: AtomicBool::new(false),
            connection: Mutex::new(None),
            dispatch: Mutex::new(()),
        });
        let task = self.runtime.spawn(drive(
            shared.clone(),
            self.transport.clone(),
            key.clone(),
            observer,
            self.idle_timeout,
        ));
        SessionHandle { shared, key, task }
    }

    /// Validates the identifiers before any connection attempt, then opens.
    pub fn open_pair(
        &self,
        source: &str,
        target: &str,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<SessionHandle, InvalidKeyError> {
        let key = SessionKey::new(source, target)?;
        Ok(self.open(key, observer))
    }
}

/// Cancellation handle for an open session. Dropping it closes the session.
pub struct SessionHandle {
    shared: Arc<Shared>,
    key: SessionKey,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// True once the session reached its terminal stage, failed, or was closed.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Releases the connection and stops dispatch. Safe to call any number of times.
    pub fn close(&self) {
        if self.shared.shutdown() {
            let _ctx = SessionContextGuard::enter(self.shared.id);
            outreach_info!("Session closed by caller");
        }
        self.task.abort();
        // Wait for an in-flight callback to return, unless it is the one calling us.
        if DISPATCHING.with(Cell::get) != Some(self.shared.id) {
            drop(lock(&self.shared.dispatch));
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

struct Shared {
    id: u64,
    closed: AtomicBool,
    connection: Mutex<Option<EventStream>>,
    /// Held while the observer runs; `close` takes it to wait out a running callback.
    dispatch: Mutex<()>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Marks the session closed and drops the connection. Returns `true` only
    /// for the call that actually performed the teardown.
    fn shutdown(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        let connection = lock(&self.connection).take();
        drop(connection);
        true
    }

    /// Stores the freshly opened connection unless the session was closed meanwhile.
    fn install(&self, stream: EventStream) -> bool {
        let mut slot = lock(&self.connection);
        if self.is_closed() {
            return false;
        }
        *slot = Some(stream);
        true
    }

    fn poll_next(&self, cx: &mut Context<'_>) -> Poll<Option<Result<WireEvent, ConnectionError>>> {
        match lock(&self.connection).as_mut() {
            Some(stream) => stream.poll_next_unpin(cx),
            None => Poll::Ready(None),
        }
    }

    fn handle_event(&self, event: WireEvent, observer: &dyn SessionObserver) -> Flow {
        let _ctx = SessionContextGuard::enter(self.id);
        outreach_trace!("Event {:?} ({} bytes)", event.name, event.data.len());

        let decoded = match decode_event(&event) {
            Ok(Some(decoded)) => decoded,
            Ok(None) => {
                outreach_debug!("Ignoring unknown event {:?}", event.name);
                return Flow::Continue;
            }
            Err(err) => {
                outreach_warn!("Dropping event: {err}");
                return Flow::Continue;
            }
        };

        let _gate = lock(&self.dispatch);
        if self.is_closed() {
            return Flow::Stop;
        }
        let terminal = decoded.stage.is_terminal();
        with_dispatching(self.id, || observer.on_stage(decoded.stage, decoded.result));
        if !terminal {
            return Flow::Continue;
        }
        if self.shutdown() {
            outreach_info!("Final stage received; connection released");
            with_dispatching(self.id, || observer.on_finished());
        }
        Flow::Stop
    }

    fn fail(&self, observer: &dyn SessionObserver, error: ConnectionError) {
        let _ctx = SessionContextGuard::enter(self.id);
        let _gate = lock(&self.dispatch);
        if !self.shutdown() {
            outreach_debug!("Ignoring connection error after close: {error}");
            return;
        }
        outreach_warn!("Session failed: {error}");
        with_dispatching(self.id, || observer.on_failure(&error));
    }
}

async fn drive(
    shared: Arc<Shared>,
    transport: Arc<dyn EventTransport>,
    key: SessionKey,
    observer: Arc<dyn SessionObserver>,
    idle_timeout: Option<Duration>,
) {
    let stream = match transport.connect(&key).await {
        Ok(stream) => stream,
        Err(err) => {
            shared.fail(observer.as_ref(), err);
            return;
        }
    };
    if !shared.install(stream) {
        return;
    }

    loop {
        let next = poll_fn(|cx| shared.poll_next(cx));
        let item = match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, next).await.unwrap_or_else(|_| {
                Some(Err(ConnectionError::new(
                    FailureKind::IdleTimeout,
                    format!("no event for {limit:?}"),
                )))
            }),
            None => next.await,
        };

        match item {
            Some(Ok(event)) => {
                if shared.handle_event(event, observer.as_ref()) == Flow::Stop {
                    return;
                }
            }
            Some(Err(err)) => {
                shared.fail(observer.as_ref(), err);
                return;
            }
            None => {
                // Either the server hung up, or `close` took the connection away.
                shared.fail(
                    observer.as_ref(),
                    ConnectionError::new(FailureKind::EndedEarly, ""),
                );
                return;
            }
        }
    }
}

fn with_dispatching<R>(id: u64, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<u64>);
    impl Drop for Restore {
        fn drop(&mut self) {
            DISPATCHING.with(|d| d.set(self.0));
        }
    }

    let _restore = Restore(DISPATCHING.with(|d| d.replace(Some(id))));
    f()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
