#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use futures_util::StreamExt;
use outreach_core::{SessionKey, Stage, StageResult};
use outreach_engine::{
    ConnectionError, EventStream, EventTransport, SessionObserver, WireEvent,
};
use tokio::sync::{mpsc, Notify};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(outreach_logging::initialize_for_tests);
}

pub fn key(source: &str, target: &str) -> SessionKey {
    SessionKey::new(source, target).unwrap()
}

type Feed = mpsc::UnboundedSender<Result<WireEvent, ConnectionError>>;

struct ReleaseGuard(Arc<AtomicUsize>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-process transport whose connections are fed by the test.
#[derive(Default)]
pub struct ScriptedTransport {
    connects: AtomicUsize,
    released: Arc<AtomicUsize>,
    feeds: Mutex<Vec<Feed>>,
    keys: Mutex<Vec<SessionKey>>,
    refuse_with: Mutex<Option<ConnectionError>>,
    attempts: AtomicUsize,
    hold_connect: AtomicBool,
    gate: Notify,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn refusing(error: ConnectionError) -> Arc<Self> {
        let transport = Self::default();
        *transport.refuse_with.lock().unwrap() = Some(error);
        Arc::new(transport)
    }

    /// Connect calls park until [`ScriptedTransport::open_gate`].
    pub fn holding() -> Arc<Self> {
        let transport = Self::default();
        transport.hold_connect.store(true, Ordering::SeqCst);
        Arc::new(transport)
    }

    pub fn open_gate(&self) {
        self.gate.notify_one();
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn wait_attempted(&self, count: usize) {
        for _ in 0..500 {
            if self.attempts() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("transport never saw {count} connect attempts");
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<SessionKey> {
        self.keys.lock().unwrap().clone()
    }

    pub async fn wait_connected(&self, count: usize) {
        for _ in 0..500 {
            if self.connects() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("transport never reached {count} connections");
    }

    /// Queues a named event on the most recent connection.
    pub fn send(&self, name: &str, data: &str) {
        self.push(Ok(WireEvent::new(name, data)));
    }

    pub fn push(&self, item: Result<WireEvent, ConnectionError>) {
        if let Some(feed) = self.feeds.lock().unwrap().last() {
            let _ = feed.send(item);
        }
    }

    /// Server-side end of every open connection.
    pub fn hang_up(&self) {
        self.feeds.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl EventTransport for ScriptedTransport {
    async fn connect(&self, key: &SessionKey) -> Result<EventStream, ConnectionError> {
        self.keys.lock().unwrap().push(key.clone());
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.hold_connect.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if let Some(error) = self.refuse_with.lock().unwrap().clone() {
            return Err(error);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds.lock().unwrap().push(tx);
        self.connects.fetch_add(1, Ordering::SeqCst);
        let guard = ReleaseGuard(self.released.clone());
        let stream = futures_util::stream::unfold((rx, guard), |(mut rx, guard)| async move {
            rx.recv().await.map(|item| (item, (rx, guard)))
        });
        Ok(stream.boxed())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Stage(Stage, StageResult),
    Failed(ConnectionError),
    Finished,
}

/// Observer that forwards every callback into a channel the test drains.
pub struct RecordingObserver {
    tx: mpsc::UnboundedSender<Observed>,
}

pub fn recording() -> (Arc<RecordingObserver>, mpsc::UnboundedReceiver<Observed>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(RecordingObserver { tx }), rx)
}

impl SessionObserver for RecordingObserver {
    fn on_stage(&self, stage: Stage, result: StageResult) {
        let _ = self.tx.send(Observed::Stage(stage, result));
    }

    fn on_failure(&self, error: &ConnectionError) {
        let _ = self.tx.send(Observed::Failed(error.clone()));
    }

    fn on_finished(&self) {
        let _ = self.tx.send(Observed::Finished);
    }
}

pub async fn next(rx: &mut mpsc::UnboundedReceiver<Observed>) -> Observed {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("observer callback within timeout")
        .expect("observer channel open")
}

/// Gives the session time to misbehave, then checks nothing was dispatched.
pub async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<Observed>) {
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(rx.try_recv().ok(), None);
}

pub fn summary(text: &str) -> StageResult {
    StageResult::Summary(text.to_string())
}

pub fn emails(list: &[&str]) -> StageResult {
    StageResult::Emails(list.iter().map(|s| s.to_string()).collect())
}
