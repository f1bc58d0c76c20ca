use std::io::{self, Write};
use std::time::{Duration, Instant};

use outreach_core::{
    update, AppState, Company, Effect, Msg, ProgressSnapshot, SessionPhase, Side,
};
use outreach_logging::outreach_info;

use crate::effects::EffectRunner;
use crate::render;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Drives `AppState` from engine events and writes rendered output to `out`.
pub struct App<W: Write> {
    state: AppState,
    effects: EffectRunner,
    out: W,
    shown: ProgressSnapshot,
}

impl<W: Write> App<W> {
    pub fn new(effects: EffectRunner, min_query_len: usize, out: W) -> Self {
        Self {
            state: AppState::with_min_query_len(min_query_len),
            effects,
            out,
            shown: ProgressSnapshot::default(),
        }
    }

    fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.effects.enqueue(effects.clone());
        effects
    }

    /// Streams one source/target pair until the run settles.
    pub fn stream(&mut self, source: &str, target: &str) -> io::Result<SessionPhase> {
        for (side, domain) in [(Side::Source, source), (Side::Target, target)] {
            self.dispatch(Msg::CompanySelected {
                side,
                company: Company::from_domain(domain),
            });
        }
        self.dispatch(Msg::StartClicked);

        let view = self.state.view();
        if let Some(key) = &view.session_key {
            write!(self.out, "{}", render::header(key))?;
            write!(self.out, "{}", render::progress(&view.progress))?;
            self.shown = view.progress;
        }
        self.state.consume_dirty();

        while !self.state.phase().is_settled() {
            if let Some(msg) = self.effects.next_msg(POLL_INTERVAL)? {
                self.dispatch(msg);
            }
            if self.state.consume_dirty() {
                self.render_new_stages()?;
            }
        }

        let view = self.state.view();
        write!(self.out, "{}", render::outcome(&view.phase, &view.progress))?;
        self.out.flush()?;
        Ok(view.phase)
    }

    fn render_new_stages(&mut self) -> io::Result<()> {
        let progress = self.state.view().progress;
        for (stage, status) in progress.iter() {
            if status.is_complete() && !self.shown.is_stage_complete(stage) {
                write!(self.out, "{}", render::stage(stage, status))?;
            }
        }
        self.out.flush()?;
        self.shown = progress;
        Ok(())
    }

    /// Runs a single company lookup. `None` means the query was too short to send.
    pub fn search(&mut self, query: &str, timeout: Duration) -> io::Result<Option<Vec<Company>>> {
        let effects = self.dispatch(Msg::QueryChanged {
            side: Side::Source,
            query: query.to_string(),
        });
        if !effects.iter().any(|e| matches!(e, Effect::Lookup { .. })) {
            writeln!(self.out, "Query {query:?} is too short to look up.")?;
            return Ok(None);
        }

        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            match self.effects.next_msg(POLL_INTERVAL)? {
                Some(msg @ Msg::LookupCompleted { .. }) => {
                    self.dispatch(msg);
                    let results = self.state.view().source.results;
                    outreach_info!("Lookup for {query:?} returned {} companies", results.len());
                    write!(self.out, "{}", render::companies(&results))?;
                    return Ok(Some(results));
                }
                Some(msg) => {
                    self.dispatch(msg);
                }
                None => {}
            }
        }
        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("no lookup result for {query:?} within {timeout:?}"),
        ))
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures_util::StreamExt;
    use outreach_core::SessionKey;
    use outreach_engine::{
        CompanyLookup, ConnectionError, EngineHandle, EngineOptions, EventStream, EventTransport,
        LookupError, WireEvent,
    };
    use pretty_assertions::assert_eq;

    use super::*;

    /// Replays a fixed list of events on every connection, then ends the stream.
    struct ReplayTransport {
        events: Vec<(&'static str, &'static str)>,
        connects: AtomicUsize,
    }

    impl ReplayTransport {
        fn new(events: Vec<(&'static str, &'static str)>) -> Arc<Self> {
            Arc::new(Self {
                events,
                connects: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl EventTransport for ReplayTransport {
        async fn connect(&self, _key: &SessionKey) -> Result<EventStream, ConnectionError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let items: Vec<_> = self
                .events
                .iter()
                .map(|(name, data)| Ok(WireEvent::new(*name, *data)))
                .collect();
            Ok(futures_util::stream::iter(items).boxed())
        }
    }

    struct FixedLookup;

    #[async_trait::async_trait]
    impl CompanyLookup for FixedLookup {
        async fn search(&self, query: &str) -> Result<Vec<Company>, LookupError> {
            Ok(vec![Company {
                name: "Acme".into(),
                domain: format!("{query}.com"),
                logo: String::new(),
            }])
        }
    }

    fn engine_over(transport: Arc<ReplayTransport>) -> EngineHandle {
        EngineHandle::with_backends(
            transport,
            Arc::new(FixedLookup),
            EngineOptions {
                idle_timeout: None,
                debounce: Duration::from_millis(5),
            },
        )
    }

    fn app_over(transport: Arc<ReplayTransport>) -> App<Vec<u8>> {
        App::new(EffectRunner::new(engine_over(transport)), 2, Vec::new())
    }

    fn output(app: App<Vec<u8>>) -> String {
        String::from_utf8(app.into_output()).unwrap()
    }

    #[test]
    fn stream_renders_stages_as_they_arrive() {
        let transport = ReplayTransport::new(vec![
            ("targetSummary", r#"{"summary":"Globex buys widgets"}"#),
            ("sourceSummary", r#"{"summary":"Acme makes widgets"}"#),
            ("emails", r#"{"emails":["a@acme.com"]}"#),
        ]);
        let mut app = app_over(transport.clone());

        let phase = app.stream("acme.com", "globex.com").unwrap();
        assert_eq!(phase, SessionPhase::Complete);
        assert_eq!(transport.connects.load(Ordering::SeqCst), 1);

        let text = output(app);
        assert!(text.starts_with("Streaming acme.com -> globex.com\n[ ] Source"));
        assert!(text.contains("[x] Target scraped & summarised\n    Globex buys widgets\n"));
        assert!(text.contains("[x] Emails scraped\n    - a@acme.com\n"));
        assert!(text.ends_with("Done (3/3 stages).\n"));
    }

    #[test]
    fn early_hang_up_reports_failure() {
        let transport =
            ReplayTransport::new(vec![("sourceSummary", r#"{"summary":"Acme makes widgets"}"#)]);
        let mut app = app_over(transport);

        let phase = app.stream("acme.com", "globex.com").unwrap();
        assert!(matches!(phase, SessionPhase::Failed { .. }), "got {phase:?}");
        assert!(output(app).contains("Failed after 1/3 stages"));
    }

    #[test]
    fn blank_domain_never_connects() {
        let transport = ReplayTransport::new(Vec::new());
        let mut app = app_over(transport.clone());

        let phase = app.stream("acme.com", "  ").unwrap();
        assert_eq!(
            phase,
            SessionPhase::Failed {
                message: "target identifier is empty".into()
            }
        );
        assert_eq!(transport.connects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn search_prints_results() {
        let mut app = app_over(ReplayTransport::new(Vec::new()));
        let results = app.search(" acme ", Duration::from_secs(5)).unwrap();
        assert_eq!(results.map(|r| r.len()), Some(1));
        assert_eq!(output(app), "Acme (acme.com)\n");
    }

    #[test]
    fn short_search_is_not_sent() {
        let mut app = app_over(ReplayTransport::new(Vec::new()));
        assert_eq!(app.search("a", Duration::from_secs(1)).unwrap(), None);
    }

    #[test]
    fn stopped_engine_ends_stream_with_error() {
        let transport = ReplayTransport::new(Vec::new());
        let engine = engine_over(transport.clone());
        engine.stop();
        let mut app = App::new(EffectRunner::new(engine), 2, Vec::new());

        let err = app.stream("acme.com", "globex.com").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(transport.connects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stopped_engine_ends_search_with_error() {
        let engine = engine_over(ReplayTransport::new(Vec::new()));
        engine.stop();
        let mut app = App::new(EffectRunner::new(engine), 2, Vec::new());

        let err = app.search("acme", Duration::from_secs(30)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
