use std::time::Duration;

use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use outreach_core::SessionKey;
use outreach_logging::outreach_info;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::{ConnectionError, FailureKind, WireEvent};

pub const DEFAULT_STREAM_ENDPOINT: &str = "https://userled-backend.onrender.com/stream-scrape";

#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub endpoint: String,
    pub connect_timeout: Duration,
    /// Longest silence tolerated between two events; `None` waits forever.
    pub idle_timeout: Option<Duration>,
    pub allowed_content_types: Vec<String>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_STREAM_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Some(Duration::from_secs(120)),
            allowed_content_types: vec!["text/event-stream".to_string()],
        }
    }
}

/// Framed events of one open connection. Dropping the stream releases the connection.
pub type EventStream = BoxStream<'static, Result<WireEvent, ConnectionError>>;

#[async_trait::async_trait]
pub trait EventTransport: Send + Sync {
    /// Opens exactly one streaming connection for `key`.
    async fn connect(&self, key: &SessionKey) -> Result<EventStream, ConnectionError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    settings: StreamSettings,
}

impl ReqwestTransport {
    pub fn new(settings: StreamSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    fn build_client(&self) -> Result<reqwest::Client, ConnectionError> {
        // No overall request timeout: the response body is the long-lived stream.
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .build()
            .map_err(|err| ConnectionError::new(FailureKind::Network, err.to_string()))
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

/// Streaming URL for `key`: the endpoint with `source` and `target` query parameters.
pub fn stream_url(endpoint: &str, key: &SessionKey) -> Result<Url, ConnectionError> {
    let mut url = Url::parse(endpoint)
        .map_err(|err| ConnectionError::new(FailureKind::InvalidUrl, err.to_string()))?;
    url.query_pairs_mut()
        .append_pair("source", key.source())
        .append_pair("target", key.target());
    Ok(url)
}

#[async_trait::async_trait]
impl EventTransport for ReqwestTransport {
    async fn connect(&self, key: &SessionKey) -> Result<EventStream, ConnectionError> {
        let url = stream_url(&self.settings.endpoint, key)?;
        let client = self.build_client()?;
        outreach_info!("Opening event stream {}", url);

        let response = client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(ConnectionError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "not an event stream",
                ));
            }
        }

        let events = response
            .bytes_stream()
            .eventsource()
            .map(|item| match item {
                Ok(event) => Ok(WireEvent {
                    name: event.event,
                    data: event.data,
                }),
                Err(err) => Err(map_stream_error(err)),
            });
        Ok(events.boxed())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ConnectionError {
    if err.is_timeout() {
        return ConnectionError::new(FailureKind::Timeout, err.to_string());
    }
    ConnectionError::new(FailureKind::Network, err.to_string())
}

fn map_stream_error(err: EventStreamError<reqwest::Error>) -> ConnectionError {
    match err {
        EventStreamError::Transport(err) => map_reqwest_error(err),
        framing => ConnectionError::new(FailureKind::MalformedFrame, framing.to_string()),
    }
}
