use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use outreach_core::{lookup_query, Company, Side, MIN_QUERY_LEN};
use outreach_logging::{outreach_debug, outreach_warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use url::Url;

pub const DEFAULT_LOOKUP_ENDPOINT: &str = "https://api.userled.io/api/clearbit/autocomplete";

#[derive(Debug, Clone)]
pub struct LookupSettings {
    pub endpoint: String,
    pub request_timeout: Duration,
    pub debounce: Duration,
    pub min_query_len: usize,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LOOKUP_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(10),
            debounce: Duration::from_millis(300),
            min_query_len: MIN_QUERY_LEN,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("invalid lookup url: {0}")]
    InvalidUrl(String),
    #[error("lookup timed out")]
    Timeout,
    #[error("lookup failed with http status {0}")]
    HttpStatus(u16),
    #[error("lookup network error: {0}")]
    Network(String),
    #[error("lookup returned unexpected body: {0}")]
    Decode(String),
}

#[async_trait::async_trait]
pub trait CompanyLookup: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Company>, LookupError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestLookup {
    settings: LookupSettings,
}

impl ReqwestLookup {
    pub fn new(settings: LookupSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, LookupError> {
        reqwest::Client::builder()
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| LookupError::Network(err.to_string()))
    }
}

#[async_trait::async_trait]
impl CompanyLookup for ReqwestLookup {
    async fn search(&self, query: &str) -> Result<Vec<Company>, LookupError> {
        let Some(query) = lookup_query(query, self.settings.min_query_len) else {
            return Ok(Vec::new());
        };
        let mut url = Url::parse(&self.settings.endpoint)
            .map_err(|err| LookupError::InvalidUrl(err.to_string()))?;
        url.query_pairs_mut().append_pair("query", query);

        let client = self.build_client()?;
        let response = client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::HttpStatus(status.as_u16()));
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body).map_err(|err| LookupError::Decode(err.to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> LookupError {
    if err.is_timeout() {
        return LookupError::Timeout;
    }
    LookupError::Network(err.to_string())
}

/// Runs at most one pending lookup per side, after a quiet period.
///
/// Scheduling a new query for a side cancels the previous one, whether it is
/// still waiting out the delay or already in flight.
pub struct LookupDebouncer {
    lookup: Arc<dyn CompanyLookup>,
    runtime: Handle,
    delay: Duration,
    pending: HashMap<Side, JoinHandle<()>>,
}

impl LookupDebouncer {
    pub fn new(lookup: Arc<dyn CompanyLookup>, runtime: Handle, delay: Duration) -> Self {
        Self {
            lookup,
            runtime,
            delay,
            pending: HashMap::new(),
        }
    }

    pub fn schedule<F>(&mut self, side: Side, query: String, deliver: F)
    where
        F: FnOnce(String, Vec<Company>) + Send + 'static,
    {
        self.cancel(side);
        let lookup = self.lookup.clone();
        let delay = self.delay;
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            outreach_debug!("Looking up companies for {query:?}");
            let companies = match lookup.search(&query).await {
                Ok(companies) => companies,
                Err(err) => {
                    outreach_warn!("Company lookup for {query:?} failed: {err}");
                    Vec::new()
                }
            };
            deliver(query, companies);
        });
        self.pending.insert(side, task);
    }

    pub fn cancel(&mut self, side: Side) {
        if let Some(task) = self.pending.remove(&side) {
            task.abort();
        }
    }
}

impl Drop for LookupDebouncer {
    fn drop(&mut self) {
        for (_, task) in self.pending.drain() {
            task.abort();
        }
    }
}
