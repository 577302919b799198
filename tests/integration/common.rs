//! Shared fixtures: a scripted fetcher and commodity builders

use async_trait::async_trait;
use lme_prices::commodity::{Commodity, PlausibleRange};
use lme_prices::source::{
    build_adapter, AdapterContext, FetchRequest, FetchResponse, Fetcher, SourceAdapter,
    SourceError, SourceSpec,
};
use lme_prices::units::{CanonicalUnit, MassUnit};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Request timeout used by test adapters
pub const TEST_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Clone)]
enum Reply {
    Body { status: u16, body: String },
    Hang,
}

/// In-memory fetcher with scripted replies per URL and a call log.
///
/// Unknown URLs fail with a transport error.
#[derive(Default)]
pub struct MockFetcher {
    routes: HashMap<String, (Reply, Option<Duration>)>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, url: &str, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            (
                Reply::Body {
                    status: 200,
                    body: body.to_string(),
                },
                None,
            ),
        );
        self
    }

    pub fn json(self, url: &str, body: serde_json::Value) -> Self {
        self.body(url, &body.to_string())
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(
            url.to_string(),
            (
                Reply::Body {
                    status,
                    body: String::new(),
                },
                None,
            ),
        );
        self
    }

    /// Never answers; the adapter's timeout or cancellation must end it
    pub fn hang(mut self, url: &str) -> Self {
        self.routes.insert(url.to_string(), (Reply::Hang, None));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SourceError> {
        self.calls.lock().unwrap().push(request.url.clone());

        let Some((reply, delay)) = self.routes.get(&request.url).cloned() else {
            return Err(SourceError::Transport {
                url: request.url.clone(),
                reason: "connection refused".to_string(),
            });
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match reply {
            Reply::Body { status, body } => Ok(FetchResponse { status, body }),
            Reply::Hang => std::future::pending().await,
        }
    }
}

pub fn context(fetcher: &Arc<MockFetcher>) -> AdapterContext {
    AdapterContext::new(fetcher.clone(), TEST_TIMEOUT)
}

pub fn adapters(specs: Vec<SourceSpec>, ctx: &AdapterContext) -> Vec<Box<dyn SourceAdapter>> {
    specs.into_iter().map(|spec| build_adapter(spec, ctx)).collect()
}

pub fn commodity(id: &str, synonyms: &[&str], unit: MassUnit, range: [f64; 2]) -> Commodity {
    Commodity::new(
        id,
        synonyms.iter().map(|s| s.to_string()).collect(),
        CanonicalUnit::usd_per(unit),
        PlausibleRange::from(range),
    )
}
