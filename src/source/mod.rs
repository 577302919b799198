//! Source adapters
//!
//! One adapter per upstream response format. Each adapter turns a
//! [`SourceSpec`] into a [`RawQuote`] by fetching every endpoint candidate in
//! order and handing the parsed payload to the [`ShapeExtractor`].

mod csv_feed;
mod error;
mod fetch;
mod html;
mod json_api;
mod rendered;
mod spec;

pub use csv_feed::CsvFeedAdapter;
pub use error::SourceError;
pub use fetch::{fetch_body, FetchRequest, FetchResponse, Fetcher, HttpFetcher};
pub use html::HtmlAdapter;
pub use json_api::JsonApiAdapter;
pub use rendered::{CommandRenderer, RenderedAdapter, Renderer};
pub use spec::{AdapterKind, Endpoint, SourceSpec};

use crate::commodity::Commodity;
use crate::extract::{Payload, RawQuote, ShapeExtractor};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Browser user agent for providers that block non-browser clients
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125 Safari/537.36";

/// Trait for upstream price sources
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Configuration this adapter was built from
    fn spec(&self) -> &SourceSpec;

    /// Provenance tag
    fn id(&self) -> &str {
        &self.spec().id
    }

    /// Fetch a raw quote for the commodity.
    ///
    /// Every failure is returned as a [`SourceError`]; callers treat any error
    /// as "no usable value from this source".
    async fn fetch(&self, commodity: &Commodity) -> Result<RawQuote, SourceError>;
}

/// Shared collaborators handed to every adapter
#[derive(Clone)]
pub struct AdapterContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub renderer: Option<Arc<dyn Renderer>>,
    pub extractor: Arc<ShapeExtractor>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl AdapterContext {
    pub fn new(fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        Self {
            fetcher,
            renderer: None,
            extractor: Arc::new(ShapeExtractor::default()),
            timeout,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Request for a URL with the source's own headers applied first
    fn request(&self, spec: &SourceSpec, url: &str) -> FetchRequest {
        spec.headers
            .iter()
            .fold(FetchRequest::new(url, self.timeout), |req, (name, value)| {
                req.header(name, value)
            })
    }

    /// GET a body honoring the source's retry settings
    async fn body(&self, spec: &SourceSpec, request: &FetchRequest) -> Result<String, SourceError> {
        fetch_body(
            self.fetcher.as_ref(),
            request,
            spec.retries,
            Duration::from_millis(spec.retry_delay_ms),
        )
        .await
    }
}

/// Build the adapter variant for a spec
pub fn build_adapter(spec: SourceSpec, ctx: &AdapterContext) -> Box<dyn SourceAdapter> {
    match spec.kind {
        AdapterKind::Json => Box::new(JsonApiAdapter::new(spec, ctx.clone())),
        AdapterKind::Csv => Box::new(CsvFeedAdapter::new(spec, ctx.clone())),
        AdapterKind::Html => Box::new(HtmlAdapter::new(spec, ctx.clone())),
        AdapterKind::Rendered => Box::new(RenderedAdapter::new(spec, ctx.clone())),
    }
}

/// Try endpoint candidates in order and return the first located quote.
///
/// The candidate's provider symbol is appended to the commodity's lookup keys
/// so quote arrays keyed by ticker can be matched.
async fn first_quote<F, Fut>(
    spec: &SourceSpec,
    commodity: &Commodity,
    extractor: &ShapeExtractor,
    load: F,
) -> Result<RawQuote, SourceError>
where
    F: Fn(Endpoint) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Payload, SourceError>> + Send,
{
    let mut last_error = None;

    for endpoint in spec.endpoint_candidates() {
        let symbol = endpoint.symbol.clone();
        match load(endpoint).await {
            Ok(payload) => {
                let mut keys = commodity.lookup_keys();
                if let Some(symbol) = symbol.as_deref() {
                    keys.push(symbol);
                }
                if let Some(quote) = extractor.locate(&payload, &keys, spec.unit.as_deref()) {
                    return Ok(quote);
                }
                tracing::debug!(
                    source = %spec.id,
                    commodity = %commodity.id,
                    symbol = symbol.as_deref().unwrap_or("-"),
                    "No price node in payload"
                );
                last_error = Some(SourceError::ShapeNotFound {
                    commodity: commodity.id.clone(),
                });
            }
            Err(e) => {
                tracing::debug!(source = %spec.id, error = %e, "Endpoint candidate failed");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| SourceError::ShapeNotFound {
        commodity: commodity.id.clone(),
    }))
}
