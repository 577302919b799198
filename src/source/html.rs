//! HTML page adapter

use super::{first_quote, AdapterContext, Endpoint, SourceAdapter, SourceError, SourceSpec};
use crate::commodity::Commodity;
use crate::extract::{Payload, RawQuote};
use async_trait::async_trait;

/// Source scraped from a static HTML page
pub struct HtmlAdapter {
    spec: SourceSpec,
    ctx: AdapterContext,
}

impl HtmlAdapter {
    pub fn new(spec: SourceSpec, ctx: AdapterContext) -> Self {
        Self { spec, ctx }
    }

    async fn load(&self, endpoint: Endpoint) -> Result<Payload, SourceError> {
        let request = self
            .ctx
            .request(&self.spec, &endpoint.url)
            .header("User-Agent", self.ctx.user_agent.as_str())
            .header("Accept", "text/html,application/xhtml+xml,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9");
        let body = self.ctx.body(&self.spec, &request).await?;
        Ok(Payload::Text(body))
    }
}

#[async_trait]
impl SourceAdapter for HtmlAdapter {
    fn spec(&self) -> &SourceSpec {
        &self.spec
    }

    async fn fetch(&self, commodity: &Commodity) -> Result<RawQuote, SourceError> {
        first_quote(&self.spec, commodity, &self.ctx.extractor, |endpoint| {
            self.load(endpoint)
        })
        .await
    }
}
