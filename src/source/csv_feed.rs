//! CSV feed adapter

use super::{first_quote, AdapterContext, Endpoint, SourceAdapter, SourceError, SourceSpec};
use crate::commodity::Commodity;
use crate::extract::{Payload, RawQuote};
use async_trait::async_trait;

/// Source backed by a CSV download with a header row
pub struct CsvFeedAdapter {
    spec: SourceSpec,
    ctx: AdapterContext,
}

impl CsvFeedAdapter {
    pub fn new(spec: SourceSpec, ctx: AdapterContext) -> Self {
        Self { spec, ctx }
    }

    async fn load(&self, endpoint: Endpoint) -> Result<Payload, SourceError> {
        let request = self
            .ctx
            .request(&self.spec, &endpoint.url)
            .header("Accept", "text/csv, text/plain, */*")
            .header("User-Agent", self.ctx.user_agent.as_str());
        let body = self.ctx.body(&self.spec, &request).await?;

        if body.trim().is_empty() {
            return Err(SourceError::Malformed {
                url: endpoint.url,
                reason: "empty CSV body".to_string(),
            });
        }
        Ok(Payload::Table(body))
    }
}

#[async_trait]
impl SourceAdapter for CsvFeedAdapter {
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
