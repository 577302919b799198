//! JSON API adapter

use super::{first_quote, AdapterContext, Endpoint, SourceAdapter, SourceError, SourceSpec};
use crate::commodity::Commodity;
use crate::extract::{Payload, RawQuote};
use async_trait::async_trait;

/// Source backed by a JSON HTTP API
pub struct JsonApiAdapter {
    spec: SourceSpec,
    ctx: AdapterContext,
}

impl JsonApiAdapter {
    pub fn new(spec: SourceSpec, ctx: AdapterContext) -> Self {
        Self { spec, ctx }
    }

    async fn load(&self, endpoint: Endpoint) -> Result<Payload, SourceError> {
        let request = self
            .ctx
            .request(&self.spec, &endpoint.url)
            .header("Accept", "application/json, text/plain, */*")
            .header("User-Agent", self.ctx.user_agent.as_str());
        let body = self.ctx.body(&self.spec, &request).await?;

        serde_json::from_str(&body)
            .map(Payload::Json)
            .map_err(|e| SourceError::Malformed {
                url: endpoint.url,
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl SourceAdapter for JsonApiAdapter {
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
