//! Rendered-page adapter
//!
//! Some providers only produce prices after client-side scripts run. The page
//! is handed to an external rendering engine and the resulting HTML is
//! scraped like a static page. The engine is optional: without one, the
//! adapter reports [`SourceError::Unavailable`] and the chain moves on.

use super::{first_quote, AdapterContext, Endpoint, SourceAdapter, SourceError, SourceSpec};
use crate::commodity::Commodity;
use crate::extract::{Payload, RawQuote};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Turns a URL into post-script HTML
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str, timeout: Duration) -> Result<String, SourceError>;
}

/// Renderer that shells out to a headless browser, e.g.
/// `chromium --headless --dump-dom {url}`
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    /// `{url}` in `args` is replaced by the page URL; if absent the URL is appended
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command_args(&self, url: &str) -> Vec<String> {
        let mut args: Vec<String> = self.args.iter().map(|a| a.replace("{url}", url)).collect();
        if !self.args.iter().any(|a| a.contains("{url}")) {
            args.push(url.to_string());
        }
        args
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> Result<String, SourceError> {
        let child = Command::new(&self.program)
            .args(self.command_args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SourceError::Unavailable(format!("{}: {}", self.program, e)))?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| SourceError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })?
            .map_err(|e| SourceError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(SourceError::Transport {
                url: url.to_string(),
                reason: format!("renderer exited with {}", output.status),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Source scraped from a page after rendering
pub struct RenderedAdapter {
    spec: SourceSpec,
    ctx: AdapterContext,
}

impl RenderedAdapter {
    pub fn new(spec: SourceSpec, ctx: AdapterContext) -> Self {
        Self { spec, ctx }
    }

    async fn load(&self, endpoint: Endpoint) -> Result<Payload, SourceError> {
        let renderer = self
            .ctx
            .renderer
            .as_ref()
            .ok_or_else(|| SourceError::Unavailable("no rendering engine configured".to_string()))?;
        let html = renderer.render(&endpoint.url, self.ctx.timeout).await?;
        Ok(Payload::Text(html))
    }
}

#[async_trait]
impl SourceAdapter for RenderedAdapter {
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
