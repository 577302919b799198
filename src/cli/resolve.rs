//! Resolve command implementation

use crate::config::Config;
use crate::fx;
use crate::report::RunReport;
use crate::resolver::{cancel_pair, CancelHandle, CommodityChain, FallbackResolver, Normalizer, Overrides, Resolution};
use crate::source::{build_adapter, AdapterContext, CommandRenderer, Fetcher, HttpFetcher};
use crate::store::{load_previous_values, JsonFileStore, PriceStore};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Only resolve these commodity ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Print the document instead of updating the store
    #[arg(long)]
    pub dry_run: bool,

    /// Also write the document to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ResolveArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        if let Some(env_file) = &config.overrides.env_file {
            match dotenvy::from_filename(env_file) {
                Ok(path) => tracing::debug!(path = %path.display(), "Loaded env file"),
                Err(e) if e.not_found() => tracing::debug!(path = %env_file.display(), "No env file"),
                Err(e) => tracing::warn!(path = %env_file.display(), error = %e, "Failed to load env file"),
            }
        }

        let store = JsonFileStore::open(&config.store.path).await?;

        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
        let fx = fx::load_rates(
            fetcher.as_ref(),
            &config.fx_sources(),
            store.previous_fx().await.as_ref(),
        )
        .await;

        let resolver = build_resolver(config, fetcher, fx.clone())?;
        let ids = resolver.chains().iter().map(|c| c.commodity.id.as_str());
        let previous = load_previous_values(&store, ids).await;

        let (handle, signal) = cancel_pair();
        let watchdog = spawn_cancel_watch(handle, config.run_deadline());
        let only = (!self.only.is_empty()).then_some(self.only.as_slice());
        let resolutions = resolver.resolve_all(&previous, only, &signal).await;
        watchdog.abort();

        for resolution in &resolutions {
            store
                .save(&resolution.price.commodity_id, &resolution.price)
                .await?;
        }

        let run_id = Uuid::new_v4();
        let finish = |doc: &mut RunReport| {
            doc.finish(
                run_id,
                config.engine.canonical_unit.clone(),
                fx.clone(),
                &config.derived,
            )
        };
        let document = if self.dry_run {
            let mut doc = store.document().await;
            finish(&mut doc);
            doc
        } else {
            store.commit(finish).await?
        };

        let summary = RunReport::summarize(&resolutions);
        tracing::info!(
            run_id = %run_id,
            fresh = summary.fresh,
            carried_forward = summary.carried_forward,
            missing = summary.missing,
            cancelled = signal.is_cancelled(),
            "Resolution run finished"
        );
        print_resolutions(&resolutions);

        let json = serde_json::to_string_pretty(&document)?;
        if self.dry_run {
            println!("{json}");
        }
        if let Some(output) = &self.output {
            tokio::fs::write(output, json.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }

        Ok(())
    }
}

/// Wire adapters, overrides and FX into a resolver
pub fn build_resolver(
    config: &Config,
    fetcher: Arc<dyn Fetcher>,
    fx: Option<fx::FxRates>,
) -> anyhow::Result<FallbackResolver> {
    let mut ctx = AdapterContext::new(fetcher, config.request_timeout())
        .with_user_agent(config.engine.user_agent.as_str());
    if let Some(renderer) = &config.renderer {
        ctx = ctx.with_renderer(Arc::new(CommandRenderer::new(
            renderer.program.as_str(),
            renderer.args.clone(),
        )));
    }

    let mut chains = Vec::with_capacity(config.commodities.len());
    for entry in &config.commodities {
        let commodity = config.commodity(entry)?;
        let adapters = entry
            .sources
            .iter()
            .cloned()
            .map(|spec| build_adapter(spec, &ctx))
            .collect();
        chains.push(CommodityChain::new(commodity, adapters));
    }

    let overrides = Overrides::from_env(
        &config.overrides.env_prefix,
        config.commodities.iter().map(|c| c.id.trim()),
    );

    Ok(FallbackResolver::new(chains, Normalizer::new(fx))
        .with_overrides(overrides)
        .with_concurrency(config.engine.concurrency))
}

/// Cancel the run on Ctrl-C or when the deadline passes
fn spawn_cancel_watch(handle: CancelHandle, deadline: Option<Duration>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interrupted = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        let expired = async {
            match deadline {
                Some(deadline) => tokio::time::sleep(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = interrupted => tracing::warn!("Interrupted, cancelling run"),
            _ = expired => tracing::warn!(deadline_secs = deadline.map(|d| d.as_secs()), "Run deadline reached, cancelling"),
        }
        handle.cancel();
    })
}

fn print_resolutions(resolutions: &[Resolution]) {
    for resolution in resolutions {
        let price = &resolution.price;
        let value = price
            .value
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<8} {:>14} {:<8} {}",
            price.commodity_id,
            value,
            price.unit.to_string(),
            price.provenance.to_string()
        );
    }
}
