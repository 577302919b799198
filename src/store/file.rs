//! JSON document store

use super::PriceStore;
use crate::fx::FxRates;
use crate::report::RunReport;
use crate::resolver::ResolvedPrice;
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Store backed by one JSON run document on disk
pub struct JsonFileStore {
    path: PathBuf,
    document: RwLock<RunReport>,
}

impl JsonFileStore {
    /// Open a store. A missing or unparseable document is treated as empty;
    /// other I/O errors fail.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let document = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable store document, starting empty");
                RunReport::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No store document yet");
                RunReport::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read store {}", path.display()));
            }
        };

        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current in-memory document
    pub async fn document(&self) -> RunReport {
        self.document.read().await.clone()
    }

    pub async fn previous_values(&self) -> HashMap<String, f64> {
        self.document.read().await.previous_values()
    }

    pub async fn previous_fx(&self) -> Option<FxRates> {
        self.document.read().await.fx.clone()
    }

    /// Apply final changes to the document and write it atomically
    pub async fn commit<F>(&self, finish: F) -> anyhow::Result<RunReport>
    where
        F: FnOnce(&mut RunReport) + Send,
    {
        let mut document = self.document.write().await;
        finish(&mut *document);
        write_atomic(&self.path, &document).await?;
        tracing::info!(path = %self.path.display(), prices = document.prices.len(), "Store committed");
        Ok(document.clone())
    }
}

#[async_trait]
impl PriceStore for JsonFileStore {
    async fn load_previous(&self, commodity_id: &str) -> Option<f64> {
        self.document
            .read()
            .await
            .prices
            .get(commodity_id)
            .and_then(|price| price.value)
            .filter(|v| v.is_finite())
    }

    async fn save(&self, commodity_id: &str, price: &ResolvedPrice) -> anyhow::Result<()> {
        anyhow::ensure!(
            commodity_id == price.commodity_id,
            "Price for {} saved under {}",
            price.commodity_id,
            commodity_id
        );
        self.document.write().await.record(price.clone());
        Ok(())
    }
}

/// Write to a sibling temp file, then rename over the target
async fn write_atomic(path: &Path, document: &RunReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(document).context("Failed to serialize store document")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store.json".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&tmp, json.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
