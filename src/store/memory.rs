//! In-memory store

use super::PriceStore;
use crate::resolver::ResolvedPrice;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Store for tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    previous: HashMap<String, f64>,
    saved: RwLock<HashMap<String, ResolvedPrice>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a previous value
    pub fn with_previous(mut self, commodity_id: &str, value: f64) -> Self {
        self.previous.insert(commodity_id.to_string(), value);
        self
    }

    pub async fn saved(&self, commodity_id: &str) -> Option<ResolvedPrice> {
        self.saved.read().await.get(commodity_id).cloned()
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn load_previous(&self, commodity_id: &str) -> Option<f64> {
        if let Some(price) = self.saved.read().await.get(commodity_id) {
            return price.value;
        }
        self.previous.get(commodity_id).copied()
    }

    async fn save(&self, commodity_id: &str, price: &ResolvedPrice) -> anyhow::Result<()> {
        self.saved
            .write()
            .await
            .insert(commodity_id.to_string(), price.clone());
        Ok(())
    }
}
