//! Last-known-good value store
//!
//! Previous values are read once per commodity before a run and written once
//! at the end. [`JsonFileStore`] keeps the whole run document in memory and
//! persists it with a temp-file-and-rename so readers never see a partial
//! write.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::resolver::ResolvedPrice;
use async_trait::async_trait;
use std::collections::HashMap;

/// Persistence boundary of the resolver
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Last persisted canonical value, if any
    async fn load_previous(&self, commodity_id: &str) -> Option<f64>;

    /// Stage a resolved price
    async fn save(&self, commodity_id: &str, price: &ResolvedPrice) -> anyhow::Result<()>;
}

/// Previous values for every listed commodity, read through the store
pub async fn load_previous_values<'a>(
    store: &dyn PriceStore,
    commodity_ids: impl IntoIterator<Item = &'a str>,
) -> HashMap<String, f64> {
    let mut previous = HashMap::new();
    for id in commodity_ids {
        if let Some(value) = store.load_previous(id).await {
            previous.insert(id.to_string(), value);
        }
    }
    previous
}
