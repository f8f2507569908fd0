//! SKU sources backed by local files

use async_trait::async_trait;
use domain_instancetype::{RawSku, SkuSource, SkuSourceError};
use std::path::PathBuf;
use tracing::debug;

/// Reads a JSON array of SKUs on every fetch, keeping those offered in the
/// requested region
pub struct JsonFileSkuSource {
    path: PathBuf,
}

impl JsonFileSkuSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SkuSource for JsonFileSkuSource {
    async fn list_skus(&self, region: &str) -> Result<Vec<RawSku>, SkuSourceError> {
        let raw = tokio::fs::read(&self.path).await?;
        let skus: Vec<RawSku> = serde_json::from_slice(&raw)?;
        let total = skus.len();

        // SKUs without any zone map are region-agnostic
        let skus: Vec<RawSku> = skus
            .into_iter()
            .filter(|sku| sku.zones.is_empty() || sku.zones.contains_key(region))
            .collect();

        debug!(
            path = %self.path.display(),
            region = region,
            total = total,
            kept = skus.len(),
            "Loaded SKUs from file"
        );
        Ok(skus)
    }
}
