use async_trait::async_trait;

use crate::error::SkuSourceError;
use crate::models::RawSku;

/// Where raw SKU descriptors come from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SkuSource: Send + Sync {
    /// Every SKU offered in `region`
    async fn list_skus(&self, region: &str) -> Result<Vec<RawSku>, SkuSourceError>;
}

/// A fixed list of SKUs, returned for any region
#[derive(Debug, Clone, Default)]
pub struct StaticSkuSource {
    skus: Vec<RawSku>,
}

impl StaticSkuSource {
    pub fn new(skus: Vec<RawSku>) -> Self {
        Self { skus }
    }
}

#[async_trait]
impl SkuSource for StaticSkuSource {
    async fn list_skus(&self, _region: &str) -> Result<Vec<RawSku>, SkuSourceError> {
        Ok(self.skus.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_ignores_region() {
        let source = StaticSkuSource::new(vec![RawSku::new("Standard_A1", "A1")]);
        assert_eq!(source.list_skus("eastus").await.unwrap().len(), 1);
        assert_eq!(source.list_skus("westeurope").await.unwrap()[0].name, "Standard_A1");
    }
}
