//! Retail price feed
//!
//! Fetches pay-as-you-go VM prices from the Azure Retail Prices API.
//! https://learn.microsoft.com/en-us/rest/api/cost-management/retail-prices/azure-retail-prices

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{PricingError, PricingResult};
use crate::models::{Currency, PriceMap, PriceQuery};

/// Azure Retail Prices API endpoint
pub const RETAIL_PRICES_API: &str = "https://prices.azure.com/api/retail/prices";

/// Upper bound on followed `NextPageLink`s for a single query
const MAX_PAGES: usize = 1000;

/// Source of live on-demand prices
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch hourly on-demand prices for every VM size sold in `region`
    async fn fetch_on_demand_prices(&self, region: &str) -> PricingResult<PriceMap>;
}

#[derive(Debug, Deserialize)]
struct RetailPricePage {
    #[serde(rename = "Items")]
    items: Vec<RetailPriceItem>,
    #[serde(rename = "NextPageLink")]
    next_page_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RetailPriceItem {
    #[serde(rename = "retailPrice")]
    retail_price: f64,
    #[serde(rename = "armRegionName", default)]
    arm_region_name: String,
    #[serde(rename = "skuName", default)]
    sku_name: String,
    #[serde(rename = "productName", default)]
    product_name: String,
    #[serde(rename = "unitOfMeasure", default)]
    unit_of_measure: String,
    #[serde(rename = "armSkuName")]
    arm_sku_name: Option<String>,
}

impl RetailPriceItem {
    /// Linux, non-spot, hourly meters with a VM size attached
    fn on_demand_instance_type(&self) -> Option<&str> {
        let name = self.arm_sku_name.as_deref().filter(|n| !n.is_empty())?;
        if !self.unit_of_measure.eq_ignore_ascii_case("1 hour") {
            return None;
        }
        if self.sku_name.contains("Spot") || self.sku_name.contains("Low Priority") {
            return None;
        }
        if self.product_name.contains("Windows") {
            return None;
        }
        Some(name)
    }
}

/// Paged client for the retail prices API
pub struct AzureRetailPriceFeed {
    client: Client,
    endpoint: String,
    currency: Currency,
}

impl AzureRetailPriceFeed {
    pub fn new(endpoint: impl Into<String>, currency: Currency) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            currency,
        }
    }

    async fn fetch_page(&self, url: &str) -> PricingResult<RetailPricePage> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(PricingError::Api {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Run a filtered query, following `NextPageLink` until exhausted
    pub async fn query(&self, query: &PriceQuery) -> PricingResult<PriceMap> {
        let mut url = Some(format!(
            "{}?$filter={}",
            self.endpoint,
            urlencoding::encode(&query.to_filter())
        ));
        let mut prices = PriceMap::new();
        let mut pages = 0;

        while let Some(next) = url.take() {
            let page = self.fetch_page(&next).await?;
            pages += 1;
            debug!(page = pages, items = page.items.len(), "Fetched price page");

            merge_items(&mut prices, &query.region, page.items);

            if pages < MAX_PAGES {
                url = page.next_page_link.filter(|link| !link.is_empty());
            }
        }

        info!(
            region = %query.region,
            pages = pages,
            count = prices.len(),
            "Retail price query complete"
        );

        Ok(prices)
    }
}

impl Default for AzureRetailPriceFeed {
    fn default() -> Self {
        Self::new(RETAIL_PRICES_API, Currency::Usd)
    }
}

#[async_trait]
impl PriceFeed for AzureRetailPriceFeed {
    async fn fetch_on_demand_prices(&self, region: &str) -> PricingResult<PriceMap> {
        let prices = self
            .query(&PriceQuery::virtual_machines(region, self.currency))
            .await?;
        if prices.is_empty() {
            return Err(PricingError::Empty(region.to_string()));
        }
        Ok(prices)
    }
}

/// Fold one page into the map; duplicate sizes keep the lowest price
fn merge_items(prices: &mut PriceMap, region: &str, items: Vec<RetailPriceItem>) {
    for item in items {
        if !item.arm_region_name.is_empty() && item.arm_region_name != region {
            continue;
        }
        let Some(name) = item.on_demand_instance_type() else {
            continue;
        };
        prices
            .entry(name.to_string())
            .and_modify(|p| *p = p.min(item.retail_price))
            .or_insert(item.retail_price);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "BillingCurrency": "USD",
        "Items": [
            {"retailPrice": 0.096, "armRegionName": "eastus", "skuName": "D2s v3",
             "productName": "Virtual Machines DSv3 Series", "unitOfMeasure": "1 Hour",
             "armSkuName": "Standard_D2s_v3"},
            {"retailPrice": 0.019, "armRegionName": "eastus", "skuName": "D2s v3 Spot",
             "productName": "Virtual Machines DSv3 Series", "unitOfMeasure": "1 Hour",
             "armSkuName": "Standard_D2s_v3"},
            {"retailPrice": 0.188, "armRegionName": "eastus", "skuName": "D2s v3",
             "productName": "Virtual Machines DSv3 Series Windows", "unitOfMeasure": "1 Hour",
             "armSkuName": "Standard_D2s_v3"},
            {"retailPrice": 0.09, "armRegionName": "eastus", "skuName": "D2s v3",
             "productName": "Virtual Machines DSv3 Series", "unitOfMeasure": "1 Hour",
             "armSkuName": "Standard_D2s_v3"},
            {"retailPrice": 0.02, "armRegionName": "eastus", "skuName": "B1s Low Priority",
             "productName": "Virtual Machines BS Series", "unitOfMeasure": "1 Hour",
             "armSkuName": "Standard_B1s"},
            {"retailPrice": 12.0, "armRegionName": "eastus", "skuName": "Reservation",
             "productName": "Virtual Machines BS Series", "unitOfMeasure": "1 Month",
             "armSkuName": "Standard_B1s"},
            {"retailPrice": 0.5, "armRegionName": "westus", "skuName": "E2s v3",
             "productName": "Virtual Machines ESv3 Series", "unitOfMeasure": "1 Hour",
             "armSkuName": "Standard_E2s_v3"},
            {"retailPrice": 0.3, "armRegionName": "eastus", "skuName": "Disk",
             "productName": "Premium SSD", "unitOfMeasure": "1 Hour", "armSkuName": ""}
        ],
        "NextPageLink": "https://prices.azure.com/api/retail/prices?$skip=100",
        "Count": 8
    }"#;

    #[test]
    fn test_page_decodes_next_link() {
        let page: RetailPricePage = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.items.len(), 8);
        assert!(page.next_page_link.unwrap().ends_with("$skip=100"));
    }

    #[test]
    fn test_merge_keeps_linux_on_demand_hourly_prices() {
        let page: RetailPricePage = serde_json::from_str(PAGE).unwrap();
        let mut prices = PriceMap::new();
        merge_items(&mut prices, "eastus", page.items);

        assert_eq!(prices.len(), 1);
        // Cheaper duplicate wins; spot, windows and other regions are skipped
        assert_eq!(prices.get("Standard_D2s_v3"), Some(&0.09));
        assert!(!prices.contains_key("Standard_B1s"));
        assert!(!prices.contains_key("Standard_E2s_v3"));
    }
}
