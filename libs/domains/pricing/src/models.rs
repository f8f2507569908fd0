use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Hourly on-demand price per instance type name (e.g. `Standard_D2s_v3`)
pub type PriceMap = BTreeMap<String, f64>;

/// Currency enumeration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default, Hash,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
}

/// Where the current price map came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PricingState {
    /// Static table only, no fetch has succeeded yet
    Seeded,
    /// Last fetch succeeded
    Live,
    /// A fetch succeeded once, but the most recent one failed
    Stale,
}

/// Complete price map plus bookkeeping, swapped atomically on refresh
#[derive(Debug, Clone)]
pub struct PricingSnapshot {
    pub prices: PriceMap,
    pub last_update_time: DateTime<Utc>,
    pub state: PricingState,
}

impl PricingSnapshot {
    pub fn seeded(prices: PriceMap, now: DateTime<Utc>) -> Self {
        Self {
            prices,
            last_update_time: now,
            state: PricingState::Seeded,
        }
    }
}

/// Filter predicates understood by the retail prices API
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuery {
    pub price_type: String,
    pub currency: Currency,
    pub service_family: String,
    pub service_name: String,
    pub region: String,
}

impl PriceQuery {
    /// Linux/Windows pay-as-you-go virtual machine prices in one region
    pub fn virtual_machines(region: &str, currency: Currency) -> Self {
        Self {
            price_type: "Consumption".to_string(),
            currency,
            service_family: "Compute".to_string(),
            service_name: "Virtual Machines".to_string(),
            region: region.to_string(),
        }
    }

    /// OData `$filter` expression for this query
    pub fn to_filter(&self) -> String {
        format!(
            "priceType eq '{}' and currencyCode eq '{}' and serviceFamily eq '{}' and serviceName eq '{}' and armRegionName eq '{}'",
            self.price_type, self.currency, self.service_family, self.service_name, self.region
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_machine_filter() {
        let query = PriceQuery::virtual_machines("westeurope", Currency::Usd);
        assert_eq!(
            query.to_filter(),
            "priceType eq 'Consumption' and currencyCode eq 'USD' and serviceFamily eq 'Compute' \
             and serviceName eq 'Virtual Machines' and armRegionName eq 'westeurope'"
        );
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("EUR".parse::<Currency>().unwrap(), Currency::Eur);
        assert!("XYZ".parse::<Currency>().is_err());
    }
}
