//! Configuration for the instance catalog

use core_config::{ConfigError, Environment, FromEnv, env_list, env_or_default, env_parse};
use domain_instancetype::labels::DEFAULT_SIZE_PARSE_IGNORE_LIST;
use domain_pricing::{Currency, RETAIL_PRICES_API};

const DEFAULT_REGION: &str = "eastus";

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Region to build the catalog for
    pub region: String,
    /// Retail prices endpoint
    pub pricing_api_url: String,
    pub currency: Currency,
    /// Sizes whose parse failures are not logged
    pub size_parse_ignore_list: Vec<String>,
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            environment: Environment::from_env(),
            region: env_or_default("AZURE_LOCATION", DEFAULT_REGION),
            pricing_api_url: env_or_default("PRICING_API_URL", RETAIL_PRICES_API),
            currency: env_parse("PRICING_CURRENCY", Currency::Usd)?,
            size_parse_ignore_list: env_list("SIZE_PARSE_IGNORE_LIST", DEFAULT_SIZE_PARSE_IGNORE_LIST),
        })
    }
}
