use thiserror::Error;

/// Result type for pricing operations
pub type PricingResult<T> = Result<T, PricingError>;

/// Errors that can occur while fetching or refreshing prices
#[derive(Debug, Error)]
pub enum PricingError {
    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The price API answered with a non-success status
    #[error("Price API returned status {status}: {url}")]
    Api { status: u16, url: String },

    /// The response body could not be decoded
    #[error("Failed to parse price response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The feed answered but carried no usable prices
    #[error("No prices found for region {0}")]
    Empty(String),
}
