use thiserror::Error;

/// Result type for instance type operations
pub type InstanceTypeResult<T> = Result<T, InstanceTypeError>;

/// Errors that abort building the instance type list
#[derive(Debug, Error)]
pub enum InstanceTypeError {
    /// The raw SKU catalog could not be fetched
    #[error("Failed to list SKUs in region {region}: {source}")]
    SkuSource {
        region: String,
        #[source]
        source: SkuSourceError,
    },

    /// A reservation override is not a valid quantity
    #[error("Invalid quantity '{value}' for {field}: {source}")]
    InvalidQuantity {
        field: String,
        value: String,
        #[source]
        source: QuantityParseError,
    },

    /// A capability or kubelet value too large to hold as a quantity
    #[error("Quantity out of range for {field}: {value}")]
    QuantityOutOfRange { field: String, value: String },

    /// An eviction signal is neither a quantity nor a usable percentage
    #[error("Invalid eviction threshold '{value}' for {signal}: {reason}")]
    InvalidEvictionThreshold {
        signal: String,
        value: String,
        reason: String,
    },

    #[error("Pricing error: {0}")]
    Pricing(#[from] domain_pricing::PricingError),
}

/// Errors raised by a [`crate::SkuSource`]
#[derive(Debug, Error)]
pub enum SkuSourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode SKUs: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("SKU source unavailable: {0}")]
    Unavailable(String),
}

/// A size string that does not follow the naming grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("size '{input}' does not match the naming grammar: {reason}")]
pub struct SizeParseError {
    pub input: String,
    pub reason: &'static str,
}

/// A string that is not a resource quantity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid quantity '{0}'")]
pub struct QuantityParseError(pub String);
