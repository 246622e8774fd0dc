use thiserror::Error;

/// Main error type for the order engine
#[derive(Error, Debug)]
pub enum TondealError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Resolution errors
    #[error("Pool not found for pair: {0}")]
    PoolNotFound(String),

    #[error("Malformed order {order_id}: {reason}")]
    MalformedOrder { order_id: String, reason: String },

    // Quote errors
    #[error("Quote unavailable for {from} -> {to}: {reason}")]
    QuoteUnavailable {
        from: String,
        to: String,
        reason: String,
    },

    // Execution errors
    #[error("Swap submission failed: {0}")]
    SwapSubmission(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    // Crypto/signing errors
    #[error("Signing error: {0}")]
    Signing(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for TondealError
pub type Result<T> = std::result::Result<T, TondealError>;

impl TondealError {
    /// True for failures that abort an entire cycle rather than a single
    /// order. Only store-wide unavailability qualifies; everything else is
    /// contained at order or user scope and retried next cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TondealError::Database(_) | TondealError::Migration(_))
    }
}
