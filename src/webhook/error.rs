//! Webhook-specific error handling.

use thiserror::Error;

/// Errors raised while delivering a notification payload.
#[derive(Error, Debug)]
pub enum WebhookError {
    /// The webhook endpoint rejected the payload.
    #[error("Webhook request failed: {0}")]
    RequestFailed(String),

    /// Network connectivity error.
    #[error("Network error: {0}")]
    Network(String),
}

// Note: anyhow already has a blanket impl for thiserror::Error types
