//! Webhook delivery client.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use tracing::debug;

use crate::webhook::card::MessageCard;
use crate::webhook::error::WebhookError;

/// Trait for notification payload delivery.
pub trait Transport: Send + Sync {
    /// Posts the card to the webhook endpoint.
    fn post<'a>(
        &'a self,
        url: &'a str,
        card: &'a MessageCard,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Webhook client backed by reqwest.
///
/// One POST per call: no retry, no backoff, no timeout override.
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    /// Creates a client with default settings.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for WebhookClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WebhookClient {
    fn post<'a>(
        &'a self,
        url: &'a str,
        card: &'a MessageCard,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .post(url)
                .json(card)
                .send()
                .await
                .map_err(|e| WebhookError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(WebhookError::RequestFailed(format!("HTTP {status}: {body}")).into());
            }

            debug!(%status, "notification delivered");
            Ok(())
        })
    }
}
