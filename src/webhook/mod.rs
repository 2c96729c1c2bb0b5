//! Webhook notification payloads and delivery.

pub mod card;
pub mod client;
pub mod error;

pub use card::{deployment_card, test_run_card, Fact, MessageCard, Section};
pub use client::{Transport, WebhookClient};
pub use error::WebhookError;
