//! Report delivery back into the chat.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::scribe::core::config::DeliveryConfig;
use crate::scribe::core::errors::{ScribeError, ScribeResult};

/// Boxed future type for delivery operations.
pub type DeliveryFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Request timeout for webhook delivery.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait abstraction over outbound message channels.
pub trait Delivery: Send + Sync {
    /// Send text into a room.
    ///
    /// # Errors
    /// Returns an error if the channel did not accept the message.
    fn deliver(&self, room_topic: &str, text: &str) -> DeliveryFuture<'_, ScribeResult<()>>;
}

/// Build the delivery channel selected by configuration.
///
/// # Errors
/// Returns an error if the HTTP client cannot be built.
pub fn build_delivery(config: &DeliveryConfig) -> ScribeResult<Arc<dyn Delivery>> {
    let delivery: Arc<dyn Delivery> = match &config.webhook_url {
        Some(url) => Arc::new(WebhookDelivery::new(url.clone())?),
        None => Arc::new(LogDelivery),
    };
    Ok(delivery)
}

/// Destination room for a report: the configured alternate room, or the origin.
#[must_use]
pub fn destination<'a>(config: &'a DeliveryConfig, origin_room: &'a str) -> &'a str {
    config.room.as_deref().unwrap_or(origin_room)
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    room_topic: &'a str,
    text: &'a str,
}

/// Posts reports as JSON to a chat gateway webhook.
pub struct WebhookDelivery {
    client: Client,
    url: String,
}

impl WebhookDelivery {
    /// Create a webhook delivery channel.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: String) -> ScribeResult<Self> {
        let client = Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self { client, url })
    }
}

impl Delivery for WebhookDelivery {
    fn deliver(&self, room_topic: &str, text: &str) -> DeliveryFuture<'_, ScribeResult<()>> {
        let room_topic = room_topic.to_string();
        let text = text.to_string();
        Box::pin(async move {
            let payload = WebhookPayload {
                room_topic: &room_topic,
                text: &text,
            };
            let response = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .map_err(|err| ScribeError::Delivery(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ScribeError::Delivery(format!(
                    "webhook returned HTTP {}",
                    status.as_u16()
                )));
            }

            info!(room = %room_topic, chars = text.len(), "Report delivered to webhook");
            Ok(())
        })
    }
}

/// Writes reports to the log; used when no webhook is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDelivery;

impl Delivery for LogDelivery {
    fn deliver(&self, room_topic: &str, text: &str) -> DeliveryFuture<'_, ScribeResult<()>> {
        info!(room = %room_topic, "Report:\n{text}");
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_prefers_alternate_room() {
        let config = DeliveryConfig {
            webhook_url: None,
            room: Some("Minutes".to_string()),
        };
        assert_eq!(destination(&config, "Team"), "Minutes");
        assert_eq!(destination(&DeliveryConfig::default(), "Team"), "Team");
    }

    #[tokio::test]
    async fn test_log_delivery_always_succeeds() {
        let delivery = build_delivery(&DeliveryConfig::default()).unwrap();
        assert!(delivery.deliver("Team", "report").await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_delivery_error() {
        let delivery = WebhookDelivery::new("http://127.0.0.1:9/hook".to_string()).unwrap();
        let result = delivery.deliver("Team", "report").await;
        assert!(matches!(result, Err(ScribeError::Delivery(_))));
    }
}
