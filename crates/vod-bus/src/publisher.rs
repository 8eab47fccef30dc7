//! Confirmed publishing with bounded retry.

use std::time::Duration;

use chrono::Utc;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions};
use lapin::publisher_confirm::Confirmation;
use lapin::{BasicProperties, Channel};
use tracing::{debug, warn};
use uuid::Uuid;

use vod_models::Event;

use crate::bus::Bus;
use crate::error::{BusError, BusResult};

/// Publish attempts before giving up.
const PUBLISH_ATTEMPTS: u32 = 3;

/// Publisher with per-message broker confirmation.
///
/// Constructed once per process and handed to each worker loop explicitly.
/// Publishes are serialized through a mutex so confirmations correlate with
/// the message that is in flight on the channel.
pub struct Publisher {
    channel: Channel,
    exchange: String,
    lock: tokio::sync::Mutex<()>,
}

impl Publisher {
    /// Create a publisher on the bus channel and enable confirm mode.
    pub async fn new(bus: &Bus) -> BusResult<Self> {
        let channel = bus.channel().clone();
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;

        Ok(Self {
            channel,
            exchange: bus.exchange().to_string(),
            lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Publish an event under its routing key, waiting for a positive
    /// broker confirmation. Retries up to three times with linear backoff;
    /// callers treat exhaustion as non-fatal (log and continue).
    pub async fn publish(&self, event: &Event) -> BusResult<()> {
        let body = serde_json::to_vec(event)?;
        let routing_key = event.routing_key();

        let mut last_err: Option<BusError> = None;
        for attempt in 1..=PUBLISH_ATTEMPTS {
            match self.publish_once(routing_key, &body).await {
                Ok(()) => {
                    debug!(
                        routing_key,
                        video_id = event.video_id(),
                        "Published event"
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        routing_key,
                        attempt,
                        max_attempts = PUBLISH_ATTEMPTS,
                        "Publish failed: {}",
                        e
                    );
                    last_err = Some(e);
                    if attempt < PUBLISH_ATTEMPTS {
                        tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                    }
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| BusError::publish_failed(format!("{} attempts exhausted", PUBLISH_ATTEMPTS))))
    }

    async fn publish_once(&self, routing_key: &str, body: &[u8]) -> BusResult<()> {
        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_message_id(Uuid::new_v4().to_string().into())
            .with_timestamp(Utc::now().timestamp() as u64);

        let _guard = self.lock.lock().await;

        let confirmation = self
            .channel
            .basic_publish(
                &self.exchange,
                routing_key,
                BasicPublishOptions {
                    mandatory: true,
                    immediate: false,
                },
                body,
                properties,
            )
            .await?
            .await?;

        match confirmation {
            Confirmation::Ack(None) | Confirmation::NotRequested => Ok(()),
            Confirmation::Ack(Some(_)) => Err(BusError::publish_failed(
                "message returned by broker (unroutable)",
            )),
            Confirmation::Nack(_) => Err(BusError::publish_failed("broker nacked publish")),
        }
    }
}
