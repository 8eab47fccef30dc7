//! The per-service worker loop.
//!
//! One loop per process: consume a delivery, hand it to the service handler
//! on its own task, then ack or nack according to the outcome. Artifacts are
//! durable before the ack (the handler uploads before returning) and
//! downstream events are published only after the ack.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::{watch, Semaphore};
use tracing::{error, info, warn};
use uuid::Uuid;

use vod_bus::{ack, nack_discard, nack_requeue, Bus, Delivery, Publisher, PREFETCH_COUNT};
use vod_models::Event;

use crate::error::{Disposition, JobError, WorkerError, WorkerResult};

/// Service-specific job processing.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    /// Decode and process one delivery body. Every artifact the job produces
    /// must be durable in the object store before this returns. The returned
    /// events are published after the delivery is acked.
    async fn handle(
        &self,
        body: &[u8],
        shutdown: watch::Receiver<bool>,
    ) -> Result<Vec<Event>, JobError>;
}

/// Worker loop over one queue.
pub struct Worker<H> {
    queue: String,
    consumer_tag: String,
    handler: Arc<H>,
    publisher: Arc<Publisher>,
    semaphore: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
}

impl<H: JobHandler> Worker<H> {
    /// Create a worker for a queue.
    pub fn new(queue: impl Into<String>, handler: H, publisher: Publisher) -> Self {
        let queue = queue.into();
        let consumer_tag = format!("{}-{}", queue, Uuid::new_v4());
        let (shutdown, _) = watch::channel(false);

        Self {
            queue,
            consumer_tag,
            handler: Arc::new(handler),
            publisher: Arc::new(publisher),
            semaphore: Arc::new(Semaphore::new(PREFETCH_COUNT as usize)),
            shutdown,
        }
    }

    /// Signal shutdown: stop accepting deliveries, let in-flight jobs finish.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Consume deliveries until shutdown or channel close, then drain.
    pub async fn run(&self, bus: &Bus) -> WorkerResult<()> {
        let mut consumer = bus.consumer(&self.queue, &self.consumer_tag).await?;
        let mut shutdown_rx = self.shutdown.subscribe();

        info!(queue = %self.queue, "Worker started");

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!(queue = %self.queue, "Shutdown signal received");
                        break;
                    }
                }
                delivery = consumer.next() => {
                    match delivery {
                        Some(Ok(delivery)) => self.dispatch(delivery).await?,
                        Some(Err(e)) => {
                            error!(queue = %self.queue, "Consumer stream error: {}", e);
                            break;
                        }
                        None => {
                            warn!(queue = %self.queue, "Broker channel closed");
                            break;
                        }
                    }
                }
            }
        }

        info!(queue = %self.queue, "Waiting for in-flight jobs to complete");
        self.wait_for_handlers().await;
        info!(queue = %self.queue, "Worker stopped");
        Ok(())
    }

    /// Spawn a handler task for one delivery, bounded by the prefetch-sized
    /// semaphore.
    async fn dispatch(&self, delivery: Delivery) -> WorkerResult<()> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| WorkerError::runtime("semaphore closed"))?;

        let handler = Arc::clone(&self.handler);
        let publisher = Arc::clone(&self.publisher);
        let shutdown = self.shutdown.subscribe();
        let queue = self.queue.clone();

        tokio::spawn(async move {
            let _permit = permit;
            Self::execute(handler, publisher, delivery, shutdown, &queue).await;
        });

        Ok(())
    }

    /// Run the handler with panic isolation, then settle the delivery.
    async fn execute(
        handler: Arc<H>,
        publisher: Arc<Publisher>,
        delivery: Delivery,
        shutdown: watch::Receiver<bool>,
        queue: &str,
    ) {
        // The handler runs on its own task so a panic is contained to this
        // delivery and surfaces as a JoinError instead of taking down the
        // consume loop.
        let body = delivery.data.clone();
        let inner = Arc::clone(&handler);
        let result =
            tokio::spawn(async move { inner.handle(&body, shutdown).await }).await;

        match result {
            Ok(Ok(events)) => {
                if let Err(e) = ack(&delivery).await {
                    error!(queue, "Failed to ack delivery: {}", e);
                    return;
                }
                // Publish failures must not reverse the ack; the control
                // plane reconciles from artifacts already in the store.
                for event in &events {
                    if let Err(e) = publisher.publish(event).await {
                        error!(
                            queue,
                            routing_key = event.routing_key(),
                            video_id = event.video_id(),
                            "Failed to publish event after ack: {}",
                            e
                        );
                    }
                }
            }
            Ok(Err(err)) => match err.disposition() {
                Disposition::Discard => {
                    error!(
                        queue,
                        body = %String::from_utf8_lossy(&delivery.data),
                        "Discarding malformed delivery: {}",
                        err
                    );
                    if let Err(e) = nack_discard(&delivery).await {
                        error!(queue, "Failed to nack delivery: {}", e);
                    }
                }
                Disposition::Requeue => {
                    error!(queue, "Job failed, requeueing: {}", err);
                    if let Err(e) = nack_requeue(&delivery).await {
                        error!(queue, "Failed to nack delivery: {}", e);
                    }
                }
            },
            Err(join_err) => {
                if join_err.is_panic() {
                    error!(queue, "Panic in handler: {}", join_err);
                } else {
                    error!(queue, "Handler task cancelled: {}", join_err);
                }
                if let Err(e) = nack_requeue(&delivery).await {
                    error!(queue, "Failed to nack delivery: {}", e);
                }
            }
        }
    }

    /// Block until every permit is back, i.e. no handler is running.
    async fn wait_for_handlers(&self) {
        loop {
            if self.semaphore.available_permits() == PREFETCH_COUNT as usize {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
