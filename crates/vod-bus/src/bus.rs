//! Connection, topology and consumption.

use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, Consumer, ExchangeKind};
use tracing::{debug, info};

use crate::error::{BusError, BusResult};

/// Broker-side cap on un-acked deliveries per consumer channel. Doubles as
/// the per-process handler concurrency ceiling.
pub const PREFETCH_COUNT: u16 = 5;

/// The single topic exchange every routing key flows through.
pub const EXCHANGE: &str = "newVideoUploaded";

/// Bus configuration.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Broker endpoint.
    pub url: String,
    /// Topic exchange name.
    pub exchange: String,
}

impl BusConfig {
    /// Create config from environment variables.
    pub fn from_env() -> BusResult<Self> {
        Ok(Self {
            url: std::env::var("AMQP_URL")
                .map_err(|_| BusError::config_error("AMQP_URL not set"))?,
            exchange: EXCHANGE.to_string(),
        })
    }
}

/// One AMQP connection plus the channel all operations share.
pub struct Bus {
    connection: Connection,
    channel: Channel,
    exchange: String,
}

impl Bus {
    /// Connect to the broker and open a channel.
    pub async fn connect(config: BusConfig) -> BusResult<Self> {
        let connection = Connection::connect(&config.url, ConnectionProperties::default())
            .await
            .map_err(|e| BusError::connection_failed(e.to_string()))?;
        let channel = connection.create_channel().await?;

        info!("Connected to broker");

        Ok(Self {
            connection,
            channel,
            exchange: config.exchange,
        })
    }

    /// The shared channel.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Exchange name.
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Whether the underlying connection is still usable.
    pub fn is_connected(&self) -> bool {
        self.connection.status().connected()
    }

    /// Declare the exchange, a durable queue, and its bindings. Safe to
    /// repeat on every startup.
    pub async fn declare_topology(&self, queue: &str, routing_keys: &[&str]) -> BusResult<()> {
        self.channel
            .exchange_declare(
                &self.exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        self.channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        for key in routing_keys {
            self.channel
                .queue_bind(
                    queue,
                    &self.exchange,
                    key,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await?;
            debug!("Bound {} to {} via {}", queue, self.exchange, key);
        }

        Ok(())
    }

    /// Open a manual-ack consumer with the prefetch window applied.
    /// Deliveries surface on the returned stream until the channel closes.
    pub async fn consumer(&self, queue: &str, consumer_tag: &str) -> BusResult<Consumer> {
        self.channel
            .basic_qos(PREFETCH_COUNT, BasicQosOptions::default())
            .await?;

        let consumer = self
            .channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        info!("Consuming from {} (prefetch {})", queue, PREFETCH_COUNT);
        Ok(consumer)
    }
}

/// Acknowledge a delivery: artifacts are durable, the job is done.
pub async fn ack(delivery: &lapin::message::Delivery) -> BusResult<()> {
    delivery.acker.ack(BasicAckOptions::default()).await?;
    Ok(())
}

/// Return a delivery to the queue for another attempt.
pub async fn nack_requeue(delivery: &lapin::message::Delivery) -> BusResult<()> {
    delivery
        .acker
        .nack(BasicNackOptions {
            requeue: true,
            ..Default::default()
        })
        .await?;
    Ok(())
}

/// Drop a poison delivery without requeueing.
pub async fn nack_discard(delivery: &lapin::message::Delivery) -> BusResult<()> {
    delivery
        .acker
        .nack(BasicNackOptions {
            requeue: false,
            ..Default::default()
        })
        .await?;
    Ok(())
}
