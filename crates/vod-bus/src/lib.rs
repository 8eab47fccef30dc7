//! AMQP topic-exchange adapter.
//!
//! This crate provides:
//! - Idempotent exchange/queue/binding declaration
//! - Manual-ack consumption with a prefetch window
//! - Confirmed publishing with bounded linear retry

pub mod bus;
pub mod error;
pub mod publisher;

pub use bus::{ack, nack_discard, nack_requeue, Bus, BusConfig, EXCHANGE, PREFETCH_COUNT};
pub use error::{BusError, BusResult};
pub use publisher::Publisher;

pub use lapin::message::Delivery;
pub use lapin::Consumer;
