//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors from the worker runtime itself (not from job processing).
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Bus error: {0}")]
    Bus(#[from] vod_bus::BusError),
}

impl WorkerError {
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }
}

/// What the runtime should do with the delivery after a handler error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Poison message: drop without requeue.
    Discard,
    /// Transient or operator-fixable failure: return to the queue.
    Requeue,
}

/// A job-level failure carrying its delivery disposition.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct JobError {
    message: String,
    disposition: Disposition,
}

impl JobError {
    /// Undecodable or structurally invalid message body.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            disposition: Disposition::Discard,
        }
    }

    /// Processing failure; the delivery goes back to the queue.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            disposition: Disposition::Requeue,
        }
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_discards_failed_requeues() {
        assert_eq!(
            JobError::malformed("bad json").disposition(),
            Disposition::Discard
        );
        assert_eq!(
            JobError::failed("ffmpeg died").disposition(),
            Disposition::Requeue
        );
    }

    #[test]
    fn message_is_displayed() {
        let err = JobError::failed("source object missing");
        assert_eq!(err.to_string(), "source object missing");
    }
}
