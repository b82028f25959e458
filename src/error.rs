use thiserror::Error;

/// Per-message faults. Every variant ends up in a failure record; none of
/// them stops the processing loop.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Invalid wallet message: {0}")]
    Validation(String),

    #[error("No valid DEX transactions found for this wallet.")]
    EmptyResult,

    #[error("Scoring failed: {0}")]
    Computation(String),
}

/// Faults raised by the message source or sink.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Source drained for now; the loop keeps polling.
    #[error("end of partition")]
    EndOfPartition,

    /// Interrupted system call during poll or receive.
    #[error("interrupted")]
    Interrupted,

    #[error("transport failure: {0}")]
    Fatal(String),
}

impl TransportError {
    /// Whether the loop can keep going after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::EndOfPartition | TransportError::Interrupted)
    }
}

impl From<zmq::Error> for TransportError {
    fn from(e: zmq::Error) -> Self {
        match e {
            zmq::Error::EAGAIN => TransportError::EndOfPartition,
            zmq::Error::EINTR => TransportError::Interrupted,
            other => TransportError::Fatal(other.to_string()),
        }
    }
}

/// Faults starting the processing worker.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("transport was lost by a previous worker")]
    TransportUnavailable,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}
