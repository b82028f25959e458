pub mod memory;
pub mod zmq_io;

use std::time::Duration;

use crate::error::TransportError;

/// Where an outcome record is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Success,
    Failure,
}

/// Inbound side of the stream.
pub trait MessageSource: Send {
    /// Wait up to `timeout` for one message. `Ok(None)` means nothing arrived.
    fn poll(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError>;
}

/// Outbound side of the stream. `send` returns once the transport has
/// accepted or refused the payload.
pub trait MessageSink: Send {
    fn send(&mut self, destination: Destination, payload: &[u8]) -> Result<(), TransportError>;
}

/// A source/sink pair owned by the processing worker.
pub struct Transport {
    pub source: Box<dyn MessageSource>,
    pub sink: Box<dyn MessageSink>,
}

impl Transport {
    pub fn new(source: impl MessageSource + 'static, sink: impl MessageSink + 'static) -> Self {
        Self {
            source: Box::new(source),
            sink: Box::new(sink),
        }
    }
}
