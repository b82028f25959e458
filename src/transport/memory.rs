use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use super::{Destination, MessageSink, MessageSource};
use crate::error::TransportError;

/// In-process source fed through a channel. Errors can be injected to
/// exercise the loop's transport handling.
pub struct ChannelSource {
    rx: Receiver<Result<Vec<u8>, TransportError>>,
}

pub struct ChannelSink {
    tx: Sender<(Destination, Vec<u8>)>,
}

/// Returns the source and the handle used to feed it.
pub fn source() -> (ChannelSource, Sender<Result<Vec<u8>, TransportError>>) {
    let (tx, rx) = mpsc::channel();
    (ChannelSource { rx }, tx)
}

/// Returns the sink and the receiver that sees everything it publishes.
pub fn sink() -> (ChannelSink, Receiver<(Destination, Vec<u8>)>) {
    let (tx, rx) = mpsc::channel();
    (ChannelSink { tx }, rx)
}

impl MessageSource for ChannelSource {
    fn poll(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => item.map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(TransportError::Fatal("input channel closed".into()))
            }
        }
    }
}

impl MessageSink for ChannelSink {
    fn send(&mut self, destination: Destination, payload: &[u8]) -> Result<(), TransportError> {
        self.tx
            .send((destination, payload.to_vec()))
            .map_err(|_| TransportError::Fatal("output channel closed".into()))
    }
}
