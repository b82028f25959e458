use std::time::Duration;

use tracing::info;

use super::{Destination, MessageSink, MessageSource, Transport};
use crate::config::TransportConfig;
use crate::error::TransportError;

/// PULL socket reading wallet batches, one JSON document per frame.
pub struct ZmqSource {
    socket: zmq::Socket,
}

/// PUSH sockets for the success and failure streams.
pub struct ZmqSink {
    success: zmq::Socket,
    failure: zmq::Socket,
}

impl ZmqSource {
    pub fn connect(ctx: &zmq::Context, endpoint: &str, identity: &str) -> Result<Self, TransportError> {
        let socket = ctx.socket(zmq::PULL)?;
        if !identity.is_empty() {
            socket.set_identity(identity.as_bytes())?;
        }
        socket.connect(endpoint)?;
        info!(endpoint = %endpoint, "ZMQ input connected");
        Ok(Self { socket })
    }
}

impl MessageSource for ZmqSource {
    fn poll(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        let readable = {
            let mut items = [self.socket.as_poll_item(zmq::POLLIN)];
            zmq::poll(&mut items, timeout.as_millis().min(i64::MAX as u128) as i64)?;
            items[0].is_readable()
        };
        if !readable {
            return Ok(None);
        }
        // EAGAIN here maps to EndOfPartition
        Ok(Some(self.socket.recv_bytes(zmq::DONTWAIT)?))
    }
}

impl ZmqSink {
    pub fn connect(
        ctx: &zmq::Context,
        success_endpoint: &str,
        failure_endpoint: &str,
    ) -> Result<Self, TransportError> {
        let open = |endpoint: &str| -> Result<zmq::Socket, TransportError> {
            let socket = ctx.socket(zmq::PUSH)?;
            socket.connect(endpoint)?;
            info!(endpoint = %endpoint, "ZMQ output connected");
            Ok(socket)
        };
        Ok(Self {
            success: open(success_endpoint)?,
            failure: open(failure_endpoint)?,
        })
    }
}

impl MessageSink for ZmqSink {
    fn send(&mut self, destination: Destination, payload: &[u8]) -> Result<(), TransportError> {
        let socket = match destination {
            Destination::Success => &self.success,
            Destination::Failure => &self.failure,
        };
        // Blocking send: returns once libzmq has queued the frame.
        socket.send(payload, 0).map_err(|e| TransportError::Fatal(e.to_string()))
    }
}

/// Build the ZMQ transport described by the config.
pub fn connect(ctx: &zmq::Context, config: &TransportConfig) -> Result<Transport, TransportError> {
    let source = ZmqSource::connect(ctx, &config.input_endpoint, &config.consumer_group)?;
    let sink = ZmqSink::connect(ctx, &config.success_endpoint, &config.failure_endpoint)?;
    Ok(Transport::new(source, sink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pull_round_trip() {
        let ctx = zmq::Context::new();
        let endpoint = "inproc://dexscore-input";
        let producer = ctx.socket(zmq::PUSH).unwrap();
        producer.bind(endpoint).unwrap();

        let mut source = ZmqSource::connect(&ctx, endpoint, "test-group").unwrap();
        assert!(source.poll(Duration::from_millis(10)).unwrap().is_none());

        producer.send(&b"{\"wallet_address\":\"0x1\"}"[..], 0).unwrap();
        let got = source.poll(Duration::from_millis(1000)).unwrap();
        assert_eq!(got.as_deref(), Some(&b"{\"wallet_address\":\"0x1\"}"[..]));
    }

    #[test]
    fn sink_routes_by_destination() {
        let ctx = zmq::Context::new();
        let ok = ctx.socket(zmq::PULL).unwrap();
        ok.bind("inproc://dexscore-success").unwrap();
        let failed = ctx.socket(zmq::PULL).unwrap();
        failed.bind("inproc://dexscore-failure").unwrap();

        let mut sink =
            ZmqSink::connect(&ctx, "inproc://dexscore-success", "inproc://dexscore-failure").unwrap();
        sink.send(Destination::Failure, b"bad").unwrap();
        sink.send(Destination::Success, b"good").unwrap();

        assert_eq!(ok.recv_bytes(0).unwrap(), b"good");
        assert_eq!(failed.recv_bytes(0).unwrap(), b"bad");
    }
}
