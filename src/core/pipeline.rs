use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::core::input::{WalletActivityBatch, peek_wallet_address};
use crate::core::outcome::{FailureRecord, ProcessingOutcome, SuccessRecord};
use crate::core::stats::{ProcessorCounters, StatsSnapshot};
use crate::error::{LifecycleError, ProcessingError};
use crate::scoring::{RejectReason, ScoreEngine, ScoreResult, ScoreVerdict};
use crate::transport::{Destination, Transport};

/// Reported when a payload is too broken to yield an address.
pub const UNKNOWN_WALLET: &str = "unknown";

const PROGRESS_EVERY: u64 = 1000;

/// Owns the consume → score → produce worker.
///
/// Lifecycle is `Stopped → Running → Stopped`. `start` while running and
/// `stop` while stopped are no-ops. Stopping joins the worker, so the
/// in-flight message always finishes; a send that never returns also
/// blocks `stop`.
pub struct StreamProcessor {
    engine: Arc<ScoreEngine>,
    counters: Arc<ProcessorCounters>,
    running: Arc<AtomicBool>,
    poll_timeout: Duration,
    transport: Option<Transport>,
    worker: Option<JoinHandle<Transport>>,
}

/// Read-only view for status reporting from other threads.
#[derive(Clone)]
pub struct StatsHandle {
    counters: Arc<ProcessorCounters>,
    running: Arc<AtomicBool>,
}

impl StatsHandle {
    pub fn snapshot(&self) -> StatsSnapshot {
        self.counters.snapshot(self.running.load(Ordering::Acquire))
    }
}

impl StreamProcessor {
    pub fn new(engine: ScoreEngine, transport: Transport, poll_timeout: Duration) -> Self {
        Self {
            engine: Arc::new(engine),
            counters: Arc::new(ProcessorCounters::new()),
            running: Arc::new(AtomicBool::new(false)),
            poll_timeout,
            transport: Some(transport),
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats_handle().snapshot()
    }

    pub fn stats_handle(&self) -> StatsHandle {
        StatsHandle {
            counters: Arc::clone(&self.counters),
            running: Arc::clone(&self.running),
        }
    }

    /// Spawn the worker. Returns `Ok(false)` if it was already running.
    pub fn start(&mut self) -> Result<bool, LifecycleError> {
        if self.is_running() {
            return Ok(false);
        }
        // A worker that exited on a transport error still holds the transport.
        self.reclaim_worker();

        let transport = self.transport.take().ok_or(LifecycleError::TransportUnavailable)?;
        let engine = Arc::clone(&self.engine);
        let counters = Arc::clone(&self.counters);
        let running = Arc::clone(&self.running);
        let poll_timeout = self.poll_timeout;

        self.running.store(true, Ordering::Release);
        let spawned = std::thread::Builder::new()
            .name("dexscore-worker".into())
            .spawn(move || run_loop(transport, &engine, &counters, &running, poll_timeout));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                info!("Stream processor thread started");
                Ok(true)
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(LifecycleError::Spawn(e))
            }
        }
    }

    /// Signal the worker and wait for it to finish its current iteration.
    pub fn stop(&mut self) {
        if self.worker.is_none() {
            return;
        }
        self.running.store(false, Ordering::Release);
        self.reclaim_worker();
        info!("Stream processor thread stopped");
    }

    fn reclaim_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            match handle.join() {
                Ok(transport) => self.transport = Some(transport),
                Err(_) => error!("Stream processor thread panicked; transport lost"),
            }
        }
    }
}

impl Drop for StreamProcessor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    mut transport: Transport,
    engine: &ScoreEngine,
    counters: &ProcessorCounters,
    running: &AtomicBool,
    poll_timeout: Duration,
) -> Transport {
    info!("Consumer started, waiting for wallet batches...");

    while running.load(Ordering::Acquire) {
        let payload = match transport.source.poll(poll_timeout) {
            Ok(Some(payload)) => payload,
            Ok(None) => continue,
            Err(e) if e.is_transient() => {
                debug!("Transient transport signal: {e}");
                continue;
            }
            Err(e) => {
                error!("Consumer error, stopping: {e}");
                break;
            }
        };

        let outcome = process_message(engine, &payload);
        let destination = if outcome.is_success() {
            Destination::Success
        } else {
            Destination::Failure
        };
        let bytes = match outcome.to_json() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(wallet = %outcome.wallet_address(), "Failed to encode outcome, stopping: {e}");
                break;
            }
        };
        if let Err(e) = transport.sink.send(destination, &bytes) {
            error!(wallet = %outcome.wallet_address(), "Producer error, stopping: {e}");
            break;
        }

        let processed = match outcome {
            ProcessingOutcome::Success(_) => counters.record_success(),
            ProcessingOutcome::Failure(_) => counters.record_failure(),
        };
        if processed % PROGRESS_EVERY == 0 {
            let snap = counters.snapshot(true);
            info!(
                "Processed {} messages ({} ok, {} failed)",
                snap.processed_messages, snap.success_count, snap.failure_count
            );
        }
    }

    running.store(false, Ordering::Release);
    info!("Consumer closed");
    transport
}

/// Decode, score and wrap one payload. Never fails: every fault becomes a
/// failure record.
pub fn process_message(engine: &ScoreEngine, payload: &[u8]) -> ProcessingOutcome {
    let started = Instant::now();
    match score_payload(engine, payload) {
        Ok((wallet, result)) => {
            let elapsed_ms = elapsed_ms(started);
            debug!(wallet = %wallet, score = result.score, elapsed_ms, "Wallet scored");
            ProcessingOutcome::Success(SuccessRecord::new(wallet, result, elapsed_ms))
        }
        Err((wallet, err)) => {
            let elapsed_ms = elapsed_ms(started);
            warn!(wallet = %wallet, elapsed_ms, "Processing failed: {err}");
            ProcessingOutcome::Failure(FailureRecord::new(wallet, err.to_string(), elapsed_ms))
        }
    }
}

fn score_payload(
    engine: &ScoreEngine,
    payload: &[u8],
) -> Result<(String, ScoreResult), (String, ProcessingError)> {
    let batch = WalletActivityBatch::from_slice(payload).map_err(|e| {
        let wallet = peek_wallet_address(payload).unwrap_or_else(|| UNKNOWN_WALLET.to_string());
        (wallet, e)
    })?;
    match score_batch(engine, &batch) {
        Ok(result) => Ok((batch.wallet_address, result)),
        Err(e) => Err((batch.wallet_address, e)),
    }
}

fn score_batch(engine: &ScoreEngine, batch: &WalletActivityBatch) -> Result<ScoreResult, ProcessingError> {
    let verdict = panic::catch_unwind(AssertUnwindSafe(|| engine.score_wallet(batch)))
        .map_err(|payload| ProcessingError::Computation(panic_message(payload.as_ref())))?;

    match verdict {
        ScoreVerdict::Rejected(RejectReason::NoValidTransactions) => Err(ProcessingError::EmptyResult),
        ScoreVerdict::Scored(result) if !result.score.is_finite() => Err(
            ProcessingError::Computation(format!("score is not finite: {}", result.score)),
        ),
        ScoreVerdict::Scored(result) => Ok(result),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic".to_string()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::scoring::holding::WithdrawMatching;
    use crate::transport::memory;
    use serde_json::{Value, json};
    use std::sync::mpsc::{Receiver, Sender};

    type Feed = Sender<Result<Vec<u8>, TransportError>>;
    type Published = Receiver<(Destination, Vec<u8>)>;

    fn wallet_message(wallet: &str, dex: bool) -> Vec<u8> {
        json!({
            "wallet_address": wallet,
            "data": [{
                "protocolType": if dex { "dexes" } else { "lending" },
                "transactions": [
                    {
                        "document_id": "1",
                        "action": "swap",
                        "timestamp": 1703980800,
                        "poolId": "0xpool",
                        "tokenIn": { "amountUSD": 1000.0, "symbol": "USDC" },
                        "tokenOut": { "amountUSD": 1000.0, "symbol": "WETH" }
                    },
                    {
                        "document_id": "2",
                        "action": "deposit",
                        "timestamp": 1703980900,
                        "poolId": "0xpool",
                        "token0": { "amountUSD": 500.0, "symbol": "USDC" },
                        "token1": { "amountUSD": 500.0, "symbol": "WETH" }
                    },
                    {
                        "document_id": "3",
                        "action": "withdraw",
                        "timestamp": 1703981800,
                        "poolId": "0xpool",
                        "token0": { "amountUSD": 250.0, "symbol": "USDC" },
                        "token1": { "amountUSD": 250.0, "symbol": "WETH" }
                    }
                ]
            }]
        })
        .to_string()
        .into_bytes()
    }

    fn make_processor() -> (StreamProcessor, Feed, Published) {
        let (source, feed) = memory::source();
        let (sink, published) = memory::sink();
        let processor = StreamProcessor::new(
            ScoreEngine::with_clock(WithdrawMatching::Reuse, || 1_704_000_000),
            Transport::new(source, sink),
            Duration::from_millis(10),
        );
        (processor, feed, published)
    }

    fn next_published(published: &Published) -> (Destination, Value) {
        let (dest, bytes) = published
            .recv_timeout(Duration::from_secs(5))
            .expect("no outcome published");
        (dest, serde_json::from_slice(&bytes).unwrap())
    }

    fn wait_until_stopped(processor: &StreamProcessor) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while processor.is_running() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn success_then_failure_then_success() {
        let (mut processor, feed, published) = make_processor();
        assert!(processor.start().unwrap());

        feed.send(Ok(wallet_message("0xaaa", true))).unwrap();
        feed.send(Ok(b"{not json".to_vec())).unwrap();
        feed.send(Ok(wallet_message("0xbbb", true))).unwrap();

        let (dest, first) = next_published(&published);
        assert_eq!(dest, Destination::Success);
        assert_eq!(first["wallet_address"], "0xaaa");
        assert_eq!(first["categories"][0]["transaction_count"], 3);
        assert_eq!(first["categories"][0]["features"]["num_swaps"], 1);

        let (dest, second) = next_published(&published);
        assert_eq!(dest, Destination::Failure);
        assert_eq!(second["wallet_address"], UNKNOWN_WALLET);
        assert!(second["error"].as_str().unwrap().starts_with("Invalid wallet message"));

        let (dest, third) = next_published(&published);
        assert_eq!(dest, Destination::Success);
        assert_eq!(third["wallet_address"], "0xbbb");

        processor.stop();
        let stats = processor.stats();
        assert_eq!(stats.processed_messages, 3);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.failure_count, 1);
        assert!(!stats.is_running);
    }

    #[test]
    fn wallet_without_dex_activity_fails() {
        let (mut processor, feed, published) = make_processor();
        processor.start().unwrap();
        feed.send(Ok(wallet_message("0xccc", false))).unwrap();

        let (dest, record) = next_published(&published);
        assert_eq!(dest, Destination::Failure);
        assert_eq!(record["wallet_address"], "0xccc");
        assert_eq!(record["error"], "No valid DEX transactions found for this wallet.");
        processor.stop();
    }

    #[test]
    fn end_of_partition_is_ignored() {
        let (mut processor, feed, published) = make_processor();
        processor.start().unwrap();
        feed.send(Err(TransportError::EndOfPartition)).unwrap();
        feed.send(Ok(wallet_message("0xddd", true))).unwrap();

        let (dest, _) = next_published(&published);
        assert_eq!(dest, Destination::Success);
        assert!(processor.is_running());
        processor.stop();
    }

    #[test]
    fn fatal_transport_error_stops_loop() {
        let (mut processor, feed, _published) = make_processor();
        processor.start().unwrap();
        feed.send(Err(TransportError::Fatal("broker gone".into()))).unwrap();

        wait_until_stopped(&processor);
        assert!(!processor.is_running());
        assert_eq!(processor.stats().processed_messages, 0);
        processor.stop();
    }

    #[test]
    fn closed_sink_is_fatal() {
        let (mut processor, feed, published) = make_processor();
        drop(published);
        processor.start().unwrap();
        feed.send(Ok(wallet_message("0xeee", true))).unwrap();

        wait_until_stopped(&processor);
        assert!(!processor.is_running());
        assert_eq!(processor.stats().processed_messages, 0);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let (mut processor, _feed, _published) = make_processor();
        processor.stop();
        assert!(processor.start().unwrap());
        assert!(!processor.start().unwrap());
        processor.stop();
        processor.stop();
        assert!(!processor.is_running());
    }

    #[test]
    fn restart_after_fatal_error_reuses_transport() {
        let (mut processor, feed, published) = make_processor();
        processor.start().unwrap();
        feed.send(Err(TransportError::Fatal("blip".into()))).unwrap();
        wait_until_stopped(&processor);

        assert!(processor.start().unwrap());
        feed.send(Ok(wallet_message("0xfff", true))).unwrap();
        let (dest, _) = next_published(&published);
        assert_eq!(dest, Destination::Success);
        processor.stop();
    }

    #[test]
    fn stats_handle_sees_worker_progress() {
        let (mut processor, feed, published) = make_processor();
        let handle = processor.stats_handle();
        processor.start().unwrap();
        assert!(handle.snapshot().is_running);

        feed.send(Ok(wallet_message("0x111", true))).unwrap();
        next_published(&published);
        processor.stop();

        let snap = handle.snapshot();
        assert_eq!(snap.processed_messages, 1);
        assert!(!snap.is_running);
    }

    #[test]
    fn panic_in_engine_becomes_failure() {
        let engine = ScoreEngine::with_clock(WithdrawMatching::Reuse, || panic!("clock exploded"));
        let outcome = process_message(&engine, &wallet_message("0x222", true));
        match outcome {
            ProcessingOutcome::Failure(record) => {
                assert_eq!(record.wallet_address, "0x222");
                assert_eq!(record.error, "Scoring failed: clock exploded");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn schema_violation_keeps_wallet_address() {
        let engine = ScoreEngine::default();
        let outcome = process_message(&engine, br#"{"wallet_address": "0x333", "data": {}}"#);
        assert!(!outcome.is_success());
        assert_eq!(outcome.wallet_address(), "0x333");
    }
}
