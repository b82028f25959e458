//! Streaming reputation scorer for DEX wallet activity.
//!
//! A worker thread pulls wallet batches from the input stream, scores
//! liquidity-provision and swap behaviour, and publishes one success or
//! failure record per batch.

pub mod config;
pub mod core;
pub mod error;
pub mod scoring;
pub mod transport;
