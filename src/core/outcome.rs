use serde::{Deserialize, Serialize};

use crate::core::normalize::DEX_CATEGORY;
use crate::scoring::ScoreResult;
use crate::scoring::sanitize::{FeatureMap, TRANSACTION_COUNT_KEY};

/// Result of processing one inbound message. Exactly one per message.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingOutcome {
    Success(SuccessRecord),
    Failure(FailureRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessRecord {
    pub wallet_address: String,
    /// Composite reputation score with 18 decimals. Not a statistical z-score;
    /// the name is kept for downstream consumers.
    pub zscore: String,
    pub timestamp: i64,
    pub processing_time_ms: u64,
    pub categories: Vec<CategoryScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub score: f64,
    pub transaction_count: usize,
    pub features: FeatureMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub wallet_address: String,
    pub error: String,
    pub timestamp: i64,
    pub processing_time_ms: u64,
}

impl SuccessRecord {
    /// `transaction_count` moves from the feature map to the category entry.
    pub fn new(wallet_address: String, result: ScoreResult, processing_time_ms: u64) -> Self {
        let ScoreResult { score, mut features, transaction_count } = result;
        features.remove(TRANSACTION_COUNT_KEY);
        Self {
            wallet_address,
            zscore: format!("{score:.18}"),
            timestamp: chrono::Utc::now().timestamp(),
            processing_time_ms,
            categories: vec![CategoryScore {
                category: DEX_CATEGORY.to_string(),
                score,
                transaction_count,
                features,
            }],
        }
    }
}

impl FailureRecord {
    pub fn new(wallet_address: String, error: String, processing_time_ms: u64) -> Self {
        Self {
            wallet_address,
            error,
            timestamp: chrono::Utc::now().timestamp(),
            processing_time_ms,
        }
    }
}

impl ProcessingOutcome {
    pub fn wallet_address(&self) -> &str {
        match self {
            ProcessingOutcome::Success(r) => &r.wallet_address,
            ProcessingOutcome::Failure(r) => &r.wallet_address,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success(_))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            ProcessingOutcome::Success(r) => serde_json::to_vec(r),
            ProcessingOutcome::Failure(r) => serde_json::to_vec(r),
        }
    }
}
