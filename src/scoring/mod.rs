pub mod combine;
pub mod holding;
pub mod liquidity;
pub mod sanitize;
pub mod swap;

use crate::core::Transaction;
use crate::core::input::WalletActivityBatch;
use crate::core::normalize::normalize;
use holding::WithdrawMatching;
use sanitize::FeatureMap;

/// A feature value as produced by the calculators, before sanitization.
/// `Text` and `Labels` are not produced by the current calculators; they
/// complete the set of shapes the sanitizer accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFeature {
    Count(usize),
    Number(f64),
    Text(String),
    Labels(Vec<String>),
}

pub type FeatureSet = Vec<(&'static str, RawFeature)>;

/// Final score for one wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub score: f64,
    pub features: FeatureMap,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreVerdict {
    Scored(ScoreResult),
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing left after category and timestamp filtering.
    NoValidTransactions,
}

/// Runs normalization, both feature calculators, the combiner and the sanitizer.
pub struct ScoreEngine {
    matching: WithdrawMatching,
    /// Unix seconds; open liquidity positions are measured up to this.
    now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
}

impl ScoreEngine {
    pub fn new(matching: WithdrawMatching) -> Self {
        Self::with_clock(matching, || chrono::Utc::now().timestamp())
    }

    pub fn with_clock(
        matching: WithdrawMatching,
        now_fn: impl Fn() -> i64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            matching,
            now_fn: Box::new(now_fn),
        }
    }

    pub fn score_wallet(&self, batch: &WalletActivityBatch) -> ScoreVerdict {
        let txs = normalize(batch);
        if txs.is_empty() {
            return ScoreVerdict::Rejected(RejectReason::NoValidTransactions);
        }
        ScoreVerdict::Scored(self.score_transactions(&txs))
    }

    pub fn score_transactions(&self, txs: &[Transaction]) -> ScoreResult {
        let lp = liquidity::calculate(txs, (self.now_fn)(), self.matching);
        let swaps = swap::calculate(txs);
        let (score, features) = combine::combine(&lp, &swaps);

        ScoreResult {
            score,
            features: sanitize::sanitize(features, txs.len()),
            transaction_count: txs.len(),
        }
    }
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new(WithdrawMatching::default())
    }
}
