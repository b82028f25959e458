use std::collections::HashSet;

use super::holding::{SECONDS_PER_DAY, WithdrawMatching, average_holding_days};
use super::{FeatureSet, RawFeature};
use crate::core::Transaction;

/// Liquidity-provision behaviour of a wallet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiquidityFeatures {
    pub total_deposit_usd: f64,
    pub total_withdraw_usd: f64,
    pub num_deposits: usize,
    pub num_withdraws: usize,
    pub withdraw_ratio: f64,
    pub avg_hold_time_days: f64,
    pub account_age_days: f64,
    pub unique_pools: usize,
}

/// Account age and pool count are taken over every transaction, not just
/// deposits and withdraws.
pub fn calculate(txs: &[Transaction], now: i64, matching: WithdrawMatching) -> LiquidityFeatures {
    let deposits: Vec<&Transaction> = txs.iter().filter(|t| t.is_deposit()).collect();
    let withdraws: Vec<&Transaction> = txs.iter().filter(|t| t.is_withdraw()).collect();

    let total_deposit_usd: f64 = deposits.iter().map(|t| t.amount_usd).sum();
    let total_withdraw_usd: f64 = withdraws.iter().map(|t| t.amount_usd).sum();

    let withdraw_ratio = if total_deposit_usd > 0.0 {
        total_withdraw_usd / total_deposit_usd
    } else {
        0.0
    };

    let account_age_days = match (
        txs.iter().map(|t| t.timestamp).min(),
        txs.iter().map(|t| t.timestamp).max(),
    ) {
        (Some(first), Some(last)) => (last - first) as f64 / SECONDS_PER_DAY,
        _ => 0.0,
    };

    let unique_pools = txs
        .iter()
        .filter_map(|t| t.pool_id.as_deref())
        .collect::<HashSet<_>>()
        .len();

    LiquidityFeatures {
        total_deposit_usd,
        total_withdraw_usd,
        num_deposits: deposits.len(),
        num_withdraws: withdraws.len(),
        withdraw_ratio,
        avg_hold_time_days: average_holding_days(&deposits, &withdraws, now, matching),
        account_age_days,
        unique_pools,
    }
}

impl LiquidityFeatures {
    pub fn to_features(&self) -> FeatureSet {
        vec![
            ("total_deposit_usd", RawFeature::Number(self.total_deposit_usd)),
            ("total_withdraw_usd", RawFeature::Number(self.total_withdraw_usd)),
            ("num_deposits", RawFeature::Count(self.num_deposits)),
            ("num_withdraws", RawFeature::Count(self.num_withdraws)),
            ("withdraw_ratio", RawFeature::Number(self.withdraw_ratio)),
            ("avg_hold_time_days", RawFeature::Number(self.avg_hold_time_days)),
            ("account_age_days", RawFeature::Number(self.account_age_days)),
            ("unique_pools", RawFeature::Count(self.unique_pools)),
        ]
    }
}
