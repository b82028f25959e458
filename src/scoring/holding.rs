use serde::Deserialize;

use crate::core::Transaction;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// How deposits are paired with later withdraws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawMatching {
    /// Each deposit takes the earliest later withdraw, even if an earlier
    /// deposit already took it.
    #[default]
    Reuse,
    /// Each withdraw closes at most one deposit, oldest deposit first.
    ConsumeOnce,
}

/// Average liquidity holding time in days. Deposits without a later
/// withdraw are treated as still open and measured up to `now`. A deposit
/// dated after `now` counts as zero seconds held.
pub fn average_holding_days(
    deposits: &[&Transaction],
    withdraws: &[&Transaction],
    now: i64,
    matching: WithdrawMatching,
) -> f64 {
    if deposits.is_empty() {
        return 0.0;
    }

    let total_secs: f64 = match matching {
        WithdrawMatching::Reuse => deposits
            .iter()
            .map(|d| {
                let closed_at = withdraws
                    .iter()
                    .map(|w| w.timestamp)
                    .filter(|&ts| ts > d.timestamp)
                    .min();
                (closed_at.unwrap_or(now) - d.timestamp).max(0) as f64
            })
            .sum(),
        WithdrawMatching::ConsumeOnce => {
            let mut open: Vec<i64> = deposits.iter().map(|d| d.timestamp).collect();
            open.sort_unstable();
            let mut available: Vec<i64> = withdraws.iter().map(|w| w.timestamp).collect();
            available.sort_unstable();

            let mut next = 0;
            open.iter()
                .map(|&deposit_ts| {
                    while next < available.len() && available[next] <= deposit_ts {
                        next += 1;
                    }
                    let closed_at = match available.get(next) {
                        Some(&ts) => {
                            next += 1;
                            ts
                        }
                        None => now,
                    };
                    (closed_at - deposit_ts).max(0) as f64
                })
                .sum()
        }
    };

    total_secs / deposits.len() as f64 / SECONDS_PER_DAY
}
