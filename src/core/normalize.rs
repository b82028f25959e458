use serde_json::Value;

use crate::core::input::{RawTransaction, TokenLeg, WalletActivityBatch};
use crate::core::{LiquidityLeg, Transaction, TxKind};

/// Category label of the groups this scorer consumes.
pub const DEX_CATEGORY: &str = "dexes";

/// Flatten a wallet batch into DEX transactions. Entries whose timestamp is
/// not a valid unix second count are dropped. Order follows the input, not time.
pub fn normalize(batch: &WalletActivityBatch) -> Vec<Transaction> {
    batch
        .data
        .iter()
        .filter(|group| group.protocol_type == DEX_CATEGORY)
        .flat_map(|group| group.transactions.iter())
        .filter_map(normalize_entry)
        .collect()
}

fn normalize_entry(raw: &RawTransaction) -> Option<Transaction> {
    let timestamp = parse_timestamp(&raw.timestamp)?;

    let (amount_usd, kind) = match raw.action.as_str() {
        "swap" => {
            let usd_in = TokenLeg::usd(raw.token_in.as_ref());
            let usd_out = TokenLeg::usd(raw.token_out.as_ref());
            (
                usd_in.max(usd_out),
                TxKind::Swap {
                    token_in_symbol: TokenLeg::symbol(raw.token_in.as_ref()),
                    token_out_symbol: TokenLeg::symbol(raw.token_out.as_ref()),
                },
            )
        }
        "deposit" | "withdraw" => {
            let amount =
                TokenLeg::usd(raw.token0.as_ref()) + TokenLeg::usd(raw.token1.as_ref());
            let leg = LiquidityLeg {
                token0_symbol: TokenLeg::symbol(raw.token0.as_ref()),
                token1_symbol: TokenLeg::symbol(raw.token1.as_ref()),
            };
            let kind = if raw.action == "deposit" {
                TxKind::Deposit(leg)
            } else {
                TxKind::Withdraw(leg)
            };
            (amount, kind)
        }
        other => (0.0, TxKind::Other { name: other.to_string() }),
    };

    Some(Transaction {
        document_id: raw.document_id.clone(),
        timestamp,
        protocol: raw.protocol.clone(),
        pool_id: raw.pool_id.clone(),
        pool_name: raw.pool_name.clone(),
        amount_usd,
        kind,
    })
}

/// Earliest and latest whole seconds whose nanosecond count fits an `i64`
/// (1677-09-21 to 2262-04-11 UTC).
pub const MIN_TIMESTAMP: i64 = i64::MIN / 1_000_000_000;
pub const MAX_TIMESTAMP: i64 = i64::MAX / 1_000_000_000;

/// Accepts integer seconds, fractional seconds (truncated) and numeric strings,
/// as long as they fall within [`MIN_TIMESTAMP`, `MAX_TIMESTAMP`].
pub fn parse_timestamp(value: &Value) -> Option<i64> {
    let secs = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => float_secs(n.as_f64()?)?,
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i,
                Err(_) => float_secs(s.parse::<f64>().ok()?)?,
            }
        }
        _ => return None,
    };
    (MIN_TIMESTAMP..=MAX_TIMESTAMP).contains(&secs).then_some(secs)
}

fn float_secs(f: f64) -> Option<i64> {
    if !f.is_finite() || f.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(f.trunc() as i64)
}
