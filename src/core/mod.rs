pub mod input;
pub mod normalize;
pub mod outcome;
pub mod pipeline;
pub mod stats;

use serde::{Deserialize, Serialize};

/// A normalized DEX transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub document_id: String,
    pub timestamp: i64, // unix seconds
    pub protocol: Option<String>,
    pub pool_id: Option<String>,
    pub pool_name: Option<String>,
    pub amount_usd: f64,
    pub kind: TxKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum TxKind {
    Swap {
        token_in_symbol: Option<String>,
        token_out_symbol: Option<String>,
    },
    Deposit(LiquidityLeg),
    Withdraw(LiquidityLeg),
    /// Any other action. Counts toward totals and account age only.
    Other { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityLeg {
    pub token0_symbol: Option<String>,
    pub token1_symbol: Option<String>,
}

impl Transaction {
    pub fn action(&self) -> &str {
        match &self.kind {
            TxKind::Swap { .. } => "swap",
            TxKind::Deposit(_) => "deposit",
            TxKind::Withdraw(_) => "withdraw",
            TxKind::Other { name } => name,
        }
    }

    pub fn is_swap(&self) -> bool {
        matches!(self.kind, TxKind::Swap { .. })
    }

    pub fn is_deposit(&self) -> bool {
        matches!(self.kind, TxKind::Deposit(_))
    }

    pub fn is_withdraw(&self) -> bool {
        matches!(self.kind, TxKind::Withdraw(_))
    }
}
