use serde::Deserialize;
use serde_json::Value;

use crate::error::ProcessingError;

/// A wallet's activity as delivered on the input stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WalletActivityBatch {
    pub wallet_address: String,
    pub data: Vec<CategoryGroup>,
}

/// Transactions grouped under one protocol category (`"dexes"`, `"lending"`, ...).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryGroup {
    #[serde(rename = "protocolType")]
    pub protocol_type: String,
    pub transactions: Vec<RawTransaction>,
}

/// One transaction entry before normalization. Which token legs are
/// present depends on `action`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTransaction {
    pub document_id: String,
    pub action: String,
    /// Left untyped; unparsable values drop the entry during normalization.
    #[serde(default)]
    pub timestamp: Value,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default, rename = "poolId")]
    pub pool_id: Option<String>,
    #[serde(default, rename = "poolName")]
    pub pool_name: Option<String>,
    #[serde(default, rename = "tokenIn")]
    pub token_in: Option<TokenLeg>,
    #[serde(default, rename = "tokenOut")]
    pub token_out: Option<TokenLeg>,
    #[serde(default)]
    pub token0: Option<TokenLeg>,
    #[serde(default)]
    pub token1: Option<TokenLeg>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenLeg {
    #[serde(default, rename = "amountUSD")]
    pub amount_usd: f64,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl TokenLeg {
    pub fn usd(leg: Option<&TokenLeg>) -> f64 {
        leg.map_or(0.0, |l| l.amount_usd)
    }

    pub fn symbol(leg: Option<&TokenLeg>) -> Option<String> {
        leg.and_then(|l| l.symbol.clone())
    }
}

impl WalletActivityBatch {
    /// Decode and validate an inbound payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self, ProcessingError> {
        serde_json::from_slice(payload).map_err(|e| ProcessingError::Validation(e.to_string()))
    }
}

/// Best-effort wallet address for failure records when validation fails.
pub fn peek_wallet_address(payload: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(payload).ok()?;
    value.get("wallet_address")?.as_str().map(str::to_string)
}
