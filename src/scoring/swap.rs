use std::collections::HashSet;

use super::{FeatureSet, RawFeature};
use crate::core::{Transaction, TxKind};

/// Trading behaviour of a wallet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SwapFeatures {
    pub total_swap_volume: f64,
    pub num_swaps: usize,
    pub unique_pools_swapped: usize,
    pub avg_swap_size: f64,
    pub token_diversity: usize,
}

pub fn calculate(txs: &[Transaction]) -> SwapFeatures {
    let swaps: Vec<&Transaction> = txs.iter().filter(|t| t.is_swap()).collect();
    if swaps.is_empty() {
        return SwapFeatures::default();
    }

    let total_swap_volume: f64 = swaps.iter().map(|t| t.amount_usd).sum();
    let num_swaps = swaps.len();

    let unique_pools_swapped = swaps
        .iter()
        .filter_map(|t| t.pool_id.as_deref())
        .collect::<HashSet<_>>()
        .len();

    let tokens: HashSet<&str> = swaps
        .iter()
        .flat_map(|t| match &t.kind {
            TxKind::Swap { token_in_symbol, token_out_symbol } => {
                [token_in_symbol.as_deref(), token_out_symbol.as_deref()]
            }
            _ => [None, None],
        })
        .flatten()
        .collect();

    SwapFeatures {
        total_swap_volume,
        num_swaps,
        unique_pools_swapped,
        avg_swap_size: total_swap_volume / num_swaps as f64,
        token_diversity: tokens.len(),
    }
}

impl SwapFeatures {
    pub fn to_features(&self) -> FeatureSet {
        vec![
            ("total_swap_volume", RawFeature::Number(self.total_swap_volume)),
            ("num_swaps", RawFeature::Count(self.num_swaps)),
            ("unique_pools_swapped", RawFeature::Count(self.unique_pools_swapped)),
            ("avg_swap_size", RawFeature::Number(self.avg_swap_size)),
            ("token_diversity", RawFeature::Count(self.token_diversity)),
        ]
    }
}
