use super::FeatureSet;
use super::liquidity::LiquidityFeatures;
use super::swap::SwapFeatures;

pub const LP_WEIGHT: f64 = 0.6;
pub const SWAP_WEIGHT: f64 = 0.4;
pub const MAX_SCORE: f64 = 660.0;

/// Liquidity sub-score in [0, 700]: deposit volume (300) + retention (250) + holding (150).
/// Each component is clamped at both ends, so negative inputs contribute 0.
pub fn lp_score(f: &LiquidityFeatures) -> f64 {
    let volume = (f.total_deposit_usd / 10_000.0 * 300.0).clamp(0.0, 300.0);
    let retention = ((1.0 - f.withdraw_ratio) * 250.0).clamp(0.0, 250.0);
    let holding = (f.avg_hold_time_days / 30.0 * 150.0).clamp(0.0, 150.0);
    volume + retention + holding
}

/// Swap sub-score in [0, 600]: volume (250) + frequency (200) + token diversity (150).
pub fn swap_score(f: &SwapFeatures) -> f64 {
    let volume = (f.total_swap_volume / 50_000.0 * 250.0).clamp(0.0, 250.0);
    let frequency = (f.num_swaps as f64 * 10.0).min(200.0);
    let diversity = (f.token_diversity as f64 * 20.0).min(150.0);
    volume + frequency + diversity
}

/// Weighted final score in [0, 660] plus the merged feature list.
/// The two feature sets use disjoint names.
pub fn combine(lp: &LiquidityFeatures, swap: &SwapFeatures) -> (f64, FeatureSet) {
    let score = lp_score(lp) * LP_WEIGHT + swap_score(swap) * SWAP_WEIGHT;
    let mut features = lp.to_features();
    features.extend(swap.to_features());
    (score, features)
}
