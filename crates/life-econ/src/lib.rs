#![deny(warnings)]

//! Economy for ASCII Life: upgrades, player progress and per-generation rewards.
//!
//! This crate provides:
//! - Upgrade cost and effect curves, resolved once from configuration
//! - The persistent player-progress record and the purchase operation
//! - The oscillation tracker and the reward formulas fed by pattern detection

pub mod progress;
pub mod rewards;
pub mod upgrades;

pub use progress::{buy, buy_named, PlayerProgress};
pub use rewards::{
    oscillation_income, pattern_reward, run_end_score, stamp_cost, GenerationIncome,
    OscillationEdge, OscillationTracker,
};
pub use upgrades::{
    CostCurve, EffectCurve, Effects, UpgradeCatalog, UpgradeError, UpgradeId, UpgradeSpec,
};
