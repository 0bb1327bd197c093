//! The persistent player-progress record.

use crate::upgrades::{UpgradeCatalog, UpgradeError, UpgradeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Everything that survives between sessions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProgress {
    pub currency: u64,
    pub total_runs: u64,
    /// Level per upgrade; missing entries are level 0.
    pub levels: BTreeMap<UpgradeId, u32>,
}

impl PlayerProgress {
    pub fn level(&self, id: UpgradeId) -> u32 {
        self.levels.get(&id).copied().unwrap_or(0)
    }

    /// Add currency, saturating at `u64::MAX`.
    pub fn credit(&mut self, amount: u64) {
        self.currency = self.currency.saturating_add(amount);
    }

    /// Remove `amount` if the balance covers it.
    pub fn try_debit(&mut self, amount: u64) -> bool {
        match self.currency.checked_sub(amount) {
            Some(rest) => {
                self.currency = rest;
                true
            }
            None => false,
        }
    }
}

/// Buy one level of `id`. Returns the new level; on failure nothing changes.
pub fn buy(
    progress: &mut PlayerProgress,
    catalog: &UpgradeCatalog,
    id: UpgradeId,
) -> Result<u32, UpgradeError> {
    let level = progress.level(id);
    let cost = catalog.cost(id, level);
    if !progress.try_debit(cost) {
        return Err(UpgradeError::InsufficientFunds {
            needed: cost,
            available: progress.currency,
        });
    }
    let new_level = level + 1;
    progress.levels.insert(id, new_level);
    info!(upgrade = %id, level = new_level, cost, "upgrade purchased");
    Ok(new_level)
}

/// [`buy`] by textual id, surfacing unknown ids.
pub fn buy_named(
    progress: &mut PlayerProgress,
    catalog: &UpgradeCatalog,
    id: &str,
) -> Result<u32, UpgradeError> {
    let id: UpgradeId = id.parse()?;
    buy(progress, catalog, id)
}
