//! Per-generation income and run scoring.

use crate::upgrades::Effects;
use life_core::{CellState, Grid, OscillationConfig};
use life_patterns::{DetectionReport, PatternCatalog};
use serde::Serialize;

/// Change of the oscillator state, reported to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OscillationEdge {
    Activated,
    Deactivated,
}

/// Tracks the low-change streak and the oscillator flag over one run.
#[derive(Clone, Debug, PartialEq)]
pub struct OscillationTracker {
    threshold: usize,
    required_streak: u32,
    streak: u32,
    active: bool,
}

impl OscillationTracker {
    pub fn new(cfg: &OscillationConfig) -> Self {
        Self {
            threshold: cfg.low_change_threshold,
            required_streak: cfg.low_change_streak,
            streak: 0,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Consecutive low-change generations so far.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Feed one generation: its changed-cell count and whether it equals the
    /// grid from two generations earlier.
    pub fn observe(&mut self, changed: usize, period_two: bool) -> Option<OscillationEdge> {
        if changed > 0 && changed <= self.threshold {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.streak = 0;
        }
        let oscillating = period_two || self.streak >= self.required_streak;
        match (self.active, oscillating) {
            (false, true) => {
                self.active = true;
                Some(OscillationEdge::Activated)
            }
            (true, false) => {
                self.active = false;
                self.streak = 0;
                Some(OscillationEdge::Deactivated)
            }
            _ => None,
        }
    }

    /// Forget the streak and drop the flag (after a disturbance). Returns the
    /// edge if the flag was set.
    pub fn disturb(&mut self) -> Option<OscillationEdge> {
        self.streak = 0;
        if std::mem::replace(&mut self.active, false) {
            Some(OscillationEdge::Deactivated)
        } else {
            None
        }
    }
}

/// Currency earned in one generation, by channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GenerationIncome {
    pub pattern: u64,
    pub oscillation: u64,
}

impl GenerationIncome {
    pub fn total(&self) -> u64 {
        self.pattern.saturating_add(self.oscillation)
    }
}

/// `floor(multiplier * sum(count * (base_reward + bonus)))`.
pub fn pattern_reward(
    report: &DetectionReport,
    catalog: &PatternCatalog,
    effects: &Effects,
) -> u64 {
    let raw: f64 = catalog
        .iter()
        .map(|t| {
            let n = report.count(t.id);
            if n == 0 {
                0.0
            } else {
                f64::from(n) * (t.base_reward as f64 + effects.pattern_bonus)
            }
        })
        .sum();
    (raw * effects.multiplier).floor().max(0.0) as u64
}

/// Flat credit for one oscillating generation.
pub fn oscillation_income(effects: &Effects) -> u64 {
    effects.oscillator_income.floor().max(0.0) as u64
}

/// Informational end-of-run score: `Stable` cells weigh 1, `New` cells 0.5.
pub fn run_end_score(grid: &Grid, multiplier: f64) -> u64 {
    let raw = grid.count(CellState::Stable) as f64 + 0.5 * grid.count(CellState::New) as f64;
    (raw * multiplier).floor().max(0.0) as u64
}

/// Stamp price after the efficiency discount.
pub fn stamp_cost(base_cost: u64, efficiency: f64) -> u64 {
    let discount = efficiency.clamp(0.0, 1.0);
    (base_cost as f64 * (1.0 - discount)).floor() as u64
}
