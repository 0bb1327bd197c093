//! Upgrade definitions and their cost/effect curves.

use crate::progress::PlayerProgress;
use life_core::{SurvivalParams, TimingConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors produced by the upgrade model.
#[derive(Debug, Error, PartialEq)]
pub enum UpgradeError {
    /// Identifier does not name an upgrade.
    #[error("unknown upgrade id: {0}")]
    UnknownId(String),
    /// Balance does not cover the next level.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    /// Both `cost_exponent` and `cost_factor` were given.
    #[error("upgrade {0} sets both cost_exponent and cost_factor")]
    AmbiguousCost(String),
    /// Curve parameter would make cost or effect decrease, or is not finite.
    #[error("upgrade {id}: invalid {field}")]
    InvalidCurve { id: String, field: &'static str },
    /// Same upgrade listed twice.
    #[error("duplicate upgrade id: {0}")]
    Duplicate(String),
    /// YAML could not be parsed.
    #[error("invalid upgrade config: {0}")]
    Parse(String),
}

/// Every purchasable upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeId {
    /// Seeding probability of a new run.
    Density,
    /// Global multiplier on pattern reward and run score.
    Multiplier,
    /// Flat currency per generation while oscillating.
    OscillatorIncome,
    /// Added to every pattern's base reward.
    PatternBonus,
    /// Chance an overcrowded cell survives.
    OverpopulationSurvival,
    /// Extra survival chance for overcrowded `Stable` cells.
    StableSurvival,
    /// Speed multiplier shortening the step delay.
    RunSpeed,
    /// Fractional discount on stamp placement.
    StampEfficiency,
}

impl UpgradeId {
    pub const ALL: [UpgradeId; 8] = [
        UpgradeId::Density,
        UpgradeId::Multiplier,
        UpgradeId::OscillatorIncome,
        UpgradeId::PatternBonus,
        UpgradeId::OverpopulationSurvival,
        UpgradeId::StableSurvival,
        UpgradeId::RunSpeed,
        UpgradeId::StampEfficiency,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UpgradeId::Density => "density",
            UpgradeId::Multiplier => "multiplier",
            UpgradeId::OscillatorIncome => "oscillator_income",
            UpgradeId::PatternBonus => "pattern_bonus",
            UpgradeId::OverpopulationSurvival => "overpopulation_survival",
            UpgradeId::StableSurvival => "stable_survival",
            UpgradeId::RunSpeed => "run_speed",
            UpgradeId::StampEfficiency => "stamp_efficiency",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for UpgradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpgradeId {
    type Err = UpgradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpgradeId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UpgradeError::UnknownId(s.to_string()))
    }
}

/// Cost of buying the next level.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum CostCurve {
    /// `floor(base * (level + 1)^exponent)`
    Exponent { base: f64, exponent: f64 },
    /// `floor(base * factor^level)`
    Factor { base: f64, factor: f64 },
    /// `floor(base * (level + 1))`
    Linear { base: f64 },
}

impl CostCurve {
    /// Resolve the curve from whichever parameter is present.
    pub fn resolve(
        id: &str,
        base: f64,
        exponent: Option<f64>,
        factor: Option<f64>,
    ) -> Result<Self, UpgradeError> {
        let invalid = |field| UpgradeError::InvalidCurve {
            id: id.to_string(),
            field,
        };
        if !base.is_finite() || base < 0.0 {
            return Err(invalid("base_cost"));
        }
        match (exponent, factor) {
            (Some(_), Some(_)) => Err(UpgradeError::AmbiguousCost(id.to_string())),
            (Some(e), None) if !e.is_finite() || e < 0.0 => Err(invalid("cost_exponent")),
            (Some(exponent), None) => Ok(CostCurve::Exponent { base, exponent }),
            (None, Some(f)) if !f.is_finite() || f < 1.0 => Err(invalid("cost_factor")),
            (None, Some(factor)) => Ok(CostCurve::Factor { base, factor }),
            (None, None) => Ok(CostCurve::Linear { base }),
        }
    }

    pub fn cost(&self, level: u32) -> u64 {
        let raw = match *self {
            CostCurve::Exponent { base, exponent } => {
                base * (f64::from(level) + 1.0).powf(exponent)
            }
            CostCurve::Factor { base, factor } => base * factor.powi(level as i32),
            CostCurve::Linear { base } => base * (f64::from(level) + 1.0),
        };
        // `as` saturates on overflow and maps NaN to 0.
        raw.floor() as u64
    }
}

/// `base + level * increment`, optionally capped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectCurve {
    pub base: f64,
    pub increment: f64,
    #[serde(default)]
    pub max: Option<f64>,
}

impl EffectCurve {
    pub fn value(&self, level: u32) -> f64 {
        let v = self.base + f64::from(level) * self.increment;
        match self.max {
            Some(cap) => v.min(cap),
            None => v,
        }
    }

    fn validate(&self, id: &str) -> Result<(), UpgradeError> {
        let invalid = |field| UpgradeError::InvalidCurve {
            id: id.to_string(),
            field,
        };
        if !self.base.is_finite() {
            return Err(invalid("effect.base"));
        }
        if !self.increment.is_finite() || self.increment < 0.0 {
            return Err(invalid("effect.increment"));
        }
        if let Some(cap) = self.max {
            if !cap.is_finite() || cap < self.base {
                return Err(invalid("effect.max"));
            }
        }
        Ok(())
    }
}

/// One upgrade's display name and curves.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpgradeSpec {
    pub id: UpgradeId,
    pub name: String,
    pub cost: CostCurve,
    pub effect: EffectCurve,
}

/// Upgrade as written in YAML, before the cost curve is resolved.
#[derive(Debug, Deserialize)]
struct RawUpgradeSpec {
    id: String,
    #[serde(default)]
    name: Option<String>,
    base_cost: f64,
    #[serde(default)]
    cost_exponent: Option<f64>,
    #[serde(default)]
    cost_factor: Option<f64>,
    effect: EffectCurve,
}

/// All upgrades, one spec per [`UpgradeId`].
#[derive(Clone, Debug, PartialEq)]
pub struct UpgradeCatalog {
    specs: Vec<UpgradeSpec>,
}

impl Default for UpgradeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl UpgradeCatalog {
    /// Built-in balance.
    pub fn standard() -> Self {
        let spec = |id: UpgradeId,
                    name: &str,
                    cost: CostCurve,
                    base: f64,
                    increment: f64,
                    max: Option<f64>| UpgradeSpec {
            id,
            name: name.to_string(),
            cost,
            effect: EffectCurve {
                base,
                increment,
                max,
            },
        };
        Self {
            specs: vec![
                spec(
                    UpgradeId::Density,
                    "Seed Density",
                    CostCurve::Factor {
                        base: 10.0,
                        factor: 1.5,
                    },
                    0.3,
                    0.02,
                    Some(0.6),
                ),
                spec(
                    UpgradeId::Multiplier,
                    "Score Multiplier",
                    CostCurve::Exponent {
                        base: 25.0,
                        exponent: 2.0,
                    },
                    1.0,
                    0.1,
                    None,
                ),
                spec(
                    UpgradeId::OscillatorIncome,
                    "Oscillator Income",
                    CostCurve::Factor {
                        base: 20.0,
                        factor: 1.6,
                    },
                    1.0,
                    1.0,
                    None,
                ),
                spec(
                    UpgradeId::PatternBonus,
                    "Pattern Bonus",
                    CostCurve::Exponent {
                        base: 30.0,
                        exponent: 1.8,
                    },
                    0.0,
                    0.5,
                    None,
                ),
                spec(
                    UpgradeId::OverpopulationSurvival,
                    "Crowd Tolerance",
                    CostCurve::Factor {
                        base: 50.0,
                        factor: 1.8,
                    },
                    0.0,
                    0.01,
                    Some(0.25),
                ),
                spec(
                    UpgradeId::StableSurvival,
                    "Stable Roots",
                    CostCurve::Factor {
                        base: 40.0,
                        factor: 1.7,
                    },
                    0.0,
                    0.02,
                    Some(0.5),
                ),
                spec(
                    UpgradeId::RunSpeed,
                    "Run Speed",
                    CostCurve::Linear { base: 15.0 },
                    1.0,
                    0.25,
                    Some(10.0),
                ),
                spec(
                    UpgradeId::StampEfficiency,
                    "Stamp Efficiency",
                    CostCurve::Exponent {
                        base: 60.0,
                        exponent: 1.5,
                    },
                    0.0,
                    0.05,
                    Some(0.9),
                ),
            ],
        }
    }

    /// Parse a YAML list of upgrades. Listed upgrades replace the built-in
    /// ones; upgrades not listed keep their built-in curves.
    pub fn from_yaml_str(text: &str) -> Result<Self, UpgradeError> {
        let raw: Vec<RawUpgradeSpec> =
            serde_yaml::from_str(text).map_err(|e| UpgradeError::Parse(e.to_string()))?;
        let mut catalog = Self::standard();
        let mut seen = BTreeSet::new();
        for r in raw {
            let id: UpgradeId = r.id.parse()?;
            if !seen.insert(id) {
                return Err(UpgradeError::Duplicate(r.id));
            }
            let cost = CostCurve::resolve(&r.id, r.base_cost, r.cost_exponent, r.cost_factor)?;
            r.effect.validate(&r.id)?;
            let slot = &mut catalog.specs[id.index()];
            slot.cost = cost;
            slot.effect = r.effect;
            if let Some(name) = r.name {
                slot.name = name;
            }
        }
        debug!(overrides = seen.len(), "loaded upgrade catalog");
        Ok(catalog)
    }

    pub fn spec(&self, id: UpgradeId) -> &UpgradeSpec {
        &self.specs[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &UpgradeSpec> {
        self.specs.iter()
    }

    pub fn cost(&self, id: UpgradeId, level: u32) -> u64 {
        self.spec(id).cost.cost(level)
    }

    pub fn effect(&self, id: UpgradeId, level: u32) -> f64 {
        self.spec(id).effect.value(level)
    }
}

/// Effect values at the player's current levels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Effects {
    pub density: f64,
    pub multiplier: f64,
    pub oscillator_income: f64,
    pub pattern_bonus: f64,
    pub overpopulation_survival: f64,
    pub stable_survival: f64,
    pub run_speed: f64,
    pub stamp_efficiency: f64,
}

impl Effects {
    pub fn from_progress(catalog: &UpgradeCatalog, progress: &PlayerProgress) -> Self {
        let e = |id| catalog.effect(id, progress.level(id));
        Self {
            density: e(UpgradeId::Density),
            multiplier: e(UpgradeId::Multiplier),
            oscillator_income: e(UpgradeId::OscillatorIncome),
            pattern_bonus: e(UpgradeId::PatternBonus),
            overpopulation_survival: e(UpgradeId::OverpopulationSurvival),
            stable_survival: e(UpgradeId::StableSurvival),
            run_speed: e(UpgradeId::RunSpeed),
            stamp_efficiency: e(UpgradeId::StampEfficiency),
        }
    }

    pub fn survival_params(&self) -> SurvivalParams {
        SurvivalParams {
            general_overpopulation: self.overpopulation_survival,
            stable_overpopulation: self.stable_survival,
        }
    }

    /// Delay between generations at the current run speed.
    pub fn step_delay(&self, timing: &TimingConfig) -> Duration {
        timing.step_delay(self.run_speed)
    }
}
