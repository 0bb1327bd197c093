//! Game configuration and its validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Validation errors for configuration invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Grid must be at least 1x1.
    #[error("grid dimensions must be >= 1 (got {0}x{1})")]
    EmptyGrid(usize, usize),
    /// Minimum delay cannot exceed the base delay.
    #[error("min step delay {min}ms exceeds base step delay {base}ms")]
    DelayOrder { min: u64, base: u64 },
    /// A streak of zero generations would activate oscillation immediately.
    #[error("oscillation streak must be >= 1")]
    ZeroStreak,
    /// A generation cap of zero would end every run before it starts.
    #[error("max_generations must be >= 1 when set")]
    ZeroGenerationCap,
    /// YAML could not be parsed.
    #[error("invalid config: {0}")]
    Parse(String),
}

/// Step pacing in milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between generations at speed multiplier 1.0.
    pub base_step_delay_ms: u64,
    /// Floor the speed upgrade cannot go below.
    pub min_step_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base_step_delay_ms: 50,
            min_step_delay_ms: 5,
        }
    }
}

impl TimingConfig {
    /// `max(min, base / speed)`. Non-positive speeds fall back to the base delay.
    pub fn step_delay(&self, speed: f64) -> Duration {
        let base = self.base_step_delay_ms as f64;
        let scaled = if speed.is_finite() && speed > 0.0 {
            base / speed
        } else {
            base
        };
        let ms = scaled.max(self.min_step_delay_ms as f64);
        Duration::from_micros((ms * 1000.0).round() as u64)
    }
}

/// Thresholds of the low-change oscillation heuristic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillationConfig {
    /// A generation changing at most this many cells (and at least one) counts as low-change.
    pub low_change_threshold: usize,
    /// Consecutive low-change generations needed to activate.
    pub low_change_streak: u32,
}

impl Default for OscillationConfig {
    fn default() -> Self {
        Self {
            low_change_threshold: 4,
            low_change_streak: 5,
        }
    }
}

/// Top-level game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid_width: usize,
    pub grid_height: usize,
    /// Seed for the run RNG; `None` seeds from entropy.
    pub rng_seed: Option<u64>,
    /// Optional safety cap on generations per run. `None` means unbounded.
    pub max_generations: Option<u64>,
    pub timing: TimingConfig,
    pub oscillation: OscillationConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 40,
            grid_height: 20,
            rng_seed: None,
            max_generations: None,
            timing: TimingConfig::default(),
            oscillation: OscillationConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: GameConfig =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        validate_game_config(&cfg)?;
        debug!(
            width = cfg.grid_width,
            height = cfg.grid_height,
            "loaded game config"
        );
        Ok(cfg)
    }
}

/// Validate a game configuration.
pub fn validate_game_config(cfg: &GameConfig) -> Result<(), ConfigError> {
    if cfg.grid_width == 0 || cfg.grid_height == 0 {
        return Err(ConfigError::EmptyGrid(cfg.grid_width, cfg.grid_height));
    }
    if cfg.timing.min_step_delay_ms > cfg.timing.base_step_delay_ms {
        return Err(ConfigError::DelayOrder {
            min: cfg.timing.min_step_delay_ms,
            base: cfg.timing.base_step_delay_ms,
        });
    }
    if cfg.oscillation.low_change_streak == 0 {
        return Err(ConfigError::ZeroStreak);
    }
    if cfg.max_generations == Some(0) {
        return Err(ConfigError::ZeroGenerationCap);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = GameConfig::default();
        validate_game_config(&cfg).unwrap();
        assert_eq!((cfg.grid_width, cfg.grid_height), (40, 20));
        assert_eq!(cfg.oscillation.low_change_threshold, 4);
        assert_eq!(cfg.oscillation.low_change_streak, 5);
        assert_eq!(cfg.max_generations, None);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "grid_width: 12\nrng_seed: 9\ntiming:\n  base_step_delay_ms: 100\n";
        let cfg = GameConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.grid_width, 12);
        assert_eq!(cfg.grid_height, 20);
        assert_eq!(cfg.rng_seed, Some(9));
        assert_eq!(cfg.timing.base_step_delay_ms, 100);
        assert_eq!(cfg.timing.min_step_delay_ms, 5);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert_eq!(
            GameConfig::from_yaml_str("grid_height: 0"),
            Err(ConfigError::EmptyGrid(40, 0))
        );
        assert!(matches!(
            GameConfig::from_yaml_str("timing:\n  min_step_delay_ms: 500"),
            Err(ConfigError::DelayOrder { min: 500, base: 50 })
        ));
        assert_eq!(
            GameConfig::from_yaml_str("max_generations: 0"),
            Err(ConfigError::ZeroGenerationCap)
        );
        assert!(matches!(
            GameConfig::from_yaml_str("grid_width: [1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn shipped_config_parses() {
        let path =
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/config/game.yaml");
        let cfg = GameConfig::from_yaml_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(cfg.rng_seed, Some(42));
        assert_eq!(
            GameConfig {
                rng_seed: None,
                ..cfg
            },
            GameConfig::default()
        );
    }

    #[test]
    fn step_delay_scales_and_clamps() {
        let t = TimingConfig::default();
        assert_eq!(t.step_delay(1.0), Duration::from_millis(50));
        assert_eq!(t.step_delay(2.0), Duration::from_millis(25));
        assert_eq!(t.step_delay(100.0), Duration::from_millis(5));
        assert_eq!(t.step_delay(0.0), Duration::from_millis(50));
    }
}
