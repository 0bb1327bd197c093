#![deny(warnings)]

//! Core simulation types for ASCII Life.
//!
//! This crate holds the four-state toroidal grid, the automaton that advances it
//! one generation at a time, and the game configuration with validation helpers
//! guaranteeing basic invariants.

pub mod automaton;
pub mod cell;
pub mod config;
pub mod grid;

pub use automaton::{base_rule, neighbor_count, seed, step, StepStats, SurvivalParams};
pub use cell::CellState;
pub use config::{validate_game_config, ConfigError, GameConfig, OscillationConfig, TimingConfig};
pub use grid::{Grid, GridError};
