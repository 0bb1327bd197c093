//! Generation stepping for the four-state automaton.
//!
//! Liveness follows Conway's B3/S23 rule. The extra states only record how a
//! cell got where it is, plus the upgrade-driven overpopulation rescue.

use crate::cell::CellState;
use crate::grid::{Grid, GridError};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Probabilities that rescue an overcrowded live cell. Both are expected in
/// `[0, 1]`; capping is the upgrade model's job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SurvivalParams {
    /// Chance any overcrowded live cell stays `Stable`.
    pub general_overpopulation: f64,
    /// Second chance, for cells that were already `Stable`.
    pub stable_overpopulation: f64,
}

/// Per-generation statistics of the grid produced by [`step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStats {
    /// Cells whose state differs from the previous generation.
    pub changed: usize,
    pub new: usize,
    pub stable: usize,
    pub dying: usize,
}

impl StepStats {
    pub fn live(&self) -> usize {
        self.new + self.stable
    }
}

/// Random starting grid: each cell is `New` with probability `density`.
pub fn seed<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    density: f64,
    rng: &mut R,
) -> Result<Grid, GridError> {
    let mut grid = Grid::new(width, height)?;
    let p = density.clamp(0.0, 1.0);
    for y in 0..height {
        for x in 0..width {
            if rng.gen::<f64>() < p {
                grid.set(x, y, CellState::New);
            }
        }
    }
    Ok(grid)
}

/// Live Moore neighbors of `(x, y)` with toroidal wrap.
pub fn neighbor_count(grid: &Grid, x: usize, y: usize) -> u8 {
    let (x, y) = (x as i64, y as i64);
    let mut count = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            if grid.get_wrapped(x + dx, y + dy).is_live() {
                count += 1;
            }
        }
    }
    count
}

/// Unmodified transition for one cell.
pub fn base_rule(state: CellState, neighbors: u8) -> CellState {
    if state.is_live() {
        if neighbors == 2 || neighbors == 3 {
            CellState::Stable
        } else {
            CellState::Dying
        }
    } else if neighbors == 3 {
        CellState::New
    } else {
        CellState::Dead
    }
}

/// Compute the next generation.
///
/// Overcrowded live cells (more than 3 neighbors) that the base rule would kill
/// get a roll against `general_overpopulation`, then, if they were `Stable`, a
/// second roll against `stable_overpopulation`. A probability of zero or less
/// skips its roll entirely, so the RNG is untouched under the plain rule.
pub fn step<R: Rng + ?Sized>(
    grid: &Grid,
    params: &SurvivalParams,
    rng: &mut R,
) -> (Grid, StepStats) {
    let (width, height) = (grid.width(), grid.height());
    let mut next = Vec::with_capacity(width * height);
    let mut stats = StepStats::default();

    for (y, row) in grid.rows().enumerate() {
        for (x, &current) in row.iter().enumerate() {
            let neighbors = neighbor_count(grid, x, y);
            let mut state = base_rule(current, neighbors);
            if state == CellState::Dying && neighbors > 3 && rescued(current, params, rng) {
                state = CellState::Stable;
            }
            if state != current {
                stats.changed += 1;
            }
            match state {
                CellState::New => stats.new += 1,
                CellState::Stable => stats.stable += 1,
                CellState::Dying => stats.dying += 1,
                CellState::Dead => {}
            }
            next.push(state);
        }
    }

    (Grid::from_cells(width, height, next), stats)
}

fn rescued<R: Rng + ?Sized>(current: CellState, params: &SurvivalParams, rng: &mut R) -> bool {
    if params.general_overpopulation > 0.0 && rng.gen::<f64>() < params.general_overpopulation {
        return true;
    }
    current == CellState::Stable
        && params.stable_overpopulation > 0.0
        && rng.gen::<f64>() < params.stable_overpopulation
}
