use crate::cell::CellState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building a grid.
#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    /// Width and height must both be at least 1.
    #[error("grid dimensions must be >= 1 (got {width}x{height})")]
    EmptyDimensions { width: usize, height: usize },
    /// Rows of a textual fixture must all have the same length.
    #[error("row {row} has length {len}, expected {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },
    /// Character with no cell state mapping.
    #[error("unknown cell glyph {0:?}")]
    UnknownGlyph(char),
    /// Serialized cell list does not match the declared dimensions.
    #[error("expected {expected} cells, got {got}")]
    CellCount { expected: usize, got: usize },
}

/// Unchecked wire form of a [`Grid`].
#[derive(Deserialize)]
struct GridRepr {
    width: usize,
    height: usize,
    cells: Vec<CellState>,
}

impl TryFrom<GridRepr> for Grid {
    type Error = GridError;

    fn try_from(raw: GridRepr) -> Result<Self, Self::Error> {
        let mut grid = Grid::new(raw.width, raw.height)?;
        if raw.cells.len() != grid.cells.len() {
            return Err(GridError::CellCount {
                expected: grid.cells.len(),
                got: raw.cells.len(),
            });
        }
        grid.cells = raw.cells;
        Ok(grid)
    }
}

/// Fixed-size toroidal grid of cell states, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridRepr")]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<CellState>,
}

impl Grid {
    /// Create an all-dead grid.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![CellState::Dead; width * height],
        })
    }

    /// Build a grid from rows of glyphs (see [`CellState::from_glyph`]).
    pub fn from_rows(rows: &[&str]) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let mut grid = Grid::new(width, height)?;
        for (y, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != width {
                return Err(GridError::RaggedRow {
                    row: y,
                    len,
                    expected: width,
                });
            }
            for (x, c) in row.chars().enumerate() {
                let state = CellState::from_glyph(c).ok_or(GridError::UnknownGlyph(c))?;
                grid.cells[y * width + x] = state;
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at `(x, y)`, or `None` when outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<CellState> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// Set the cell at `(x, y)`. Returns `false` (and does nothing) when out of bounds.
    pub fn set(&mut self, x: usize, y: usize, state: CellState) -> bool {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = state;
            true
        } else {
            false
        }
    }

    /// Map any signed coordinate onto the torus.
    pub fn wrap(&self, x: i64, y: i64) -> (usize, usize) {
        let wx = x.rem_euclid(self.width as i64) as usize;
        let wy = y.rem_euclid(self.height as i64) as usize;
        (wx, wy)
    }

    /// Cell at a signed coordinate, wrapping at both edges.
    pub fn get_wrapped(&self, x: i64, y: i64) -> CellState {
        let (wx, wy) = self.wrap(x, y);
        self.cells[wy * self.width + wx]
    }

    /// Row-major cell slice.
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[CellState]> {
        self.cells.chunks(self.width)
    }

    /// Number of cells in the given state.
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }

    /// Number of live (`New` or `Stable`) cells.
    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_live()).count()
    }

    /// Coordinates of every live cell, row-major.
    pub fn live_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_live())
            .map(|(i, _)| (i % self.width, i / self.width))
            .collect()
    }

    /// ASCII rendering, one `\n`-terminated line per row.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.rows() {
            out.extend(row.iter().map(|c| c.glyph()));
            out.push('\n');
        }
        out
    }

    pub(crate) fn from_cells(width: usize, height: usize, cells: Vec<CellState>) -> Self {
        debug_assert_eq!(cells.len(), width * height);
        Self {
            width,
            height,
            cells,
        }
    }
}
