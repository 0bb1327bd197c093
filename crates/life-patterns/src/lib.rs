#![deny(warnings)]

//! Pattern templates, the still-life detector and player stamps.
//!
//! Detection is first-match-wins over a fixed, ordered catalog: at each origin
//! the templates are tried in catalog order and the first one that fits is
//! credited. Overlapping shapes therefore depend on that order, which is why the
//! catalog is a `Vec` and never a map.

use life_core::{CellState, Grid};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::trace;

/// Errors for catalog construction and lookups.
#[derive(Debug, Error, PartialEq)]
pub enum PatternError {
    /// Two templates share an id.
    #[error("duplicate template id: {0}")]
    DuplicateId(String),
    /// Template has no required cells.
    #[error("template {0} has no cells")]
    EmptyTemplate(String),
    /// A required offset lies outside the declared bounding box.
    #[error("template {id} has offset ({x},{y}) outside its {width}x{height} box")]
    OffsetOutOfBox {
        id: String,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    /// No stamp or pattern with this id.
    #[error("unknown template id: {0}")]
    UnknownId(String),
}

/// A detectable shape. Every offset in `cells` must be `Stable` for a match;
/// the rest of the bounding box is unconstrained.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatternTemplate {
    pub id: &'static str,
    pub width: usize,
    pub height: usize,
    /// `(x, y)` offsets inside the bounding box.
    pub cells: &'static [(usize, usize)],
    /// Currency per instance per generation, before bonus and multiplier.
    pub base_reward: u64,
}

impl PatternTemplate {
    /// First required offset in raster order. Scanning origins are matched against it.
    pub fn anchor(&self) -> (usize, usize) {
        self.cells
            .iter()
            .copied()
            .min_by_key(|&(x, y)| (y, x))
            .unwrap_or((0, 0))
    }

    /// Absolute cells of this template when its anchor sits at `(ox, oy)`, or
    /// `None` if the bounding box would leave the grid. Templates never wrap.
    fn place(&self, grid: &Grid, ox: usize, oy: usize) -> Option<Vec<(usize, usize)>> {
        let (ax, ay) = self.anchor();
        let left = ox.checked_sub(ax)?;
        let top = oy.checked_sub(ay)?;
        if left + self.width > grid.width() || top + self.height > grid.height() {
            return None;
        }
        Some(
            self.cells
                .iter()
                .map(|&(dx, dy)| (left + dx, top + dy))
                .collect(),
        )
    }
}

/// Ordered list of detectable templates.
#[derive(Clone, Debug)]
pub struct PatternCatalog {
    templates: Vec<PatternTemplate>,
}

const POND: &[(usize, usize)] = &[
    (1, 0),
    (2, 0),
    (0, 1),
    (3, 1),
    (0, 2),
    (3, 2),
    (1, 3),
    (2, 3),
];
const LOAF: &[(usize, usize)] = &[(1, 0), (2, 0), (0, 1), (3, 1), (1, 2), (3, 2), (2, 3)];
const BEEHIVE: &[(usize, usize)] = &[(1, 0), (2, 0), (0, 1), (3, 1), (1, 2), (2, 2)];
const SHIP: &[(usize, usize)] = &[(0, 0), (1, 0), (0, 1), (2, 1), (1, 2), (2, 2)];
const BOAT: &[(usize, usize)] = &[(0, 0), (1, 0), (0, 1), (2, 1), (1, 2)];
const TUB: &[(usize, usize)] = &[(1, 0), (0, 1), (2, 1), (1, 2)];
const BLOCK: &[(usize, usize)] = &[(0, 0), (1, 0), (0, 1), (1, 1)];

impl PatternCatalog {
    /// Build a catalog, checking ids are unique and offsets fit their boxes.
    pub fn new(templates: Vec<PatternTemplate>) -> Result<Self, PatternError> {
        let mut seen = BTreeSet::new();
        for t in &templates {
            if !seen.insert(t.id) {
                return Err(PatternError::DuplicateId(t.id.to_string()));
            }
            if t.cells.is_empty() {
                return Err(PatternError::EmptyTemplate(t.id.to_string()));
            }
            if let Some(&(x, y)) = t.cells.iter().find(|&&(x, y)| x >= t.width || y >= t.height) {
                return Err(PatternError::OffsetOutOfBox {
                    id: t.id.to_string(),
                    x,
                    y,
                    width: t.width,
                    height: t.height,
                });
            }
        }
        Ok(Self { templates })
    }

    /// The built-in still-life catalog, larger shapes first so that a shape
    /// containing a smaller one is credited as itself.
    pub fn standard() -> Self {
        let t = |id: &'static str,
                 width: usize,
                 height: usize,
                 cells: &'static [(usize, usize)],
                 base_reward: u64| PatternTemplate {
            id,
            width,
            height,
            cells,
            base_reward,
        };
        Self {
            templates: vec![
                t("pond", 4, 4, POND, 6),
                t("loaf", 4, 4, LOAF, 5),
                t("beehive", 4, 3, BEEHIVE, 4),
                t("ship", 3, 3, SHIP, 4),
                t("boat", 3, 3, BOAT, 3),
                t("tub", 3, 3, TUB, 2),
                t("block", 2, 2, BLOCK, 1),
            ],
        }
    }

    pub fn get(&self, id: &str) -> Option<&PatternTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Templates in detection order.
    pub fn iter(&self) -> impl Iterator<Item = &PatternTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// One detected shape and the cells it consumed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatternInstance {
    pub id: &'static str,
    pub cells: Vec<(usize, usize)>,
}

/// Result of scanning one grid.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DetectionReport {
    counts: Vec<(&'static str, u32)>,
    instances: Vec<PatternInstance>,
}

impl DetectionReport {
    /// Instances of `id`; 0 for templates that were not found or do not exist.
    pub fn count(&self, id: &str) -> u32 {
        self.counts
            .iter()
            .find(|(k, _)| *k == id)
            .map(|&(_, n)| n)
            .unwrap_or(0)
    }

    /// `(id, count)` for every catalog template, in catalog order.
    pub fn counts(&self) -> &[(&'static str, u32)] {
        &self.counts
    }

    pub fn instances(&self) -> &[PatternInstance] {
        &self.instances
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&(_, n)| n).sum()
    }
}

/// Count non-overlapping instances of catalog templates in `grid`.
pub fn detect(grid: &Grid, catalog: &PatternCatalog) -> DetectionReport {
    let (width, height) = (grid.width(), grid.height());
    let mut consumed = vec![false; width * height];
    let mut counts: Vec<(&'static str, u32)> = catalog.iter().map(|t| (t.id, 0)).collect();
    let mut instances = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if consumed[y * width + x] || grid.get(x, y) != Some(CellState::Stable) {
                continue;
            }
            for (idx, template) in catalog.iter().enumerate() {
                let Some(cells) = template.place(grid, x, y) else {
                    continue;
                };
                let matches = cells.iter().all(|&(cx, cy)| {
                    !consumed[cy * width + cx] && grid.get(cx, cy) == Some(CellState::Stable)
                });
                if !matches {
                    continue;
                }
                for &(cx, cy) in &cells {
                    consumed[cy * width + cx] = true;
                }
                counts[idx].1 += 1;
                instances.push(PatternInstance {
                    id: template.id,
                    cells,
                });
                break;
            }
        }
    }

    trace!(found = instances.len(), "pattern scan");
    DetectionReport { counts, instances }
}

/// A player-placed shape of live cells.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StampTemplate {
    pub id: &'static str,
    /// `(x, y)` offsets from the tapped origin.
    pub cells: &'static [(usize, usize)],
    /// Cost before the stamp-efficiency discount.
    pub base_cost: u64,
}

/// Ordered list of stamps the player can select.
#[derive(Clone, Debug)]
pub struct StampCatalog {
    stamps: Vec<StampTemplate>,
}

impl StampCatalog {
    pub fn standard() -> Self {
        let s = |id: &'static str, cells: &'static [(usize, usize)], base_cost: u64| StampTemplate {
            id,
            cells,
            base_cost,
        };
        Self {
            stamps: vec![
                s("block", BLOCK, 10),
                s("blinker", &[(0, 0), (1, 0), (2, 0)], 15),
                s("glider", &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)], 50),
                s("r_pentomino", &[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)], 80),
                s(
                    "lwss",
                    &[
                        (1, 0),
                        (4, 0),
                        (0, 1),
                        (0, 2),
                        (4, 2),
                        (0, 3),
                        (1, 3),
                        (2, 3),
                        (3, 3),
                    ],
                    120,
                ),
            ],
        }
    }

    /// Look up a stamp, surfacing unknown ids as an error.
    pub fn get(&self, id: &str) -> Result<&StampTemplate, PatternError> {
        self.stamps
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| PatternError::UnknownId(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StampTemplate> {
        self.stamps.iter()
    }
}

/// Cells a stamp at `(ox, oy)` would turn live, wrapped toroidally. Cells that
/// are already live are left alone and not listed.
pub fn stamp_targets(
    grid: &Grid,
    stamp: &StampTemplate,
    ox: usize,
    oy: usize,
) -> Vec<(usize, usize)> {
    let mut out: Vec<(usize, usize)> = Vec::with_capacity(stamp.cells.len());
    for &(dx, dy) in stamp.cells {
        let (x, y) = grid.wrap((ox + dx) as i64, (oy + dy) as i64);
        let live = grid.get(x, y).map(CellState::is_live).unwrap_or(true);
        if !live && !out.contains(&(x, y)) {
            out.push((x, y));
        }
    }
    out
}

/// Place a stamp; returns the number of cells that changed.
pub fn apply_stamp(grid: &mut Grid, stamp: &StampTemplate, ox: usize, oy: usize) -> usize {
    let targets = stamp_targets(grid, stamp, ox, oy);
    for &(x, y) in &targets {
        grid.set(x, y, CellState::New);
    }
    targets.len()
}
