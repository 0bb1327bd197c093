use serde::{Deserialize, Serialize};

/// State of a single grid cell.
///
/// `New` and `Stable` are live for neighbor counting. `Dying` is still drawn but
/// no longer counts as a neighbor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Empty cell.
    #[default]
    Dead,
    /// Born this generation.
    New,
    /// Survived at least one generation.
    Stable,
    /// Scheduled to disappear.
    Dying,
}

impl CellState {
    /// Whether this cell counts toward its neighbors' live totals.
    pub fn is_live(self) -> bool {
        matches!(self, CellState::New | CellState::Stable)
    }

    /// Character used by the ASCII presentation.
    pub fn glyph(self) -> char {
        match self {
            CellState::Dead => ' ',
            CellState::New => '*',
            CellState::Stable => '#',
            CellState::Dying => '.',
        }
    }

    /// Inverse of [`CellState::glyph`]. `'-'` is also accepted for dead cells so
    /// fixtures stay readable.
    pub fn from_glyph(c: char) -> Option<Self> {
        match c {
            ' ' | '-' => Some(CellState::Dead),
            '*' => Some(CellState::New),
            '#' => Some(CellState::Stable),
            '.' => Some(CellState::Dying),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_new_and_stable_are_live() {
        assert!(!CellState::Dead.is_live());
        assert!(CellState::New.is_live());
        assert!(CellState::Stable.is_live());
        assert!(!CellState::Dying.is_live());
    }

    #[test]
    fn glyphs_parse_back() {
        for s in [
            CellState::Dead,
            CellState::New,
            CellState::Stable,
            CellState::Dying,
        ] {
            assert_eq!(CellState::from_glyph(s.glyph()), Some(s));
        }
        assert_eq!(CellState::from_glyph('x'), None);
    }
}
