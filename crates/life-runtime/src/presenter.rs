use crate::controller::RunSummary;
use life_core::Grid;

/// What the presentation layer gets after every step.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub grid: &'a Grid,
    pub generation: u64,
    pub currency: u64,
    pub oscillating: bool,
}

impl FrameView<'_> {
    /// The grid as ASCII, one line per row.
    pub fn ascii(&self) -> String {
        self.grid.render()
    }
}

/// Receiver of frames and edge events. Implemented outside the core (terminal,
/// HUD, tests).
pub trait Presenter {
    fn frame(&mut self, frame: &FrameView<'_>);

    /// Oscillator indicator toggled.
    fn oscillation(&mut self, _active: bool) {}

    fn run_settled(&mut self, _summary: &RunSummary) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn frame(&mut self, _frame: &FrameView<'_>) {}
}
