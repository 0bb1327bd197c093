#![deny(warnings)]

//! Run orchestration: the run state machine, the input/step loop and the
//! presentation seam.
//!
//! The loop is single threaded. [`Scheduler::advance`] drains queued
//! [`InputEvent`]s and then computes at most one generation, so the grid and
//! the player's balance are only ever touched from one place.

mod controller;
mod presenter;
mod scheduler;

pub use controller::{
    ControlError, EndReason, EventOutcome, InputEvent, RunController, RunPhase, RunSummary,
    StampPlacement, StepOutcome,
};
pub use presenter::{FrameView, NullPresenter, Presenter};
pub use scheduler::{Advance, Scheduler};
