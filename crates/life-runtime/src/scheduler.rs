//! Serializes input events and generation steps onto one loop.
//!
//! Input is queued and drained at the start of every [`Scheduler::advance`], so
//! an event never observes a half-applied generation. Pacing (sleeping for
//! [`Scheduler::step_delay`]) is the caller's job.

use crate::controller::{
    ControlError, EventOutcome, InputEvent, RunController, RunSummary, StepOutcome,
};
use crate::presenter::{FrameView, Presenter};
use life_econ::OscillationEdge;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::warn;

/// What one [`Scheduler::advance`] did.
#[derive(Debug, Default)]
pub struct Advance {
    pub accepted: Vec<EventOutcome>,
    pub rejected: Vec<(InputEvent, ControlError)>,
    /// The generation computed this tick, if a run was active.
    pub step: Option<StepOutcome>,
}

pub struct Scheduler<P: Presenter> {
    controller: RunController,
    presenter: P,
    queue: VecDeque<InputEvent>,
}

impl<P: Presenter> Scheduler<P> {
    pub fn new(controller: RunController, presenter: P) -> Self {
        Self {
            controller,
            presenter,
            queue: VecDeque::new(),
        }
    }

    /// Queue an event for the next tick.
    pub fn submit(&mut self, event: InputEvent) {
        self.queue.push_back(event);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Apply queued events, then step once if a run is active.
    pub fn advance(&mut self) -> Advance {
        let mut out = Advance::default();
        while let Some(event) = self.queue.pop_front() {
            match self.controller.apply(event.clone()) {
                Ok(outcome) => {
                    match &outcome {
                        EventOutcome::Settled(summary) => self.report_settled(summary),
                        EventOutcome::StampPlaced(p) => {
                            if p.edge == Some(OscillationEdge::Deactivated) {
                                self.presenter.oscillation(false);
                            }
                        }
                        _ => {}
                    }
                    out.accepted.push(outcome);
                }
                Err(e) => {
                    warn!(?event, error = %e, "input rejected");
                    out.rejected.push((event, e));
                }
            }
        }

        if self.controller.is_running() {
            match self.controller.step() {
                Ok(step) => {
                    if let Some(edge) = step.edge {
                        self.presenter.oscillation(edge == OscillationEdge::Activated);
                    }
                    if let Some(summary) = &step.settled {
                        self.report_settled(summary);
                    }
                    out.step = Some(step);
                }
                Err(e) => warn!(error = %e, "step failed"),
            }
        }

        self.present();
        out
    }

    fn report_settled(&mut self, summary: &RunSummary) {
        if summary.oscillation_ended {
            self.presenter.oscillation(false);
        }
        self.presenter.run_settled(summary);
    }

    /// Push the current grid to the presenter.
    pub fn present(&mut self) {
        let frame = FrameView {
            grid: self.controller.grid(),
            generation: self.controller.generation(),
            currency: self.controller.progress().currency,
            oscillating: self.controller.oscillating(),
        };
        self.presenter.frame(&frame);
    }

    /// Delay before the next generation at the current run-speed level.
    pub fn step_delay(&self) -> Duration {
        self.controller
            .effects()
            .step_delay(&self.controller.config().timing)
    }

    pub fn controller(&self) -> &RunController {
        &self.controller
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}
