#![deny(warnings)]

//! Headless Bevy HUD: run frames are pushed into an ECS world and folded into a
//! `HudState` resource by a small schedule.

use bevy_ecs::prelude::*;
use life_core::GameConfig;
use life_econ::{PlayerProgress, UpgradeCatalog};
use life_runtime::{
    ControlError, FrameView, InputEvent, Presenter, RunController, RunSummary, Scheduler,
};
use persistence::MemoryStore;

/// Owned copy of the last frame, waiting for the next schedule run.
#[derive(Resource, Default)]
struct PendingFrame(Option<FrameSnapshot>);

struct FrameSnapshot {
    generation: u64,
    currency: u64,
    oscillating: bool,
    ascii: String,
}

#[derive(Resource, Default)]
struct HudState {
    generation: u64,
    currency: u64,
    oscillating: bool,
    frames: u32,
    runs_settled: u32,
    board: String,
    status: String,
    last_event: String,
}

fn apply_frame_system(mut pending: ResMut<PendingFrame>, mut hud: ResMut<HudState>) {
    if let Some(frame) = pending.0.take() {
        hud.generation = frame.generation;
        hud.currency = frame.currency;
        hud.oscillating = frame.oscillating;
        hud.board = frame.ascii;
        hud.frames = hud.frames.saturating_add(1);
    }
}

fn status_system(mut hud: ResMut<HudState>) {
    hud.status = match (hud.generation, hud.oscillating) {
        (0, _) => "idle".into(),
        (_, true) => "oscillating".into(),
        (_, false) => "running".into(),
    };
}

/// [`Presenter`] backed by an ECS world.
struct EcsPresenter {
    world: World,
    schedule: Schedule,
}

impl EcsPresenter {
    fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(HudState::default());
        world.insert_resource(PendingFrame::default());
        let mut schedule = Schedule::default();
        schedule.add_systems((apply_frame_system, status_system).chain());
        Self { world, schedule }
    }

    fn hud(&self) -> &HudState {
        self.world.resource::<HudState>()
    }
}

impl Presenter for EcsPresenter {
    fn frame(&mut self, frame: &FrameView<'_>) {
        self.world.resource_mut::<PendingFrame>().0 = Some(FrameSnapshot {
            generation: frame.generation,
            currency: frame.currency,
            oscillating: frame.oscillating,
            ascii: frame.ascii(),
        });
        self.schedule.run(&mut self.world);
    }

    fn oscillation(&mut self, active: bool) {
        self.world.resource_mut::<HudState>().last_event = if active {
            "oscillator on".into()
        } else {
            "oscillator off".into()
        };
    }

    fn run_settled(&mut self, summary: &RunSummary) {
        let mut hud = self.world.resource_mut::<HudState>();
        hud.runs_settled = hud.runs_settled.saturating_add(1);
        hud.last_event = format!(
            "run #{} {} ({:+})",
            summary.run_number, summary.reason, summary.currency_delta
        );
    }
}

fn demo_scheduler(
    config: GameConfig,
    upgrades: UpgradeCatalog,
    currency: u64,
) -> Result<Scheduler<EcsPresenter>, ControlError> {
    let store = MemoryStore::with_progress(PlayerProgress {
        currency,
        ..Default::default()
    });
    let controller = RunController::new(config, upgrades, Box::new(store))?;
    Ok(Scheduler::new(controller, EcsPresenter::new()))
}

fn main() -> Result<(), ControlError> {
    let config = GameConfig {
        rng_seed: Some(42),
        max_generations: Some(200),
        ..GameConfig::default()
    };
    let mut sched = demo_scheduler(config, UpgradeCatalog::standard(), 100)?;
    sched.submit(InputEvent::SelectStamp("glider".into()));
    sched.submit(InputEvent::PlaceStamp { x: 2, y: 2 });
    sched.submit(InputEvent::StartRun);
    // No pacing: headless demo
    loop {
        sched.advance();
        if !sched.controller().is_running() {
            break;
        }
    }
    let hud = sched.presenter().hud();
    print!("{}", hud.board);
    println!(
        "game-frontend: HUD ready | frames={} runs={} currency={} status={} last={}",
        hud.frames, hud.runs_settled, hud.currency, hud.status, hud.last_event
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_seed() -> UpgradeCatalog {
        UpgradeCatalog::from_yaml_str(
            "- {id: density, base_cost: 10, cost_factor: 1.5, effect: {base: 0.0, increment: 0.0}}",
        )
        .unwrap()
    }

    fn small() -> GameConfig {
        GameConfig {
            grid_width: 10,
            grid_height: 8,
            rng_seed: Some(1),
            ..GameConfig::default()
        }
    }

    #[test]
    fn smoke_initializes_and_ticks_once() {
        let mut p = EcsPresenter::new();
        let grid = life_core::Grid::from_rows(&["##", "##"]).unwrap();
        p.frame(&FrameView {
            grid: &grid,
            generation: 1,
            currency: 3,
            oscillating: false,
        });
        let hud = p.hud();
        assert_eq!(hud.frames, 1);
        assert_eq!(hud.generation, 1);
        assert_eq!(hud.currency, 3);
        assert_eq!(hud.status, "running");
        assert_eq!(hud.board, "##\n##\n");
    }

    #[test]
    fn blinker_run_shows_oscillation_then_settles() {
        let mut sched = demo_scheduler(small(), empty_seed(), 100).unwrap();
        sched.submit(InputEvent::SelectStamp("blinker".into()));
        sched.submit(InputEvent::PlaceStamp { x: 3, y: 3 });
        sched.submit(InputEvent::StartRun);
        for _ in 0..4 {
            sched.advance();
        }
        {
            let hud = sched.presenter().hud();
            assert!(hud.oscillating);
            assert_eq!(hud.status, "oscillating");
            assert_eq!(hud.last_event, "oscillator on");
        }

        sched.submit(InputEvent::EndRun);
        sched.advance();
        let hud = sched.presenter().hud();
        assert_eq!(hud.runs_settled, 1);
        assert_eq!(hud.status, "idle");
        assert!(hud.last_event.starts_with("run #1 Manual"));
    }
}
