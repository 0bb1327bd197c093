//! Run state machine: `Idle -> Running -> Idle`. Settlement happens inside the
//! step or end call that finishes the run, so callers only ever see the two
//! resting phases.

use life_core::{
    seed, step, validate_game_config, CellState, ConfigError, GameConfig, Grid, GridError,
    StepStats,
};
use life_econ::{
    buy_named, oscillation_income, pattern_reward, run_end_score, stamp_cost, Effects,
    GenerationIncome, OscillationEdge, OscillationTracker, PlayerProgress, UpgradeCatalog,
    UpgradeError, UpgradeId,
};
use life_patterns::{
    apply_stamp, detect, stamp_targets, PatternCatalog, PatternError, StampCatalog,
};
use persistence::{load_or_default, ProgressStore};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Rejected controller operations. None of them change any state.
#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    #[error("a run is already in progress")]
    AlreadyRunning,
    #[error("no run in progress")]
    NotRunning,
    #[error("no stamp selected")]
    NoStampSelected,
    #[error("coordinates ({0}, {1}) are outside the grid")]
    OutOfBounds(i64, i64),
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("stamp would not change any cell")]
    StampNoEffect,
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    Idle,
    Running,
}

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EndReason {
    /// A generation changed no cells.
    Stable,
    /// `max_generations` reached.
    GenerationCap,
    /// Ended by the player.
    Manual,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EndReason::Stable => "Stable",
            EndReason::GenerationCap => "GenerationCap",
            EndReason::Manual => "Manual",
        })
    }
}

/// Totals of one settled run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_number: u64,
    pub generations: u64,
    pub reason: EndReason,
    /// Balance at settlement minus balance at start.
    pub currency_delta: i64,
    /// Informational end-of-run score; currency was already paid per generation.
    pub score: u64,
    pub pattern_income: u64,
    pub oscillation_income: u64,
    /// The run was still oscillating when it settled.
    pub oscillation_ended: bool,
}

/// Result of one generation.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub generation: u64,
    pub stats: StepStats,
    pub income: GenerationIncome,
    pub edge: Option<OscillationEdge>,
    /// Set when this generation ended the run.
    pub settled: Option<RunSummary>,
}

/// Result of a successful stamp placement.
#[derive(Clone, Debug, PartialEq)]
pub struct StampPlacement {
    pub stamp: &'static str,
    pub cost: u64,
    pub cells_changed: usize,
    /// Deactivation caused by disturbing an oscillating run.
    pub edge: Option<OscillationEdge>,
}

/// Discrete events delivered by the input collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    StartRun,
    EndRun,
    BuyUpgrade(String),
    SelectStamp(String),
    PlaceStamp { x: i64, y: i64 },
}

/// What an accepted input event did.
#[derive(Clone, Debug, PartialEq)]
pub enum EventOutcome {
    Started,
    Settled(RunSummary),
    Purchased { id: UpgradeId, level: u32 },
    StampSelected(&'static str),
    StampPlaced(StampPlacement),
}

/// State that lives for exactly one run.
#[derive(Clone, Debug)]
struct RunSession {
    grid: Grid,
    /// Grid of the previous generation, compared against the next one.
    previous: Option<Grid>,
    generation: u64,
    oscillation: OscillationTracker,
    start_balance: u64,
    earned: GenerationIncome,
}

/// Owns the player progress, the active run and the collaborators the core
/// talks to. All mutations go through this type.
pub struct RunController {
    config: GameConfig,
    upgrades: UpgradeCatalog,
    patterns: PatternCatalog,
    stamps: StampCatalog,
    progress: PlayerProgress,
    store: Box<dyn ProgressStore>,
    rng: ChaCha8Rng,
    phase: RunPhase,
    session: Option<RunSession>,
    /// Stamps placed since the last run, overlaid on the next seed.
    board: Grid,
    /// Grid shown while idle: the last run's final grid plus `board`.
    display: Grid,
    selected_stamp: Option<&'static str>,
    last_summary: Option<RunSummary>,
}

impl RunController {
    /// Validate `config` and load progress from `store` (defaulting when empty
    /// or unreadable).
    pub fn new(
        config: GameConfig,
        upgrades: UpgradeCatalog,
        store: Box<dyn ProgressStore>,
    ) -> Result<Self, ControlError> {
        validate_game_config(&config)?;
        let progress = load_or_default(store.as_ref());
        let rng = match config.rng_seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        let board = Grid::new(config.grid_width, config.grid_height)?;
        info!(
            currency = progress.currency,
            runs = progress.total_runs,
            "controller ready"
        );
        Ok(Self {
            config,
            upgrades,
            patterns: PatternCatalog::standard(),
            stamps: StampCatalog::standard(),
            progress,
            store,
            rng,
            phase: RunPhase::Idle,
            session: None,
            display: board.clone(),
            board,
            selected_stamp: None,
            last_summary: None,
        })
    }

    /// Replace the built-in pattern and stamp catalogs.
    pub fn with_catalogs(mut self, patterns: PatternCatalog, stamps: StampCatalog) -> Self {
        self.patterns = patterns;
        self.stamps = stamps;
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn progress(&self) -> &PlayerProgress {
        &self.progress
    }

    pub fn upgrades(&self) -> &UpgradeCatalog {
        &self.upgrades
    }

    pub fn stamps(&self) -> &StampCatalog {
        &self.stamps
    }

    /// Live grid while running, otherwise the last final grid with any idle
    /// stamps drawn over it.
    pub fn grid(&self) -> &Grid {
        self.session.as_ref().map(|s| &s.grid).unwrap_or(&self.display)
    }

    /// Grid a stamp lands on: the live grid, or the pending idle stamps.
    fn stamp_surface(&self) -> &Grid {
        self.session.as_ref().map(|s| &s.grid).unwrap_or(&self.board)
    }

    pub fn generation(&self) -> u64 {
        self.session.as_ref().map(|s| s.generation).unwrap_or(0)
    }

    pub fn oscillating(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.oscillation.is_active())
            .unwrap_or(false)
    }

    pub fn selected_stamp(&self) -> Option<&'static str> {
        self.selected_stamp
    }

    pub fn last_summary(&self) -> Option<&RunSummary> {
        self.last_summary.as_ref()
    }

    /// Effect values at the current upgrade levels.
    pub fn effects(&self) -> Effects {
        Effects::from_progress(&self.upgrades, &self.progress)
    }

    /// Dispatch one input event.
    pub fn apply(&mut self, event: InputEvent) -> Result<EventOutcome, ControlError> {
        match event {
            InputEvent::StartRun => self.start_run().map(|_| EventOutcome::Started),
            InputEvent::EndRun => self.end_run().map(EventOutcome::Settled),
            InputEvent::BuyUpgrade(id) => {
                let level = self.buy(&id)?;
                let id = id.parse()?;
                Ok(EventOutcome::Purchased { id, level })
            }
            InputEvent::SelectStamp(id) => {
                self.select_stamp(&id).map(EventOutcome::StampSelected)
            }
            InputEvent::PlaceStamp { x, y } => {
                self.place_stamp(x, y).map(EventOutcome::StampPlaced)
            }
        }
    }

    /// Seed a fresh grid and enter `Running`.
    pub fn start_run(&mut self) -> Result<(), ControlError> {
        if self.phase != RunPhase::Idle {
            return Err(ControlError::AlreadyRunning);
        }
        let effects = self.effects();
        let (width, height) = (self.config.grid_width, self.config.grid_height);
        let pending = std::mem::replace(&mut self.board, Grid::new(width, height)?);
        let mut grid = seed(width, height, effects.density, &mut self.rng)?;
        for (x, y) in pending.live_cells() {
            grid.set(x, y, CellState::New);
        }
        info!(
            run = self.progress.total_runs + 1,
            density = effects.density,
            live = grid.live_count(),
            "run started"
        );
        self.session = Some(RunSession {
            grid,
            previous: None,
            generation: 0,
            oscillation: OscillationTracker::new(&self.config.oscillation),
            start_balance: self.progress.currency,
            earned: GenerationIncome::default(),
        });
        self.phase = RunPhase::Running;
        Ok(())
    }

    /// Advance the live grid one generation, pay income and check termination.
    pub fn step(&mut self) -> Result<StepOutcome, ControlError> {
        let effects = self.effects();
        let session = self.session.as_mut().ok_or(ControlError::NotRunning)?;

        let (next, stats) = step(&session.grid, &effects.survival_params(), &mut self.rng);
        let period_two = session.previous.as_ref() == Some(&next);
        session.previous = Some(std::mem::replace(&mut session.grid, next));
        session.generation += 1;

        let report = detect(&session.grid, &self.patterns);
        let edge = session.oscillation.observe(stats.changed, period_two);
        let income = GenerationIncome {
            pattern: pattern_reward(&report, &self.patterns, &effects),
            oscillation: if session.oscillation.is_active() {
                oscillation_income(&effects)
            } else {
                0
            },
        };
        self.progress.credit(income.total());
        session.earned.pattern += income.pattern;
        session.earned.oscillation += income.oscillation;
        if let Some(edge) = edge {
            debug!(generation = session.generation, ?edge, "oscillation edge");
        }

        let generation = session.generation;
        let reason = if stats.changed == 0 {
            Some(EndReason::Stable)
        } else if self.config.max_generations.is_some_and(|cap| generation >= cap) {
            Some(EndReason::GenerationCap)
        } else {
            None
        };
        let settled = reason.and_then(|r| self.settle(r));
        Ok(StepOutcome {
            generation,
            stats,
            income,
            edge,
            settled,
        })
    }

    /// Stop the current run and settle it.
    pub fn end_run(&mut self) -> Result<RunSummary, ControlError> {
        self.settle(EndReason::Manual).ok_or(ControlError::NotRunning)
    }

    fn settle(&mut self, reason: EndReason) -> Option<RunSummary> {
        let mut session = self.session.take()?;
        let oscillation_ended = session.oscillation.disturb().is_some();
        let score = run_end_score(&session.grid, self.effects().multiplier);
        self.progress.total_runs += 1;
        let summary = RunSummary {
            run_number: self.progress.total_runs,
            generations: session.generation,
            reason,
            currency_delta: signed_delta(self.progress.currency, session.start_balance),
            score,
            pattern_income: session.earned.pattern,
            oscillation_income: session.earned.oscillation,
            oscillation_ended,
        };
        info!(
            run = summary.run_number,
            generations = summary.generations,
            %reason,
            delta = summary.currency_delta,
            score,
            total = self.progress.currency,
            "run finished"
        );
        self.persist();
        self.display = session.grid;
        self.last_summary = Some(summary.clone());
        self.phase = RunPhase::Idle;
        Some(summary)
    }

    /// Buy one level of the named upgrade.
    pub fn buy(&mut self, id: &str) -> Result<u32, ControlError> {
        let level = buy_named(&mut self.progress, &self.upgrades, id)?;
        self.persist();
        Ok(level)
    }

    /// Choose the stamp used by [`RunController::place_stamp`].
    pub fn select_stamp(&mut self, id: &str) -> Result<&'static str, ControlError> {
        let stamp = self.stamps.get(id)?;
        self.selected_stamp = Some(stamp.id);
        Ok(stamp.id)
    }

    /// Stamp the selected template with its origin at `(x, y)`. Works on the
    /// live grid while running. While idle the stamp is checked against the
    /// stamps already placed for the next run, not the previous final grid.
    pub fn place_stamp(&mut self, x: i64, y: i64) -> Result<StampPlacement, ControlError> {
        let id = self.selected_stamp.ok_or(ControlError::NoStampSelected)?;
        let (width, height) = (self.config.grid_width as i64, self.config.grid_height as i64);
        if !(0..width).contains(&x) || !(0..height).contains(&y) {
            return Err(ControlError::OutOfBounds(x, y));
        }
        let stamp = self.stamps.get(id)?.clone();
        let (ox, oy) = (x as usize, y as usize);
        let cost = stamp_cost(stamp.base_cost, self.effects().stamp_efficiency);

        if stamp_targets(self.stamp_surface(), &stamp, ox, oy).is_empty() {
            return Err(ControlError::StampNoEffect);
        }
        if !self.progress.try_debit(cost) {
            return Err(ControlError::InsufficientFunds {
                needed: cost,
                available: self.progress.currency,
            });
        }

        let (cells_changed, edge) = match self.session.as_mut() {
            Some(session) => {
                let changed = apply_stamp(&mut session.grid, &stamp, ox, oy);
                (changed, session.oscillation.disturb())
            }
            None => {
                let targets = stamp_targets(&self.board, &stamp, ox, oy);
                for &(tx, ty) in &targets {
                    self.board.set(tx, ty, CellState::New);
                    self.display.set(tx, ty, CellState::New);
                }
                (targets.len(), None)
            }
        };
        info!(stamp = id, x, y, cost, cells_changed, "stamp placed");
        self.persist();
        Ok(StampPlacement {
            stamp: stamp.id,
            cost,
            cells_changed,
            edge,
        })
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.progress) {
            warn!(error = %e, "failed to save progress");
        }
    }
}

fn signed_delta(now: u64, start: u64) -> i64 {
    let d = i128::from(now) - i128::from(start);
    d.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Store whose contents stay visible to the test after the controller takes it.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl ProgressStore for SharedStore {
        fn load(&self) -> anyhow::Result<Option<PlayerProgress>> {
            self.0.borrow().load()
        }
        fn save(&mut self, progress: &PlayerProgress) -> anyhow::Result<()> {
            self.0.borrow_mut().save(progress)
        }
    }

    fn empty_seed_catalog() -> UpgradeCatalog {
        UpgradeCatalog::from_yaml_str(
            "- {id: density, base_cost: 10, cost_factor: 1.5, effect: {base: 0.0, increment: 0.0}}",
        )
        .unwrap()
    }

    fn config() -> GameConfig {
        GameConfig {
            grid_width: 12,
            grid_height: 10,
            rng_seed: Some(7),
            ..Default::default()
        }
    }

    fn controller_with(currency: u64, cfg: GameConfig) -> (RunController, SharedStore) {
        let store = SharedStore::default();
        let mut seeded = store.clone();
        seeded
            .save(&PlayerProgress {
                currency,
                ..Default::default()
            })
            .unwrap();
        let c = RunController::new(cfg, empty_seed_catalog(), Box::new(store.clone())).unwrap();
        (c, store)
    }

    fn saves(store: &SharedStore) -> usize {
        store.0.borrow().save_count()
    }

    #[test]
    fn block_run_settles_as_stable() {
        let (mut c, store) = controller_with(100, config());
        c.select_stamp("block").unwrap();
        let placed = c.place_stamp(4, 4).unwrap();
        assert_eq!(placed.cost, 10);
        assert_eq!(placed.cells_changed, 4);
        assert_eq!(c.progress().currency, 90);

        c.start_run().unwrap();
        assert_eq!(c.phase(), RunPhase::Running);
        assert_eq!(c.grid().count(CellState::New), 4);

        let first = c.step().unwrap();
        assert_eq!(first.stats.changed, 4);
        assert_eq!(first.income.pattern, 1);
        assert!(first.settled.is_none());

        let second = c.step().unwrap();
        let summary = second.settled.expect("stable grid ends the run");
        assert_eq!(summary.reason, EndReason::Stable);
        assert_eq!(summary.generations, 2);
        assert_eq!(summary.currency_delta, 2);
        assert_eq!(summary.score, 4);
        assert_eq!(summary.pattern_income, 2);
        assert!(!summary.oscillation_ended);
        assert_eq!(c.phase(), RunPhase::Idle);
        assert_eq!(c.progress().total_runs, 1);
        assert_eq!(c.progress().currency, 92);
        assert_eq!(c.grid().count(CellState::Stable), 4);
        assert_eq!(c.last_summary(), Some(&summary));
        // fixture, stamp, settlement
        assert_eq!(saves(&store), 3);
    }

    #[test]
    fn blinker_activates_period_two_income() {
        let (mut c, _) = controller_with(15, config());
        c.select_stamp("blinker").unwrap();
        c.place_stamp(5, 5).unwrap();
        assert_eq!(c.progress().currency, 0);
        c.start_run().unwrap();

        let edges: Vec<_> = (0..3).map(|_| c.step().unwrap().edge).collect();
        assert_eq!(edges, vec![None, None, Some(OscillationEdge::Activated)]);
        assert!(c.oscillating());
        assert_eq!(c.progress().currency, 1);

        let fourth = c.step().unwrap();
        assert_eq!(fourth.income.oscillation, 1);
        assert_eq!(fourth.edge, None);

        let summary = c.end_run().unwrap();
        assert_eq!(summary.reason, EndReason::Manual);
        assert_eq!(summary.generations, 4);
        assert_eq!(summary.currency_delta, 2);
        assert_eq!(summary.oscillation_income, 2);
        assert!(summary.oscillation_ended);
        assert!(!c.oscillating());
    }

    #[test]
    fn stamping_a_running_grid_disturbs_oscillation() {
        let (mut c, _) = controller_with(100, config());
        c.select_stamp("blinker").unwrap();
        c.place_stamp(5, 5).unwrap();
        c.start_run().unwrap();
        for _ in 0..3 {
            c.step().unwrap();
        }
        assert!(c.oscillating());

        c.select_stamp("block").unwrap();
        let placed = c.place_stamp(0, 0).unwrap();
        assert_eq!(placed.edge, Some(OscillationEdge::Deactivated));
        assert!(!c.oscillating());
        assert_eq!(c.grid().get(1, 1), Some(CellState::New));
    }

    #[test]
    fn generation_cap_ends_the_run() {
        let cfg = GameConfig {
            max_generations: Some(3),
            ..config()
        };
        let (mut c, _) = controller_with(15, cfg);
        c.select_stamp("blinker").unwrap();
        c.place_stamp(5, 5).unwrap();
        c.start_run().unwrap();
        assert!(c.step().unwrap().settled.is_none());
        assert!(c.step().unwrap().settled.is_none());
        let summary = c.step().unwrap().settled.unwrap();
        assert_eq!(summary.reason, EndReason::GenerationCap);
        assert_eq!(summary.generations, 3);
        // the third generation activated oscillation, settling switches it off
        assert!(summary.oscillation_ended);
    }

    #[test]
    fn operations_in_the_wrong_phase_are_rejected() {
        let (mut c, _) = controller_with(0, config());
        assert_eq!(c.step().unwrap_err(), ControlError::NotRunning);
        assert_eq!(c.end_run().unwrap_err(), ControlError::NotRunning);
        c.start_run().unwrap();
        assert_eq!(c.start_run().unwrap_err(), ControlError::AlreadyRunning);
        assert_eq!(c.generation(), 0);
    }

    #[test]
    fn stamp_errors_leave_state_untouched() {
        let (mut c, store) = controller_with(12, config());
        assert_eq!(c.place_stamp(1, 1).unwrap_err(), ControlError::NoStampSelected);
        assert_eq!(
            c.select_stamp("gun").unwrap_err(),
            ControlError::Pattern(PatternError::UnknownId("gun".into()))
        );
        c.select_stamp("block").unwrap();
        assert_eq!(c.place_stamp(12, 0).unwrap_err(), ControlError::OutOfBounds(12, 0));
        assert_eq!(c.place_stamp(0, -1).unwrap_err(), ControlError::OutOfBounds(0, -1));

        c.place_stamp(2, 2).unwrap();
        assert_eq!(c.progress().currency, 2);
        assert_eq!(c.place_stamp(2, 2).unwrap_err(), ControlError::StampNoEffect);
        assert_eq!(
            c.place_stamp(6, 6).unwrap_err(),
            ControlError::InsufficientFunds {
                needed: 10,
                available: 2
            }
        );
        assert_eq!(c.progress().currency, 2);
        assert_eq!(c.grid().live_count(), 4);
        assert_eq!(saves(&store), 2);
    }

    #[test]
    fn stamps_wrap_at_the_edges() {
        let (mut c, _) = controller_with(100, config());
        c.select_stamp("block").unwrap();
        c.place_stamp(11, 9).unwrap();
        let mut live = c.grid().live_cells();
        live.sort();
        assert_eq!(live, vec![(0, 0), (0, 9), (11, 0), (11, 9)]);
    }

    #[test]
    fn idle_stamps_ignore_the_previous_final_grid() {
        let (mut c, _) = controller_with(100, config());
        c.select_stamp("block").unwrap();
        c.place_stamp(4, 4).unwrap();
        c.start_run().unwrap();
        while c.is_running() {
            c.step().unwrap();
        }
        assert_eq!(c.grid().count(CellState::Stable), 4);

        // same spot as the settled block: the next run still gets all four cells
        let placed = c.place_stamp(4, 4).unwrap();
        assert_eq!(placed.cells_changed, 4);
        assert_eq!(placed.cost, 10);
        assert_eq!(c.grid().count(CellState::New), 4);
        assert_eq!(c.grid().count(CellState::Stable), 0);
        assert_eq!(c.place_stamp(4, 4).unwrap_err(), ControlError::StampNoEffect);

        c.select_stamp("glider").unwrap();
        // three of the glider's cells overlap the pending block
        assert_eq!(c.place_stamp(3, 3).unwrap().cells_changed, 2);

        c.start_run().unwrap();
        assert_eq!(c.grid().live_count(), 6);
        assert_eq!(c.grid().count(CellState::New), 6);
        assert_eq!(c.grid().get(4, 4), Some(CellState::New));
    }

    #[test]
    fn stamp_efficiency_discounts_cost() {
        let (mut c, _) = controller_with(5_000, config());
        for _ in 0..5 {
            c.buy("stamp_efficiency").unwrap();
        }
        let before = c.progress().currency;
        c.select_stamp("glider").unwrap();
        // 50 * (1 - 0.25)
        assert_eq!(c.place_stamp(3, 3).unwrap().cost, 37);
        assert_eq!(c.progress().currency, before - 37);
    }

    #[test]
    fn purchases_persist_and_reject_cleanly() {
        let (mut c, store) = controller_with(0, config());
        assert_eq!(
            c.apply(InputEvent::BuyUpgrade("density".into())).unwrap_err(),
            ControlError::Upgrade(UpgradeError::InsufficientFunds {
                needed: 10,
                available: 0
            })
        );
        assert_eq!(c.progress().level(UpgradeId::Density), 0);
        // only the fixture's own save
        assert_eq!(saves(&store), 1);

        let (mut rich, store) = controller_with(50, config());
        assert_eq!(
            rich.apply(InputEvent::BuyUpgrade("multiplier".into())).unwrap(),
            EventOutcome::Purchased {
                id: UpgradeId::Multiplier,
                level: 1
            }
        );
        assert_eq!(rich.progress().currency, 25);
        assert_eq!(saves(&store), 2);
        assert_eq!(store.0.borrow().load().unwrap(), Some(rich.progress().clone()));
        assert!(matches!(
            rich.apply(InputEvent::BuyUpgrade("laser".into())),
            Err(ControlError::Upgrade(UpgradeError::UnknownId(_)))
        ));
    }

    #[test]
    fn same_seed_same_run() {
        let cfg = GameConfig {
            rng_seed: Some(99),
            ..GameConfig::default()
        };
        let fresh = |cfg: GameConfig| {
            RunController::new(cfg, UpgradeCatalog::standard(), Box::new(MemoryStore::default()))
                .unwrap()
        };
        let mut a = fresh(cfg.clone());
        let mut b = fresh(cfg);
        a.start_run().unwrap();
        b.start_run().unwrap();
        assert!(a.grid().live_count() > 0);
        for _ in 0..20 {
            if !a.is_running() {
                break;
            }
            assert_eq!(a.step().unwrap(), b.step().unwrap());
        }
        assert_eq!(a.grid(), b.grid());
        assert_eq!(a.progress(), b.progress());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = GameConfig {
            grid_width: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            RunController::new(cfg, UpgradeCatalog::standard(), Box::new(MemoryStore::default())),
            Err(ControlError::Config(ConfigError::EmptyGrid(0, 20)))
        ));
    }

    #[test]
    fn negative_delta_when_spending_mid_run() {
        assert_eq!(signed_delta(5, 30), -25);
        assert_eq!(signed_delta(30, 5), 25);
    }
}
