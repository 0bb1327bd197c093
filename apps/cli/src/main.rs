#![deny(warnings)]

//! Headless CLI: load progress, buy upgrades, play runs and save.

use anyhow::{Context, Result};
use chrono::Utc;
use life_core::GameConfig;
use life_econ::{UpgradeCatalog, UpgradeId};
use life_runtime::{
    EventOutcome, FrameView, InputEvent, Presenter, RunController, RunSummary, Scheduler,
};
use persistence::{default_save_path, init_db, record_run, save_progress, JsonFileStore, RunRecord};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    upgrades: Option<PathBuf>,
    save: Option<PathBuf>,
    db: Option<String>,
    runs: u32,
    buys: Vec<String>,
    /// `(stamp id, x, y)` placed before the first run.
    stamps: Vec<(String, i64, i64)>,
    max_steps: Option<u64>,
    fast: bool,
    quiet: bool,
    json: bool,
    shop: bool,
    version: bool,
}

fn parse_stamp(spec: &str) -> Option<(String, i64, i64)> {
    let (id, at) = spec.split_once('@')?;
    let (x, y) = at.split_once(',')?;
    Some((id.to_string(), x.trim().parse().ok()?, y.trim().parse().ok()?))
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Args {
    let mut out = Args {
        runs: 1,
        ..Default::default()
    };
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => out.config = it.next().map(PathBuf::from),
            "--upgrades" => out.upgrades = it.next().map(PathBuf::from),
            "--save" => out.save = it.next().map(PathBuf::from),
            "--db" => out.db = it.next(),
            "--runs" => out.runs = it.next().and_then(|s| s.parse().ok()).unwrap_or(1),
            "--buy" => out.buys.extend(it.next()),
            "--stamp" => out.stamps.extend(it.next().as_deref().and_then(parse_stamp)),
            "--max-steps" => out.max_steps = it.next().and_then(|s| s.parse().ok()),
            "--fast" => out.fast = true,
            "--quiet" => out.quiet = true,
            "--json" => out.json = true,
            "--shop" => out.shop = true,
            "--version" => out.version = true,
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    out
}

/// Redraws the grid in place and prints run summaries.
struct TerminalPresenter {
    frames: bool,
    json: bool,
}

impl Presenter for TerminalPresenter {
    fn frame(&mut self, frame: &FrameView<'_>) {
        if !self.frames {
            return;
        }
        println!(
            "\x1b[2J\x1b[H{}gen {:>4} | currency {}{}",
            frame.ascii(),
            frame.generation,
            frame.currency,
            if frame.oscillating { " | oscillating" } else { "" }
        );
    }

    fn oscillation(&mut self, active: bool) {
        info!(active, "oscillator");
    }

    fn run_settled(&mut self, s: &RunSummary) {
        if self.json {
            match serde_json::to_string(s) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "failed to encode summary"),
            }
        } else {
            println!(
                "Run #{} | {} after {} generations | delta {:+} | patterns {} | oscillation {} \
                 | score {}",
                s.run_number,
                s.reason,
                s.generations,
                s.currency_delta,
                s.pattern_income,
                s.oscillation_income,
                s.score
            );
        }
    }
}

/// `RUST_LOG`-style directives, falling back to `info` when absent or invalid.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

async fn load_config(path: Option<&PathBuf>) -> Result<GameConfig> {
    match path {
        Some(p) => {
            let text = tokio::fs::read_to_string(p)
                .await
                .with_context(|| format!("reading {}", p.display()))?;
            Ok(GameConfig::from_yaml_str(&text)?)
        }
        None => Ok(GameConfig::default()),
    }
}

async fn load_upgrades(path: Option<&PathBuf>) -> Result<UpgradeCatalog> {
    match path {
        Some(p) => {
            let text = tokio::fs::read_to_string(p)
                .await
                .with_context(|| format!("reading {}", p.display()))?;
            Ok(UpgradeCatalog::from_yaml_str(&text)?)
        }
        None => Ok(UpgradeCatalog::standard()),
    }
}

fn print_shop(controller: &RunController) {
    let progress = controller.progress();
    println!("Currency: {}", progress.currency);
    for spec in controller.upgrades().iter() {
        let level = progress.level(spec.id);
        println!(
            "  {:<24} {:<18} lvl {:>3} | effect {:>6.2} | next {}",
            spec.id.as_str(),
            spec.name,
            level,
            spec.effect.value(level),
            spec.cost.cost(level)
        );
    }
}

/// Play one run to settlement, pacing generations unless `fast`.
async fn play_run(
    sched: &mut Scheduler<TerminalPresenter>,
    max_steps: Option<u64>,
    fast: bool,
) -> Option<RunSummary> {
    sched.submit(InputEvent::StartRun);
    let mut steps = 0u64;
    loop {
        sched.advance();
        if !sched.controller().is_running() {
            break;
        }
        steps += 1;
        if max_steps.is_some_and(|m| steps >= m) {
            sched.submit(InputEvent::EndRun);
            continue;
        }
        if !fast {
            tokio::time::sleep(sched.step_delay()).await;
        }
    }
    sched.controller().last_summary().cloned()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .init();

    let args = parse_args(std::env::args().skip(1));
    if args.version {
        println!(
            "ascii-life {} ({} built {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(runs = args.runs, fast = args.fast, "starting CLI");

    let config = load_config(args.config.as_ref()).await?;
    let upgrades = load_upgrades(args.upgrades.as_ref()).await?;
    let save_path = args.save.clone().unwrap_or_else(default_save_path);
    let store = JsonFileStore::new(&save_path);
    let controller = RunController::new(config, upgrades, Box::new(store))?;

    let pool = match &args.db {
        Some(url) => Some(init_db(url).await?),
        None => None,
    };

    let presenter = TerminalPresenter {
        frames: !args.quiet && !args.json,
        json: args.json,
    };
    let mut sched = Scheduler::new(controller, presenter);

    for id in &args.buys {
        sched.submit(InputEvent::BuyUpgrade(id.clone()));
    }
    for (id, x, y) in &args.stamps {
        sched.submit(InputEvent::SelectStamp(id.clone()));
        sched.submit(InputEvent::PlaceStamp { x: *x, y: *y });
    }
    if sched.pending() > 0 {
        let setup = sched.advance();
        for outcome in &setup.accepted {
            if let EventOutcome::Purchased { id, level } = outcome {
                println!("Bought {} -> level {}", id, level);
            }
        }
        for (event, e) in &setup.rejected {
            println!("Rejected {:?}: {}", event, e);
        }
    }

    if args.shop {
        print_shop(sched.controller());
        return Ok(());
    }

    for _ in 0..args.runs {
        let Some(summary) = play_run(&mut sched, args.max_steps, args.fast).await else {
            warn!("run ended without a summary");
            break;
        };
        if let Some(pool) = &pool {
            let record = RunRecord {
                run_number: summary.run_number,
                generations: summary.generations,
                reason: summary.reason.to_string(),
                currency_delta: summary.currency_delta,
                score: summary.score,
                finished_at: Utc::now(),
            };
            record_run(pool, &record).await?;
        }
    }

    let progress = sched.controller().progress();
    if let Some(pool) = &pool {
        save_progress(pool, "default", progress).await?;
    }
    let upgrades_owned = UpgradeId::ALL
        .iter()
        .filter(|&&id| progress.level(id) > 0)
        .count();
    println!(
        "Progress | currency: {} | runs: {} | upgrades owned: {} | saved to {}",
        progress.currency,
        progress.total_runs,
        upgrades_owned,
        save_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Args {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_to_one_paced_run() {
        let a = args(&[]);
        assert_eq!(a.runs, 1);
        assert!(!a.fast);
        assert!(a.buys.is_empty());
    }

    #[test]
    fn parses_repeated_buys_and_stamps() {
        let a = args(&[
            "--buy", "density", "--buy", "multiplier", "--stamp", "glider@3,4", "--stamp", "bad",
            "--runs", "5", "--fast", "--max-steps", "100",
        ]);
        assert_eq!(a.buys, vec!["density", "multiplier"]);
        assert_eq!(a.stamps, vec![("glider".to_string(), 3, 4)]);
        assert_eq!(a.runs, 5);
        assert_eq!(a.max_steps, Some(100));
        assert!(a.fast);
    }

    #[test]
    fn log_filter_honours_debug_directives() {
        use tracing_subscriber::filter::LevelFilter;
        assert_eq!(
            log_filter(Some("debug".into())).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            log_filter(Some("life_runtime=trace".into())).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn stamp_spec_needs_both_coordinates() {
        assert_eq!(parse_stamp("block@1, 2"), Some(("block".into(), 1, 2)));
        assert_eq!(parse_stamp("block@-1,0"), Some(("block".into(), -1, 0)));
        assert_eq!(parse_stamp("block@1"), None);
        assert_eq!(parse_stamp("block"), None);
    }
}
