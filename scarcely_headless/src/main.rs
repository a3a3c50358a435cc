// CLI entry point for running Scarcely without a renderer.
//
// Drives `SimState::step()` at a fixed `dt` from a scripted route, and owns
// everything the simulation library refuses to touch: the filesystem, the
// clock (for fresh seeds), and logging setup. The save file is the same
// JSON the browser build keeps in local storage.
//
// Usage:
//   scarcely run [OPTIONS]
//     --seed <SEED>        World seed for a new game (default: from the clock)
//     --save <PATH>        Save file to resume from and write back to
//     --ticks <N>          Steps to run (default: 600)
//     --dt <SECONDS>       Step length (default: 0.1)
//     --config <PATH>      GameConfig JSON; missing fields use defaults
//     --route <SCRIPT>     Input route, see `route.rs` (default: stand still)
//     --snapshot           Print the final render snapshot as JSON
//   scarcely export --save <PATH> [--out <PATH>]
//   scarcely import <FILE> --save <PATH>
//
// Logging goes to stderr through `tracing-subscriber`; `RUST_LOG` overrides
// the default filter.

mod route;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use route::Route;
use scarcely_sim::config::GameConfig;
use scarcely_sim::event::SimEventKind;
use scarcely_sim::save::{self, EXPORT_FILE_NAME};
use scarcely_sim::sim::SimState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "scarcely_sim=info,scarcely_headless=info";

#[derive(Parser)]
#[command(name = "scarcely")]
#[command(about = "Headless host for the Scarcely survival walk", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the simulation for a number of ticks
    Run(RunArgs),

    /// Write a normalized copy of a save for sharing
    Export {
        #[arg(long)]
        save: PathBuf,
        #[arg(long, default_value = EXPORT_FILE_NAME)]
        out: PathBuf,
    },

    /// Replace a save with an exported file after validating it
    Import {
        file: PathBuf,
        #[arg(long)]
        save: PathBuf,
    },
}

#[derive(Parser)]
struct RunArgs {
    #[arg(long)]
    seed: Option<String>,
    #[arg(long)]
    save: Option<PathBuf>,
    #[arg(long, default_value_t = 600)]
    ticks: usize,
    #[arg(long, default_value_t = 0.1)]
    dt: f64,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    route: Option<String>,
    #[arg(long)]
    snapshot: bool,
}

fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Run(args) => run(args),
        Command::Export { save, out } => export(&save, &out),
        Command::Import { file, save } => import(&file, &save),
    }
}

/// A fresh seed from the current time, in base 36.
fn clock_seed() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    to_base36(millis)
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

/// Resume from `save` if it exists, otherwise start a new game.
fn load_state(args: &RunArgs, config: GameConfig) -> Result<SimState> {
    let fresh_seed = args.seed.clone().unwrap_or_else(clock_seed);
    let raw = match &args.save {
        Some(path) if path.exists() => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read save {}", path.display()))?,
        ),
        _ => None,
    };
    if raw.is_some() && args.seed.is_some() {
        warn!("--seed is ignored when resuming an existing save");
    }
    Ok(save::load_or_new(raw.as_deref(), config, &fresh_seed))
}

fn write_save(state: &SimState, path: &Path) -> Result<()> {
    let json = state.to_json().context("failed to serialize save")?;
    fs::write(path, json).with_context(|| format!("failed to write save {}", path.display()))
}

/// Event tallies for the end-of-run summary.
#[derive(Default)]
struct Tally {
    counts: BTreeMap<&'static str, usize>,
}

impl Tally {
    fn record(&mut self, kind: &SimEventKind) {
        let name = match kind {
            SimEventKind::ChunkDiscovered { .. } => "chunks discovered",
            SimEventKind::ChunkRestored { .. } => "chunks restored",
            SimEventKind::EntitiesCulled { .. } => "culls",
            SimEventKind::ItemPickedUp { .. } => "items picked up",
            SimEventKind::PickupRefused { .. } => "pickups refused",
            SimEventKind::ItemUsed { .. } => "items used",
            SimEventKind::ItemDropped { .. } => "items dropped",
            SimEventKind::DialogueStarted { .. } => "dialogues started",
            SimEventKind::EncounterCompleted { .. } => "encounters completed",
            SimEventKind::KeepsakeReceived { .. } => "keepsakes received",
            SimEventKind::Collapsed { .. } => "collapses",
            SimEventKind::Recovered => "recoveries",
        };
        *self.counts.entry(name).or_default() += 1;
    }
}

fn run(args: RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let route = match &args.route {
        Some(script) => Route::parse(script)?,
        None => Route::default(),
    };
    let mut state = load_state(&args, config)?;
    info!(
        seed = state.world.seed.as_str(),
        ticks = args.ticks,
        dt = args.dt,
        route_period = route.period(),
        "starting run"
    );

    let mut tally = Tally::default();
    for tick in 0..args.ticks {
        let result = state.step(&route.frame(tick), args.dt);
        for event in &result.events {
            tally.record(&event.kind);
        }
    }

    if let Some(path) = &args.save {
        write_save(&state, path)?;
        info!(path = %path.display(), "save written");
    }

    let player = &state.player;
    println!("seed:      {}", state.world.seed);
    println!("position:  ({:.1}, {:.1})", player.x, player.y);
    println!(
        "needs:     hunger {:.1}  thirst {:.1}  warmth {:.1}",
        player.hunger, player.thirst, player.warmth
    );
    println!(
        "backpack:  {}/{} items, {:.2} carried",
        player.inventory.len(),
        player.max_inventory,
        player.carry_weight
    );
    println!("collapsed: {}", player.is_collapsed);
    for (name, count) in &tally.counts {
        println!("{name}: {count}");
    }
    if args.snapshot {
        let snapshot = serde_json::to_string_pretty(&state.snapshot())
            .context("failed to serialize snapshot")?;
        println!("{snapshot}");
    }
    Ok(())
}

fn read_valid_save(path: &Path) -> Result<SimState> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    SimState::from_json(&raw, GameConfig::default())
        .with_context(|| format!("{} is not a usable save", path.display()))
}

fn export(save: &Path, out: &Path) -> Result<()> {
    let state = read_valid_save(save)?;
    let json = serde_json::to_string_pretty(&state).context("failed to serialize save")?;
    fs::write(out, json).with_context(|| format!("failed to write {}", out.display()))?;
    info!(from = %save.display(), to = %out.display(), "save exported");
    Ok(())
}

/// Copy `file` over `save` as-is once it checks out; the next load normalizes it.
fn import(file: &Path, save: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    save::validate(&raw).with_context(|| format!("{} is not a usable save", file.display()))?;
    fs::write(save, raw).with_context(|| format!("failed to write save {}", save.display()))?;
    info!(from = %file.display(), to = %save.display(), "save imported");
    Ok(())
}
