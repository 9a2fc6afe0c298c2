#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Terror Site mission headlessly.

mod mission;
mod squad;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use terror_site_core::{Event, Phase};
use terror_site_system_turn::{Config, TurnController};
use terror_site_world::{query, World};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Plays a mission with a scripted squad against the alien AI.
#[derive(Debug, Parser)]
#[command(name = "terror-site", version, about, long_about = None)]
struct Args {
    /// Mission description in TOML; the built-in demo mission when absent.
    #[arg(long)]
    mission: Option<PathBuf>,

    /// Overrides the mission's random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of rounds to play.
    #[arg(long, default_value_t = 20)]
    turns: u32,

    /// Plays the mission at night.
    #[arg(long)]
    night: bool,

    /// Tracing filter such as `info` or `terror_site_world=debug`.
    /// Falls back to `RUST_LOG`, then to `warn`.
    #[arg(long)]
    log_filter: Option<String>,
}

/// Entry point for the Terror Site command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_filter.as_deref())?;

    let mut spec = match &args.mission {
        Some(path) => mission::load(path)?,
        None => mission::demo(),
    };
    if let Some(seed) = args.seed {
        spec = spec.with_seed(seed);
    }
    if args.night {
        spec = spec.at_night(true);
    }

    let mut world = World::from_mission(&spec).context("mission failed validation")?;
    tracing::info!(seed = spec.seed, night = spec.night, turns = args.turns, "mission started");
    let mut controller = TurnController::new(Config::new(spec.seed));
    let mut events = Vec::new();

    for _ in 0..args.turns {
        println!("== Turn {} ==", query::turn(&world));
        squad::play_turn(&mut world, &mut events);
        let phase = controller.end_player_turn(&mut world, &mut events);
        print_messages(&events);
        events.clear();
        if phase.is_terminal() {
            break;
        }
    }

    report(&world);
    Ok(())
}

fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter `{directives}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    Ok(())
}

fn print_messages(events: &[Event]) {
    for line in events.iter().filter_map(Event::message) {
        println!("  {line}");
    }
}

fn report(world: &World) {
    let outcome = match query::phase(world) {
        Phase::Victory => "victory",
        Phase::Defeat => "defeat",
        Phase::PlayerTurn | Phase::AlienTurn => "unresolved",
    };
    let stats = query::stats(world);
    println!(
        "Outcome: {outcome} after {} turns (kills {}, captures {}, losses {}, civilians lost {})",
        query::turn(world),
        stats.kills,
        stats.captures,
        stats.losses,
        stats.civilians_lost,
    );
}
