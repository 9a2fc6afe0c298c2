//! Phase transitions and end-of-mission evaluation.

use terror_site_core::{Event, Phase, Rejection, StatusKind, Team};

use crate::{hazards, sight, World};

const SHOCKED_REFILL_PERCENT: u32 = 75;

/// Hands the turn to the aliens and runs the hazard pass.
pub(crate) fn end_player_turn(world: &mut World, out: &mut Vec<Event>) -> Result<(), Rejection> {
    if world.phase != Phase::PlayerTurn {
        return Err(Rejection::NotYourTurn);
    }
    let released = close_home_turn(world, Team::Player, out);
    enter(world, Phase::AlienTurn, out);
    refill(world, Team::Alien);
    hazards::run(world, out);
    if released {
        sight::refresh(world, out);
    }
    Ok(())
}

/// Closes the alien turn, ending the mission or starting the next squad turn.
pub(crate) fn end_alien_turn(world: &mut World, out: &mut Vec<Event>) -> Result<(), Rejection> {
    if world.phase != Phase::AlienTurn {
        return Err(Rejection::NotYourTurn);
    }
    let _ = close_home_turn(world, Team::Alien, out);

    let hostiles = world.units.living().any(|unit| unit.role.is_hostile());
    let soldiers = world.units.living().any(|unit| unit.is_soldier());
    if !hostiles {
        enter(world, Phase::Victory, out);
        return Ok(());
    }
    if !soldiers {
        enter(world, Phase::Defeat, out);
        return Ok(());
    }

    world.turn += 1;
    enter(world, Phase::PlayerTurn, out);
    refill(world, Team::Player);
    for unit in world.units.iter_mut() {
        if unit.controller() == Team::Player {
            unit.overwatching = false;
        }
    }
    sight::refresh(world, out);
    Ok(())
}

fn enter(world: &mut World, phase: Phase, out: &mut Vec<Event>) {
    world.phase = phase;
    tracing::info!(?phase, turn = world.turn, "phase changed");
    out.push(Event::PhaseChanged {
        phase,
        turn: world.turn,
    });
}

/// Ticks panic and mind control on units fielded by `team`, whose own turn
/// just ended. Returns whether any unit returned to its home team.
fn close_home_turn(world: &mut World, team: Team, out: &mut Vec<Event>) -> bool {
    let mut released = false;
    for unit in world.units.iter_mut() {
        if !unit.alive || unit.team != team {
            continue;
        }
        unit.panicked_turns = unit.panicked_turns.saturating_sub(1);
        let Some(control) = unit.mind_control.as_mut() else {
            continue;
        };
        control.turns_left = control.turns_left.saturating_sub(1);
        if control.turns_left == 0 {
            unit.mind_control = None;
            unit.overwatching = false;
            released = true;
            out.push(Event::MindControlExpired { unit: unit.id });
        }
    }
    released
}

fn refill(world: &mut World, team: Team) {
    for unit in world.units.iter_mut() {
        if !unit.alive || unit.controller() != team {
            continue;
        }
        let percent = if unit.has_status(StatusKind::Shocked) {
            SHOCKED_REFILL_PERCENT
        } else {
            100
        };
        if let Some(time_units) = unit.time_units.as_mut() {
            time_units.refill(percent);
        }
    }
}
