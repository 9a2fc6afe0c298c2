//! Psionic assaults: panic, demoralization and mind control.

use rand::Rng;
use terror_site_core::{Event, MindControl, PsionicOutcome, Rejection, UnitId, PSIONIC_TU_COST};
use terror_site_system_visibility::has_line_of_sight;

use crate::{sight, World};

const BASE_STRENGTH: u32 = 50;
const STRENGTH_SPREAD: u32 = 50;
const PANIC_TURNS: u32 = 2;
const MORALE_LOSS: u32 = 25;
const MIND_CONTROL_TURNS: u32 = 1;

/// Pits the attacker's psionic strength against the target's bravery.
pub(crate) fn assault(
    world: &mut World,
    attacker: UnitId,
    target: UnitId,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    let psionic = world.living(attacker)?;
    if !psionic.psionic {
        return Err(Rejection::NoPsionics);
    }
    let victim = world.living(target)?;
    if psionic.controller() == victim.controller() {
        return Err(Rejection::InvalidTarget);
    }
    if !has_line_of_sight(&world.grid.terrain_view(), psionic.pos, victim.pos) {
        return Err(Rejection::NoLineOfSight);
    }
    let (controller, bravery) = (psionic.controller(), victim.stats.bravery);
    world
        .units
        .get_mut(attacker)
        .and_then(|unit| unit.time_units.as_mut())
        .ok_or(Rejection::NotEnoughTu)?
        .spend(PSIONIC_TU_COST)?;

    let strength = BASE_STRENGTH + world.rng.gen_range(0..STRENGTH_SPREAD);
    let outcome = if strength <= bravery {
        PsionicOutcome::Resisted
    } else {
        match world.rng.gen_range(0..100) {
            0..=39 => PsionicOutcome::Panic,
            40..=69 => PsionicOutcome::Demoralize,
            _ => PsionicOutcome::MindControl,
        }
    };

    if let Some(unit) = world.units.get_mut(target) {
        match outcome {
            PsionicOutcome::Resisted => {}
            PsionicOutcome::Panic => {
                unit.panicked_turns = PANIC_TURNS;
                unit.overwatching = false;
            }
            PsionicOutcome::Demoralize => {
                if let Some(time_units) = unit.time_units.as_mut() {
                    time_units.halve();
                }
                unit.morale = unit.morale.saturating_sub(MORALE_LOSS);
            }
            PsionicOutcome::MindControl => {
                unit.mind_control = Some(MindControl {
                    controller,
                    turns_left: MIND_CONTROL_TURNS,
                });
                unit.overwatching = false;
            }
        }
    }
    tracing::info!(%attacker, %target, strength, bravery, ?outcome, "psionic attack");
    out.push(Event::PsionicAttack {
        attacker,
        target,
        outcome,
    });
    if outcome == PsionicOutcome::MindControl {
        sight::refresh(world, out);
    }
    Ok(())
}
