//! Species-specific alien abilities.

use terror_site_core::{
    AlienAbility, AlienBehavior, AlienSpecies, Event, Rejection, TilePos, UnitId, JUMP_RANGE,
};
use terror_site_system_movement::find_path;
use terror_site_system_visibility::has_line_of_sight;

use crate::{
    attack, hazards,
    movement::{self, Pace},
    sight,
    unit::{Unit, UnitTemplate},
    World,
};

const CHARGE_DAMAGE_MULTIPLIER: f32 = 1.5;
const BLAST_DAMAGE: u32 = 40;
const BLAST_RADIUS: u32 = 2;

fn share(unit: &Unit, percent: f32) -> u32 {
    (unit.tu_max() as f32 * percent).round() as u32
}

fn behavior(unit: &Unit) -> Option<AlienBehavior> {
    unit.role.species().map(AlienSpecies::behavior)
}

fn spend(world: &mut World, id: UnitId, cost: u32) -> Result<(), Rejection> {
    world
        .units
        .get_mut(id)
        .and_then(|unit| unit.time_units.as_mut())
        .ok_or(Rejection::NotEnoughTu)?
        .spend(cost)
}

/// Performs the ability, rejecting it when the unit's species lacks it.
pub(crate) fn perform(
    world: &mut World,
    id: UnitId,
    ability: AlienAbility,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    let percent = ability.tu_percent();
    match ability {
        AlienAbility::Melee { target } => melee(world, id, target, percent, out),
        AlienAbility::Charge { target } => charge(world, id, target, percent, out),
        AlienAbility::Blast { center } => blast(world, id, center, percent, out),
        AlienAbility::Summon { at } => summon(world, id, at, percent, out),
        AlienAbility::Jump { to } => jump(world, id, to, percent, out),
    }
}

/// Validates a melee victim and returns the attacker's strike strength.
fn melee_target(world: &World, id: UnitId, target: UnitId) -> Result<u32, Rejection> {
    let unit = world.living(id)?;
    if unit.melee_damage == 0 {
        return Err(Rejection::AbilityUnavailable);
    }
    let victim = world.living(target)?;
    if victim.controller() == unit.controller() {
        return Err(Rejection::InvalidTarget);
    }
    Ok(unit.melee_damage)
}

fn melee(
    world: &mut World,
    id: UnitId,
    target: UnitId,
    percent: f32,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    let strength = melee_target(world, id, target)?;
    let (unit, victim) = (world.living(id)?, world.living(target)?);
    if !unit.pos.is_adjacent(victim.pos) {
        return Err(Rejection::NotAdjacent);
    }
    let cost = share(unit, percent);
    spend(world, id, cost)?;
    attack::strike(world, id, target, strength, out);
    Ok(())
}

/// Rushes next to the target at half TU cost, striking harder on arrival.
fn charge(
    world: &mut World,
    id: UnitId,
    target: UnitId,
    percent: f32,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    let strength = melee_target(world, id, target)?;
    let (unit, victim) = (world.living(id)?, world.living(target)?);
    if behavior(unit) != Some(AlienBehavior::Charge) {
        return Err(Rejection::AbilityUnavailable);
    }
    let strike_cost = share(unit, percent);
    let goal = victim.pos;
    if !unit.pos.is_adjacent(goal) {
        let mut path = find_path(
            &world.grid.terrain_view(),
            world.grid.occupancy_view(),
            unit.pos,
            goal,
        )
        .ok_or(Rejection::Unreachable)?;
        let _ = path.pop();
        let first_cost = path
            .first()
            .and_then(|pos| world.grid.tile(*pos))
            .map_or(u32::MAX, |tile| tile.tu_cost.div_ceil(2));
        if !unit.time_units.is_some_and(|tu| tu.can_afford(first_cost)) {
            return Err(Rejection::NotEnoughTu);
        }
        let _ = movement::walk(world, id, &path, Pace::Rush, out);
    }

    let arrived = match (world.units.get(id), world.units.get(target)) {
        (Some(unit), Some(victim)) => {
            unit.alive && victim.alive && unit.pos.is_adjacent(victim.pos)
        }
        _ => false,
    };
    if arrived && spend(world, id, strike_cost).is_ok() {
        let raw = (strength as f32 * CHARGE_DAMAGE_MULTIPLIER).round() as u32;
        attack::strike(world, id, target, raw, out);
    }
    Ok(())
}

fn boss(world: &World, id: UnitId) -> Result<&Unit, Rejection> {
    let unit = world.living(id)?;
    if behavior(unit) != Some(AlienBehavior::Boss) {
        return Err(Rejection::AbilityUnavailable);
    }
    Ok(unit)
}

/// Psionic blast centred on a visible tile.
fn blast(
    world: &mut World,
    id: UnitId,
    center: TilePos,
    percent: f32,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    if !world.grid.in_bounds(center) {
        return Err(Rejection::OutOfBounds);
    }
    let unit = boss(world, id)?;
    if !has_line_of_sight(&world.grid.terrain_view(), unit.pos, center) {
        return Err(Rejection::NoLineOfSight);
    }
    let cost = share(unit, percent);
    spend(world, id, cost)?;
    attack::explode(world, center, BLAST_DAMAGE, BLAST_RADIUS, out);
    Ok(())
}

/// Calls a Sectoid onto a free adjacent tile.
fn summon(
    world: &mut World,
    id: UnitId,
    at: TilePos,
    percent: f32,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    if !world.grid.in_bounds(at) {
        return Err(Rejection::OutOfBounds);
    }
    let unit = boss(world, id)?;
    if !unit.pos.is_adjacent(at) {
        return Err(Rejection::NotAdjacent);
    }
    if !world.grid.is_open(at) {
        return Err(Rejection::Blocked);
    }
    let cost = share(unit, percent);
    spend(world, id, cost)?;
    let species = AlienSpecies::Sectoid;
    let summoned = world.spawn(at, UnitTemplate::alien(species));
    tracing::info!(unit = %summoned, %at, "alien summoned");
    out.push(Event::AlienSpawned {
        unit: summoned,
        species,
        at,
    });
    sight::refresh(world, out);
    Ok(())
}

/// Teleports to a free tile within jumping range.
fn jump(
    world: &mut World,
    id: UnitId,
    to: TilePos,
    percent: f32,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    if !world.grid.in_bounds(to) {
        return Err(Rejection::OutOfBounds);
    }
    let unit = boss(world, id)?;
    if unit.pos.manhattan_distance(to) > JUMP_RANGE {
        return Err(Rejection::OutOfRange);
    }
    if !world.grid.is_open(to) {
        return Err(Rejection::Blocked);
    }
    let cost = share(unit, percent);
    spend(world, id, cost)?;
    if let Some(from) = world.relocate(id, to) {
        out.push(Event::UnitMoved { unit: id, from, to });
    }
    hazards::check_mines(world, id, out);
    sight::refresh(world, out);
    Ok(())
}
