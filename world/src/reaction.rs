//! Overwatch and reaction fire against moving enemies.

use terror_site_core::{Event, Rejection, ShotType, Team, UnitId};
use terror_site_system_combat as combat;
use terror_site_system_visibility::has_line_of_sight;

use crate::{attack, World};

/// Readies the unit to fire on enemies that move in its sight.
///
/// Costs nothing up front, but the unit must hold a weapon and enough TU for
/// the snap shot it would take.
pub(crate) fn set_overwatch(
    world: &mut World,
    id: UnitId,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    let unit = world.units.get_mut(id).ok_or(Rejection::UnknownUnit)?;
    let weapon = unit.weapon.ok_or(Rejection::NoWeapon)?;
    let profile = weapon
        .kind
        .stats()
        .profile(ShotType::Snap)
        .ok_or(Rejection::ShotUnavailable)?;
    let time_units = unit.time_units.ok_or(Rejection::NotEnoughTu)?;
    if !time_units.can_afford(profile.tu_cost(time_units.max())) {
        return Err(Rejection::NotEnoughTu);
    }
    unit.overwatching = true;
    out.push(Event::OverwatchSet { unit: id });
    Ok(())
}

/// Gives every overwatching squad member a chance to shoot at `mover`.
///
/// Shooters react in identifier order, each rolling its reactions score. The
/// pass ends as soon as the mover is down.
pub(crate) fn react_to(world: &mut World, mover: UnitId, out: &mut Vec<Event>) {
    let shooters = world
        .units
        .ids_where(|unit| {
            unit.overwatching && unit.panicked_turns == 0 && unit.controller() == Team::Player
        });
    for shooter in shooters {
        let Some(target) = world.units.get(mover).filter(|unit| unit.alive).map(|unit| unit.pos)
        else {
            break;
        };
        let Some(unit) = world.units.get(shooter).filter(|unit| unit.alive) else {
            continue;
        };
        let (origin, reactions) = (unit.pos, unit.stats.reactions);
        if !has_line_of_sight(&world.grid.terrain_view(), origin, target) {
            continue;
        }
        if !combat::roll(&mut world.rng, reactions as f32 / 100.0) {
            continue;
        }
        tracing::debug!(%shooter, %mover, "reaction fire");
        out.push(Event::ReactionFire {
            shooter,
            target: mover,
        });
        if let Err(reason) = attack::fire(world, shooter, mover, ShotType::Snap, out) {
            out.push(Event::CommandRejected { reason });
        }
    }
}
