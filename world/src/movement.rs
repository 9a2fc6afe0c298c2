//! Step-by-step movement, interrupts and posture changes.

use terror_site_core::{Event, Rejection, Team, TilePos, UnitId};
use terror_site_system_movement::find_path;

use crate::{hazards, reaction, sight, World};

const STANCE_TU_COST: u32 = 4;

/// How a unit pays for the tiles it crosses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pace {
    /// Full terrain cost per tile.
    Walk,
    /// Half terrain cost per tile, rounded up.
    Rush,
}

impl Pace {
    fn cost(self, tile_cost: u32) -> u32 {
        match self {
            Self::Walk => tile_cost,
            Self::Rush => tile_cost.div_ceil(2),
        }
    }
}

/// Walks a unit toward the destination along the cheapest route.
pub(crate) fn move_unit(
    world: &mut World,
    id: UnitId,
    destination: TilePos,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    if !world.grid.in_bounds(destination) {
        return Err(Rejection::OutOfBounds);
    }
    let unit = world.living(id)?;
    let time_units = unit.time_units.ok_or(Rejection::NotEnoughTu)?;
    let path = find_path(
        &world.grid.terrain_view(),
        world.grid.occupancy_view(),
        unit.pos,
        destination,
    )
    .filter(|path| !path.is_empty())
    .ok_or(Rejection::Unreachable)?;

    let first = path[0];
    if world.grid.occupant(first).is_some() {
        return Err(Rejection::Blocked);
    }
    let first_cost = world.grid.tile(first).map_or(u32::MAX, |tile| tile.tu_cost);
    if !time_units.can_afford(first_cost) {
        return Err(Rejection::NotEnoughTu);
    }

    let _ = walk(world, id, &path, Pace::Walk, out);
    Ok(())
}

/// Advances a unit tile by tile along `path`, returning the steps taken.
///
/// Each step pays its TU, springs mines around the new tile and, for
/// alien-controlled movers, gives overwatching soldiers their chance to react.
/// The walk stops early on an occupied tile, an empty TU budget or when the
/// mover was pushed off the route, and reports the interruption, or stops
/// silently when the mover goes down.
pub(crate) fn walk(
    world: &mut World,
    id: UnitId,
    path: &[TilePos],
    pace: Pace,
    out: &mut Vec<Event>,
) -> usize {
    let mut taken = 0;
    for &next in path {
        let Some(at) = world.units.get(id).map(|unit| unit.pos) else {
            break;
        };
        if at.manhattan_distance(next) != 1 || world.grid.occupant(next).is_some() {
            break;
        }
        let Some(tile_cost) = world.grid.tile(next).map(|tile| tile.tu_cost) else {
            break;
        };
        let Some(unit) = world.units.get_mut(id) else {
            break;
        };
        let paid = unit
            .time_units
            .as_mut()
            .is_some_and(|time_units| time_units.spend(pace.cost(tile_cost)).is_ok());
        if !paid {
            break;
        }
        let Some(from) = world.relocate(id, next) else {
            break;
        };
        out.push(Event::UnitMoved {
            unit: id,
            from,
            to: next,
        });
        taken += 1;

        hazards::check_mines(world, id, out);
        if !is_alive(world, id) {
            break;
        }
        if world
            .units
            .get(id)
            .is_some_and(|unit| unit.controller() == Team::Alien)
        {
            reaction::react_to(world, id, out);
            if !is_alive(world, id) {
                break;
            }
        }
    }

    if let Some(unit) = world.units.get(id).filter(|unit| unit.alive) {
        if path.last().is_some_and(|end| *end != unit.pos) {
            tracing::debug!(unit = %id, at = %unit.pos, "move interrupted");
            out.push(Event::MoveInterrupted {
                unit: id,
                at: unit.pos,
            });
        }
    }
    sight::refresh(world, out);
    taken
}

fn is_alive(world: &World, id: UnitId) -> bool {
    world.units.get(id).is_some_and(|unit| unit.alive)
}

/// Switches the unit between standing and kneeling.
pub(crate) fn toggle_stance(
    world: &mut World,
    id: UnitId,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    let unit = world.units.get_mut(id).ok_or(Rejection::UnknownUnit)?;
    unit.time_units
        .as_mut()
        .ok_or(Rejection::NotEnoughTu)?
        .spend(STANCE_TU_COST)?;
    unit.stance = unit.stance.toggled();
    out.push(Event::StanceChanged {
        unit: id,
        stance: unit.stance,
    });
    Ok(())
}
