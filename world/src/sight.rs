//! Squad field of view and alien spotting.

use terror_site_core::{Event, Team, TilePos};
use terror_site_system_visibility::{self as visibility, Config};

use crate::World;

/// Recomputes the squad's field of view and the `spotted` flag of every
/// alien-controlled unit, announcing aliens that just came into view.
pub(crate) fn refresh(world: &mut World, out: &mut Vec<Event>) {
    let observers: Vec<TilePos> = world
        .units
        .living()
        .filter(|unit| unit.controller() == Team::Player)
        .map(|unit| unit.pos)
        .collect();
    let config = Config::new(world.sight_radius());
    world.visible = visibility::calculate(&world.grid.terrain_view(), observers, config);

    for unit in world.units.iter_mut() {
        let spotted =
            unit.alive && unit.controller() == Team::Alien && world.visible.contains(unit.pos);
        if spotted && !unit.spotted {
            out.push(Event::UnitSpotted { unit: unit.id });
        }
        unit.spotted = spotted;
    }
    tracing::trace!(visible = world.visible.len(), "field of view refreshed");
}
