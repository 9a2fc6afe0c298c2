#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Terror Site.
//!
//! All mutation flows through [`apply`], which validates a [`Command`],
//! resolves it and broadcasts the resulting [`Event`]s. Adapters and systems
//! observe the world exclusively through the [`query`] module.

mod abilities;
mod attack;
mod grid;
mod hazards;
mod items;
mod log;
mod mission;
mod movement;
mod psionics;
mod reaction;
mod sight;
mod turn;
mod unit;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use terror_site_core::{
    Command, Event, FireSnapshot, MineSnapshot, MissionStats, Phase, Rejection, TilePos, UnitId,
    DAY_SIGHT_RADIUS, NIGHT_SIGHT_RADIUS,
};
use terror_site_system_visibility::VisibleSet;

pub use mission::{MissionError, MissionSpec, StatOverrides, UnitKind, UnitSpec};

use crate::{
    grid::Grid,
    log::MessageLog,
    unit::{Unit, UnitRegistry, UnitTemplate},
};

/// Represents the authoritative Terror Site world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    units: UnitRegistry,
    phase: Phase,
    turn: u32,
    night: bool,
    visible: VisibleSet,
    fires: Vec<FireSnapshot>,
    mines: Vec<MineSnapshot>,
    stats: MissionStats,
    log: MessageLog,
    rng: ChaCha8Rng,
}

impl World {
    /// Builds the opening state of a mission.
    ///
    /// The squad acts first on turn 1 with full TU, and the initial field of
    /// view is already computed so aliens standing in plain sight start out
    /// spotted.
    pub fn from_mission(spec: &MissionSpec) -> Result<Self, MissionError> {
        let deployment = mission::deploy(spec)?;
        let (width, height) = deployment.grid.dimensions();
        let mut world = Self {
            grid: deployment.grid,
            units: UnitRegistry::new(),
            phase: Phase::PlayerTurn,
            turn: 1,
            night: spec.night,
            visible: VisibleSet::empty(width, height),
            fires: Vec::new(),
            mines: Vec::new(),
            stats: MissionStats::default(),
            log: MessageLog::default(),
            rng: ChaCha8Rng::seed_from_u64(spec.seed),
        };
        for (pos, template) in deployment.units {
            let _ = world.spawn(pos, template);
        }
        let mut opening = Vec::new();
        sight::refresh(&mut world, &mut opening);
        tracing::info!(
            width,
            height,
            units = world.units.iter().count(),
            night = world.night,
            "mission deployed"
        );
        Ok(world)
    }

    /// Fields a unit and claims its tile.
    fn spawn(&mut self, pos: TilePos, template: UnitTemplate) -> UnitId {
        let id = self.units.insert(pos, template);
        self.grid.occupy(pos, id);
        id
    }

    /// Moves a unit to another tile, keeping occupancy in sync.
    fn relocate(&mut self, id: UnitId, to: TilePos) -> Option<TilePos> {
        let unit = self.units.get_mut(id)?;
        let from = unit.pos;
        unit.pos = to;
        self.grid.vacate(from);
        self.grid.occupy(to, id);
        Some(from)
    }

    fn sight_radius(&self) -> u32 {
        if self.night {
            NIGHT_SIGHT_RADIUS
        } else {
            DAY_SIGHT_RADIUS
        }
    }

    fn living(&self, id: UnitId) -> Result<&Unit, Rejection> {
        let unit = self.units.get(id).ok_or(Rejection::UnknownUnit)?;
        if !unit.alive {
            return Err(Rejection::UnitDown);
        }
        Ok(unit)
    }

    /// Confirms that the unit may take orders during the current phase.
    fn ensure_actor(&self, id: UnitId) -> Result<(), Rejection> {
        let unit = self.living(id)?;
        if self.phase.acting_team() != Some(unit.controller()) {
            return Err(Rejection::NotYourTurn);
        }
        if unit.panicked_turns > 0 {
            return Err(Rejection::Panicked);
        }
        Ok(())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Refused commands leave the world untouched apart from a
/// [`Event::CommandRejected`] event and the matching log line.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let first = out_events.len();
    if let Err(reason) = dispatch(world, command, out_events) {
        tracing::debug!(%reason, "command rejected");
        out_events.push(Event::CommandRejected { reason });
    }
    for event in &out_events[first..] {
        if let Some(message) = event.message() {
            world.log.push(message);
        }
    }
}

fn dispatch(world: &mut World, command: Command, out: &mut Vec<Event>) -> Result<(), Rejection> {
    if world.phase.is_terminal() {
        return Err(Rejection::GameOver);
    }
    match command {
        Command::Move { unit, destination } => {
            world.ensure_actor(unit)?;
            movement::move_unit(world, unit, destination, out)
        }
        Command::Attack {
            attacker,
            target,
            shot,
        } => {
            world.ensure_actor(attacker)?;
            attack::fire(world, attacker, target, shot, out)
        }
        Command::Throw { unit, item, target } => {
            world.ensure_actor(unit)?;
            items::throw(world, unit, item, target, out)
        }
        Command::UseItem { unit, item, target } => {
            world.ensure_actor(unit)?;
            items::use_item(world, unit, item, target, out)
        }
        Command::Reload { unit } => {
            world.ensure_actor(unit)?;
            items::reload(world, unit, out)
        }
        Command::ToggleStance { unit } => {
            world.ensure_actor(unit)?;
            movement::toggle_stance(world, unit, out)
        }
        Command::SetOverwatch { unit } => {
            world.ensure_actor(unit)?;
            reaction::set_overwatch(world, unit, out)
        }
        Command::PsionicAttack { attacker, target } => {
            world.ensure_actor(attacker)?;
            psionics::assault(world, attacker, target, out)
        }
        Command::AlienAbility { unit, ability } => {
            world.ensure_actor(unit)?;
            abilities::perform(world, unit, ability, out)
        }
        Command::EndTurn => turn::end_player_turn(world, out),
        Command::EndAlienTurn => turn::end_alien_turn(world, out),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use terror_site_core::{
        FireSnapshot, MineSnapshot, MissionStats, OccupancyView, Phase, SmokeView, TerrainView,
        TilePos, UnitId, UnitRole, UnitSnapshot, UnitView, Team,
    };
    use terror_site_system_movement::MovementRange;
    use terror_site_system_visibility::VisibleSet;

    use super::World;

    /// Phase currently in progress.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Turn counter, starting at 1.
    #[must_use]
    pub fn turn(world: &World) -> u32 {
        world.turn
    }

    /// Reports whether the mission takes place at night.
    #[must_use]
    pub fn is_night(world: &World) -> bool {
        world.night
    }

    /// Manhattan sight radius for the current lighting.
    #[must_use]
    pub fn sight_radius(world: &World) -> u32 {
        world.sight_radius()
    }

    /// Provides read-only access to the terrain grid.
    #[must_use]
    pub fn terrain_view(world: &World) -> TerrainView<'_> {
        world.grid.terrain_view()
    }

    /// Exposes a read-only view of the occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        world.grid.occupancy_view()
    }

    /// Exposes the remaining smoke turns of every tile.
    #[must_use]
    pub fn smoke_view(world: &World) -> SmokeView<'_> {
        world.grid.smoke_view()
    }

    /// Captures a read-only view of every unit fielded on the mission.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().map(|unit| unit.snapshot()).collect())
    }

    /// Snapshot of a single unit.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<UnitSnapshot> {
        world.units.get(id).map(|unit| unit.snapshot())
    }

    /// Tiles currently seen by the squad.
    #[must_use]
    pub fn visible_tiles(world: &World) -> &VisibleSet {
        &world.visible
    }

    /// Burning tiles, in ignition order.
    #[must_use]
    pub fn fires(world: &World) -> &[FireSnapshot] {
        &world.fires
    }

    /// Armed proximity mines, in arming order.
    #[must_use]
    pub fn mines(world: &World) -> &[MineSnapshot] {
        &world.mines
    }

    /// Kill and capture tallies so far.
    #[must_use]
    pub fn stats(world: &World) -> MissionStats {
        world.stats
    }

    /// Most recent log lines, oldest first.
    pub fn messages(world: &World) -> impl Iterator<Item = &str> {
        world.log.iter()
    }

    /// Reports whether sight passes between the two tiles.
    #[must_use]
    pub fn has_line_of_sight(world: &World, from: TilePos, to: TilePos) -> bool {
        let terrain = terrain_view(world);
        terrain.in_bounds(from)
            && terrain.in_bounds(to)
            && terror_site_system_visibility::has_line_of_sight(&terrain, from, to)
    }

    /// Tiles the unit could walk to with its remaining TU.
    #[must_use]
    pub fn movement_range(world: &World, id: UnitId) -> Option<MovementRange> {
        let unit = world.units.get(id).filter(|unit| unit.alive)?;
        Some(terror_site_system_movement::movement_range(
            &world.grid.terrain_view(),
            world.grid.occupancy_view(),
            unit.pos,
            unit.tu(),
        ))
    }

    /// Cheapest route from the unit to the destination, excluding its tile.
    #[must_use]
    pub fn find_path(world: &World, id: UnitId, destination: TilePos) -> Option<Vec<TilePos>> {
        let unit = world.units.get(id).filter(|unit| unit.alive)?;
        terror_site_system_movement::find_path(
            &world.grid.terrain_view(),
            world.grid.occupancy_view(),
            unit.pos,
            destination,
        )
    }

    /// Living units the alien side orders around this turn, ascending.
    ///
    /// Zombies act on their own during the hazard pass and panicking units
    /// cannot act, so neither is listed.
    #[must_use]
    pub fn alien_actors(world: &World) -> Vec<UnitId> {
        world.units.ids_where(|unit| {
            unit.controller() == Team::Alien
                && unit.panicked_turns == 0
                && !matches!(unit.role, UnitRole::Zombie { .. })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terror_site_core::{AlienSpecies, ShotType, Team};

    fn skirmish() -> World {
        let spec = MissionSpec::new(["......", "......", "......"])
            .with_seed(7)
            .with_unit(UnitSpec::soldier(0, 1))
            .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 5, 1));
        World::from_mission(&spec).expect("valid mission")
    }

    #[test]
    fn missions_open_on_the_player_turn() {
        let world = skirmish();
        assert_eq!(query::phase(&world), Phase::PlayerTurn);
        assert_eq!(query::turn(&world), 1);
        let soldier = query::unit(&world, UnitId::new(1)).expect("soldier");
        assert_eq!(soldier.team, Team::Player);
        assert_eq!(soldier.tu(), soldier.tu_max());
        let alien = query::unit(&world, UnitId::new(2)).expect("alien");
        assert!(alien.spotted);
    }

    #[test]
    fn rejected_commands_are_logged() {
        let mut world = skirmish();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Attack {
                attacker: UnitId::new(2),
                target: UnitId::new(1),
                shot: ShotType::Snap,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::CommandRejected {
                reason: Rejection::NotYourTurn
            }]
        );
        assert_eq!(query::messages(&world).last(), Some("Not your turn!"));
    }

    #[test]
    fn unknown_units_are_rejected() {
        let mut world = skirmish();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Reload {
                unit: UnitId::new(99),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::CommandRejected {
                reason: Rejection::UnknownUnit
            }]
        );
    }

    #[test]
    fn alien_actors_follow_identifier_order() {
        let spec = MissionSpec::new(["....."])
            .with_unit(UnitSpec::alien(AlienSpecies::Muton, 4, 0))
            .with_unit(UnitSpec::soldier(0, 0))
            .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 2, 0));
        let world = World::from_mission(&spec).expect("valid mission");
        assert_eq!(
            query::alien_actors(&world),
            vec![UnitId::new(1), UnitId::new(3)]
        );
    }
}
