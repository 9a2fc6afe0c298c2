//! Scripted squad used by the headless runner.
//!
//! Each soldier acts against the live world one order at a time: reload,
//! patch up, shoot the nearest spotted alien, close in, or stand watch. A
//! rejected order ends that soldier's turn.

use terror_site_core::{
    Command, Event, ItemKind, ShotType, Team, TilePos, UnitId, UnitSnapshot,
};
use terror_site_system_movement::affordable_prefix;
use terror_site_world::{self as world, query, World};

const ORDER_LIMIT: usize = 8;
const AIMED_BEYOND: u32 = 6;
const MEDIKIT_BELOW: f32 = 0.5;

/// Plays the squad's side of the current turn.
pub(crate) fn play_turn(world: &mut World, out: &mut Vec<Event>) {
    let squad: Vec<UnitId> = query::unit_view(world)
        .living()
        .filter(|unit| unit.controller == Team::Player && unit.time_units.is_some())
        .map(|unit| unit.id)
        .collect();
    for id in squad {
        let mut moved = false;
        for _ in 0..ORDER_LIMIT {
            let Some(command) = next_order(world, id, &mut moved) else {
                break;
            };
            if !issue(world, command, out) {
                break;
            }
        }
    }
}

/// Applies the order and reports whether the world accepted it.
fn issue(world: &mut World, command: Command, out: &mut Vec<Event>) -> bool {
    let start = out.len();
    world::apply(world, command, out);
    !matches!(out.get(start), Some(Event::CommandRejected { .. }))
}

fn next_order(world: &World, id: UnitId, moved: &mut bool) -> Option<Command> {
    let me = query::unit(world, id)?;
    if !me.alive || me.controller != Team::Player || me.panicked_turns > 0 || me.tu() == 0 {
        return None;
    }
    let weapon = me.weapon?;
    if weapon.ammo == Some(0) {
        return me
            .inventory
            .contains(&ItemKind::Clip)
            .then_some(Command::Reload { unit: id });
    }
    if me.health_ratio() < MEDIKIT_BELOW && me.inventory.contains(&ItemKind::Medikit) {
        return Some(Command::UseItem {
            unit: id,
            item: ItemKind::Medikit,
            target: None,
        });
    }

    let stats = weapon.kind.stats();
    if let Some(target) = nearest_hostile(world, &me) {
        if stats.reaches(me.pos, target.pos) && query::has_line_of_sight(world, me.pos, target.pos)
        {
            let preferred = if me.pos.manhattan_distance(target.pos) > AIMED_BEYOND {
                ShotType::Aimed
            } else {
                ShotType::Snap
            };
            return [preferred, ShotType::Snap]
                .into_iter()
                .find(|shot| {
                    stats
                        .profile(*shot)
                        .is_some_and(|profile| profile.tu_cost(me.tu_max()) <= me.tu())
                })
                .map(|shot| Command::Attack {
                    attacker: id,
                    target: target.id,
                    shot,
                });
        }
        if !*moved {
            *moved = true;
            let reserve = stats
                .profile(ShotType::Snap)
                .map_or(0, |profile| profile.tu_cost(me.tu_max()));
            let goal = target.pos;
            if let Some(destination) = advance(world, &me, goal, reserve, |tile| {
                stats.reaches(tile, goal) && query::has_line_of_sight(world, tile, goal)
            }) {
                return Some(Command::Move {
                    unit: id,
                    destination,
                });
            }
        }
    }
    (!me.overwatching).then_some(Command::SetOverwatch { unit: id })
}

/// Closest spotted unit the aliens control, ties broken by id.
fn nearest_hostile(world: &World, me: &UnitSnapshot) -> Option<UnitSnapshot> {
    query::unit_view(world)
        .living()
        .filter(|unit| unit.controller == Team::Alien && unit.spotted)
        .min_by_key(|unit| (me.pos.manhattan_distance(unit.pos), unit.id))
        .cloned()
}

/// Furthest affordable tile toward `goal`, stopping early once `arrived`.
fn advance(
    world: &World,
    me: &UnitSnapshot,
    goal: TilePos,
    reserve: u32,
    arrived: impl Fn(TilePos) -> bool,
) -> Option<TilePos> {
    let mut path = query::find_path(world, me.id, goal)?;
    if path
        .last()
        .is_some_and(|last| !query::occupancy_view(world).is_free(*last))
    {
        let _ = path.pop();
    }
    let steps = affordable_prefix(
        &query::terrain_view(world),
        &path,
        me.tu().saturating_sub(reserve),
    );
    path.truncate(steps);
    if let Some(stop) = path.iter().position(|tile| arrived(*tile)) {
        path.truncate(stop + 1);
    }
    path.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use terror_site_core::{AlienSpecies, Phase};
    use terror_site_world::{MissionSpec, UnitSpec};

    fn orders_issued(events: &[Event]) -> usize {
        events
            .iter()
            .filter(|event| !matches!(event, Event::CommandRejected { .. }))
            .count()
    }

    #[test]
    fn soldiers_shoot_spotted_aliens() {
        let spec = MissionSpec::new(["........"])
            .with_unit(UnitSpec::soldier(0, 0))
            .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 4, 0));
        let mut world = World::from_mission(&spec).expect("valid mission");
        let mut events = Vec::new();

        play_turn(&mut world, &mut events);

        assert!(events.iter().any(|event| matches!(
            event,
            Event::ShotFired { attacker, .. } if *attacker == UnitId::new(1)
        )));
    }

    #[test]
    fn soldiers_without_targets_stand_watch() {
        let spec = MissionSpec::new([
            "..........",
            "..........",
            "..........",
            "##########",
            "..........",
        ])
            .with_unit(UnitSpec::soldier(0, 0))
            .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 2, 4));
        let mut world = World::from_mission(&spec).expect("valid mission");
        let mut events = Vec::new();

        play_turn(&mut world, &mut events);

        assert_eq!(
            events,
            vec![Event::OverwatchSet {
                unit: UnitId::new(1)
            }]
        );
        assert_eq!(query::phase(&world), Phase::PlayerTurn);
    }

    #[test]
    fn nothing_happens_outside_the_squad_turn() {
        let spec = MissionSpec::new(["........"])
            .with_unit(UnitSpec::soldier(0, 0))
            .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 4, 0));
        let mut world = World::from_mission(&spec).expect("valid mission");
        let mut events = Vec::new();
        world::apply(&mut world, Command::EndTurn, &mut events);
        events.clear();

        play_turn(&mut world, &mut events);

        assert_eq!(orders_issued(&events), 0);
    }
}
