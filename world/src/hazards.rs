//! Smoke, fire, mines, status effects and zombies.

use rand::seq::SliceRandom;
use terror_site_core::{
    AlienSpecies, Blast, Event, FireSnapshot, MineSnapshot, StatusKind, Team, TilePos, UnitId,
    UnitRole,
};
use terror_site_system_combat as combat;

use crate::{
    attack::{self, DamageSource},
    unit::UnitTemplate,
    World,
};

const FIRE_DAMAGE: u32 = 10;
const FIRE_SPREAD_CHANCE: f32 = 0.2;
const FIRE_DURATION: u32 = 3;
const SMOKE_RADIUS: i64 = 2;
const SMOKE_TURNS: u8 = 3;
pub(crate) const BLEEDING_DURATION: u32 = 3;

/// Lays a square smoke cloud around `center`.
pub(crate) fn deploy_smoke(world: &mut World, center: TilePos, out: &mut Vec<Event>) {
    for dy in -SMOKE_RADIUS..=SMOKE_RADIUS {
        for dx in -SMOKE_RADIUS..=SMOKE_RADIUS {
            if let Some(pos) = center.offset(dx, dy) {
                world.grid.add_smoke(pos, SMOKE_TURNS);
            }
        }
    }
    out.push(Event::SmokeDeployed { center });
}

/// Arms a proximity mine on the tile.
pub(crate) fn arm_mine(
    world: &mut World,
    at: TilePos,
    blast: Blast,
    owner: UnitId,
    out: &mut Vec<Event>,
) {
    world.mines.push(MineSnapshot { at, blast, owner });
    out.push(Event::MineArmed { at });
}

/// Detonates every mine within one tile of the unit that just stepped.
pub(crate) fn check_mines(world: &mut World, stepper: UnitId, out: &mut Vec<Event>) {
    let Some(pos) = world.units.get(stepper).map(|unit| unit.pos) else {
        return;
    };
    let (triggered, armed): (Vec<MineSnapshot>, Vec<MineSnapshot>) = world
        .mines
        .iter()
        .partition(|mine| mine.at.manhattan_distance(pos) <= 1);
    if triggered.is_empty() {
        return;
    }
    world.mines = armed;
    for mine in triggered {
        tracing::debug!(at = %mine.at, by = %stepper, "mine triggered");
        out.push(Event::MineTriggered {
            at: mine.at,
            by: stepper,
        });
        attack::explode(world, mine.at, mine.blast.damage, mine.blast.radius, out);
    }
}

/// Sets the tile ablaze, refreshing the timer of an existing fire.
pub(crate) fn start_fire(world: &mut World, at: TilePos, out: &mut Vec<Event>) {
    if let Some(fire) = world.fires.iter_mut().find(|fire| fire.at == at) {
        fire.turns_left = FIRE_DURATION;
        return;
    }
    world.fires.push(FireSnapshot {
        at,
        turns_left: FIRE_DURATION,
    });
    out.push(Event::FireStarted { at });
}

/// Runs the hazard pass that opens every alien turn.
pub(crate) fn run(world: &mut World, out: &mut Vec<Event>) {
    world.grid.decay_smoke();
    spread_fires(world, out);
    burn(world, out);
    tick_status_effects(world, out);
    advance_zombies(world, out);
}

fn spread_fires(world: &mut World, out: &mut Vec<Event>) {
    let burning: Vec<TilePos> = world.fires.iter().map(|fire| fire.at).collect();
    let mut ignited = Vec::new();
    for at in &burning {
        if !combat::roll(&mut world.rng, FIRE_SPREAD_CHANCE) {
            continue;
        }
        let candidates: Vec<TilePos> = world
            .grid
            .terrain_view()
            .neighbors(*at)
            .filter(|pos| {
                world.grid.tile(*pos).is_some_and(|tile| tile.destructible)
                    && !burning.contains(pos)
                    && !ignited.contains(pos)
            })
            .collect();
        if let Some(&pos) = candidates.choose(&mut world.rng) {
            ignited.push(pos);
        }
    }

    for fire in &mut world.fires {
        fire.turns_left = fire.turns_left.saturating_sub(1);
    }
    let (spent, lit): (Vec<FireSnapshot>, Vec<FireSnapshot>) =
        world.fires.iter().partition(|fire| fire.turns_left == 0);
    world.fires = lit;
    for fire in spent {
        out.push(Event::FireBurnedOut { at: fire.at });
    }
    for at in ignited {
        start_fire(world, at, out);
    }
}

fn burn(world: &mut World, out: &mut Vec<Event>) {
    let victims: Vec<UnitId> = world
        .fires
        .iter()
        .filter_map(|fire| world.grid.occupant(fire.at))
        .collect();
    for id in victims {
        let _ = attack::damage(world, id, FIRE_DAMAGE, DamageSource::Hazard, out);
    }
}

fn tick_status_effects(world: &mut World, out: &mut Vec<Event>) {
    let mut wounds = Vec::new();
    for unit in world.units.iter_mut().filter(|unit| unit.alive) {
        let mut damage = 0;
        for effect in &mut unit.status {
            damage += effect.kind.damage_per_stack() * effect.stacks;
            effect.duration = effect.duration.saturating_sub(1);
        }
        let expired: Vec<StatusKind> = unit
            .status
            .iter()
            .filter(|effect| effect.duration == 0)
            .map(|effect| effect.kind)
            .collect();
        for kind in expired {
            if unit.clear_status(kind) {
                out.push(Event::StatusExpired {
                    unit: unit.id,
                    kind,
                });
            }
        }
        if damage > 0 {
            wounds.push((unit.id, damage));
        }
    }
    for (id, amount) in wounds {
        let _ = attack::damage(world, id, amount, DamageSource::Hazard, out);
    }
}

fn advance_zombies(world: &mut World, out: &mut Vec<Event>) {
    let zombies = world
        .units
        .ids_where(|unit| matches!(unit.role, UnitRole::Zombie { .. }));
    for zombie in zombies {
        let Some(unit) = world.units.get(zombie).filter(|unit| unit.alive) else {
            continue;
        };
        let (pos, strength) = (unit.pos, unit.melee_damage);
        let victim = world
            .units
            .living()
            .find(|other| other.controller() == Team::Player && other.pos.is_adjacent(pos))
            .map(|other| other.id);
        if let Some(victim) = victim {
            attack::strike(world, zombie, victim, strength, out);
        }

        let Some(unit) = world.units.get_mut(zombie).filter(|unit| unit.alive) else {
            continue;
        };
        let UnitRole::Zombie { turns_to_hatch } = &mut unit.role else {
            continue;
        };
        *turns_to_hatch = turns_to_hatch.saturating_sub(1);
        if *turns_to_hatch == 0 {
            hatch(world, zombie, out);
        }
    }
}

fn hatch(world: &mut World, zombie: UnitId, out: &mut Vec<Event>) {
    let Some(unit) = world.units.get_mut(zombie) else {
        return;
    };
    unit.alive = false;
    let pos = unit.pos;
    world.grid.vacate(pos);
    let alien = world.spawn(pos, UnitTemplate::alien(AlienSpecies::Chryssalid));
    tracing::info!(%zombie, %alien, "zombie hatched");
    out.push(Event::ZombieHatched { zombie, alien });
}

#[cfg(test)]
mod tests {
    use terror_site_core::{Command, StatusEffect};

    use super::*;
    use crate::{apply, unit::ZOMBIE_MELEE_DAMAGE, MissionSpec, UnitSpec};

    fn field(layout: &[&str]) -> World {
        let spec = MissionSpec::new(layout.iter().copied()).with_unit(UnitSpec::soldier(0, 0));
        World::from_mission(&spec).expect("valid mission")
    }

    #[test]
    fn status_effects_tick_and_expire() {
        let mut world = field(&["..."]);
        let id = UnitId::new(1);
        if let Some(unit) = world.units.get_mut(id) {
            unit.status = vec![
                StatusEffect {
                    kind: StatusKind::Bleeding,
                    duration: 1,
                    stacks: 2,
                },
                StatusEffect {
                    kind: StatusKind::Irradiated,
                    duration: 3,
                    stacks: 3,
                },
            ];
        }
        let mut events = Vec::new();
        tick_status_effects(&mut world, &mut events);
        let unit = world.units.get(id).expect("soldier");
        assert_eq!(unit.health, 40 - 2 - 6);
        assert!(!unit.has_status(StatusKind::Bleeding));
        assert!(unit.has_status(StatusKind::Irradiated));
        assert!(events.contains(&Event::StatusExpired {
            unit: id,
            kind: StatusKind::Bleeding,
        }));
    }

    #[test]
    fn fire_burns_occupants_and_dies_out() {
        let mut world = field(&["..."]);
        let mut events = Vec::new();
        start_fire(&mut world, TilePos::new(0, 0), &mut events);
        for _ in 0..FIRE_DURATION {
            spread_fires(&mut world, &mut events);
            burn(&mut world, &mut events);
        }
        assert!(world.fires.is_empty());
        assert!(events.contains(&Event::FireBurnedOut {
            at: TilePos::new(0, 0)
        }));
        let unit = world.units.get(UnitId::new(1)).expect("soldier");
        assert_eq!(unit.health, 40 - 2 * FIRE_DAMAGE as i32);
    }

    #[test]
    fn smoke_covers_a_square() {
        let mut world = field(&[".....", ".....", ".....", ".....", "....."]);
        let mut events = Vec::new();
        deploy_smoke(&mut world, TilePos::new(0, 0), &mut events);
        let smoke = world.grid.smoke_view();
        assert!(smoke.has_smoke(TilePos::new(2, 2)));
        assert!(!smoke.has_smoke(TilePos::new(3, 0)));
        assert_eq!(smoke.turns_left(TilePos::new(1, 1)), SMOKE_TURNS);
    }

    #[test]
    fn stepping_next_to_a_mine_sets_it_off() {
        let mut world = field(&["....."]);
        let mut events = Vec::new();
        arm_mine(
            &mut world,
            TilePos::new(4, 0),
            Blast {
                damage: 60,
                radius: 2,
            },
            UnitId::new(1),
            &mut events,
        );
        check_mines(&mut world, UnitId::new(1), &mut events);
        assert_eq!(world.mines.len(), 1);

        let _ = world.relocate(UnitId::new(1), TilePos::new(3, 0));
        check_mines(&mut world, UnitId::new(1), &mut events);
        assert!(world.mines.is_empty());
        assert!(events.contains(&Event::MineTriggered {
            at: TilePos::new(4, 0),
            by: UnitId::new(1),
        }));
        let unit = world.units.get(UnitId::new(1)).expect("soldier");
        assert_eq!(unit.health, 40 - 30);
    }

    fn end_turn_after_fires(layout: &[&str], seed: u64, fires: &[TilePos]) -> Vec<Event> {
        let spec = MissionSpec::new(layout.iter().copied())
            .with_seed(seed)
            .with_unit(UnitSpec::soldier(0, 0));
        let mut world = World::from_mission(&spec).expect("valid mission");
        let mut events = Vec::new();
        for at in fires {
            start_fire(&mut world, *at, &mut events);
        }
        events.clear();
        apply(&mut world, Command::EndTurn, &mut events);
        events
    }

    #[test]
    fn fire_spreads_to_a_flammable_orthogonal_neighbour_one_time_in_five() {
        let centre = TilePos::new(1, 1);
        let trials = 2_000;
        let mut spread = 0_u32;
        for seed in 0..trials {
            let events = end_turn_after_fires(&[".*.", "***", ".*."], seed, &[centre]);
            let lit: Vec<TilePos> = events
                .iter()
                .filter_map(|event| match event {
                    Event::FireStarted { at } => Some(*at),
                    _ => None,
                })
                .collect();
            assert!(lit.len() <= 1, "{lit:?}");
            if let Some(at) = lit.first() {
                assert_eq!(at.manhattan_distance(centre), 1, "{at}");
                spread += 1;
            }
        }
        let rate = f64::from(spread) / trials as f64;
        assert!((0.16..=0.24).contains(&rate), "spread rate {rate}");
    }

    #[test]
    fn fire_never_spreads_onto_burning_or_fireproof_tiles() {
        let fires = [TilePos::new(1, 0), TilePos::new(2, 0)];
        for seed in 0..200 {
            let events = end_turn_after_fires(&[".**."], seed, &fires);
            assert!(
                !events
                    .iter()
                    .any(|event| matches!(event, Event::FireStarted { .. })),
                "seed {seed}: {events:?}"
            );
        }
    }

    #[test]
    fn zombies_strike_one_adjacent_squad_member_per_alien_turn() {
        let spec = MissionSpec::new([".....", "....."])
            .with_unit(UnitSpec::soldier(0, 0))
            .with_unit(UnitSpec::soldier(2, 0))
            .with_unit(UnitSpec::soldier(4, 1));
        let mut world = World::from_mission(&spec).expect("valid mission");
        let zombie = world.spawn(TilePos::new(1, 0), UnitTemplate::zombie());
        let mut events = Vec::new();

        apply(&mut world, Command::EndTurn, &mut events);

        let struck: Vec<UnitId> = events
            .iter()
            .filter_map(|event| match event {
                Event::UnitDamaged { unit, .. } => Some(*unit),
                _ => None,
            })
            .collect();
        assert_eq!(struck, vec![UnitId::new(1)]);
        let first = world.units.get(UnitId::new(1)).expect("soldier");
        assert_eq!(first.health, 40 - ZOMBIE_MELEE_DAMAGE as i32);
        assert!(first.has_status(StatusKind::Bleeding));
        for untouched in [UnitId::new(2), UnitId::new(3)] {
            assert_eq!(world.units.get(untouched).expect("soldier").health, 40);
        }
        assert!(world.units.get(zombie).is_some_and(|unit| unit.alive));
    }
}
