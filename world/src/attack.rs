//! Weapon fire, melee strikes, damage, deaths and explosions.

use terror_site_core::{
    AmmoEffect, Event, Rejection, ShotType, StatusKind, Tile, TilePos, UnitId, UnitRole,
};
use terror_site_system_combat::{
    self as combat, cover_bonus, effective_armor, explosion_footprint, hit_chance,
    knockback_path, mitigate, roll_damage, ShotContext,
};
use terror_site_system_visibility::has_line_of_sight;

use crate::{
    hazards::{self, BLEEDING_DURATION},
    sight,
    unit::UnitTemplate,
    World,
};

const IRRADIATED_DURATION: u32 = 3;
const SHOCKED_DURATION: u32 = 1;

/// What inflicted a wound, which decides what the victim's death triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DamageSource {
    Weapon,
    Melee { attacker: UnitId },
    Explosion,
    Hazard,
}

/// Fires the attacker's weapon at the target.
///
/// Validation happens up front so a refused shot leaves no trace. Every round
/// of a burst is rolled independently; rounds that connect after the target
/// went down are wasted.
pub(crate) fn fire(
    world: &mut World,
    attacker: UnitId,
    target: UnitId,
    shot: ShotType,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    let shooter = world.living(attacker)?;
    let victim = world.living(target)?;
    if shooter.controller() == victim.controller() {
        return Err(Rejection::InvalidTarget);
    }
    let weapon = shooter.weapon.ok_or(Rejection::NoWeapon)?;
    let stats = weapon.kind.stats();
    let profile = stats.profile(shot).ok_or(Rejection::ShotUnavailable)?;
    if weapon.ammo == Some(0) {
        return Err(Rejection::NoAmmo);
    }
    let (from, to) = (shooter.pos, victim.pos);
    if !stats.reaches(from, to) {
        return Err(if stats.effect == AmmoEffect::Stun {
            Rejection::NotAdjacent
        } else {
            Rejection::OutOfRange
        });
    }
    if !has_line_of_sight(&world.grid.terrain_view(), from, to) {
        return Err(Rejection::NoLineOfSight);
    }
    let time_units = shooter.time_units.ok_or(Rejection::NotEnoughTu)?;
    let cost = profile.tu_cost(time_units.max());
    if !time_units.can_afford(cost) {
        return Err(Rejection::NotEnoughTu);
    }
    let rounds = weapon
        .ammo
        .map_or(profile.rounds, |loaded| profile.rounds.min(loaded));
    let context = ShotContext {
        accuracy: shooter.stats.accuracy,
        stance: shooter.stance,
        health: shooter.health,
        health_max: shooter.health_max,
        night: world.night,
        shot_accuracy: profile.accuracy,
        cover: cover_bonus(
            &world.grid.terrain_view(),
            &world.grid.smoke_view(),
            from,
            to,
        ),
    };

    if let Some(unit) = world.units.get_mut(attacker) {
        if let Some(time_units) = unit.time_units.as_mut() {
            time_units.spend(cost)?;
        }
        if let Some(ammo) = unit.weapon.as_mut().and_then(|weapon| weapon.ammo.as_mut()) {
            *ammo -= rounds;
        }
    }

    if stats.effect == AmmoEffect::Stun {
        out.push(Event::ShotFired {
            attacker,
            target,
            shot,
            rounds,
            hits: 1,
        });
        stun(world, target, stats.damage, out);
        return Ok(());
    }

    let chance = hit_chance(&context);
    let hits = (0..rounds)
        .filter(|_| combat::roll(&mut world.rng, chance))
        .count() as u32;
    tracing::debug!(%attacker, %target, %shot, chance, rounds, hits, "shot resolved");
    out.push(Event::ShotFired {
        attacker,
        target,
        shot,
        rounds,
        hits,
    });

    for _ in 0..hits {
        let Some((armor, pos)) = world
            .units
            .get(target)
            .filter(|unit| unit.alive)
            .map(|unit| (unit.armor, unit.pos))
        else {
            break;
        };
        let raw = roll_damage(&mut world.rng, stats.damage);
        let amount = mitigate(raw, effective_armor(armor, stats.effect));
        if damage(world, target, amount, DamageSource::Weapon, out) {
            if let Some(radius) = stats.blast_radius {
                explode(world, pos, stats.damage, radius, out);
            }
            break;
        }
        match stats.effect {
            AmmoEffect::Knockback { distance } => knock_back(world, from, target, distance, out),
            AmmoEffect::Incendiary => hazards::start_fire(world, pos, out),
            AmmoEffect::Irradiate => afflict(
                world,
                target,
                StatusKind::Irradiated,
                IRRADIATED_DURATION,
                out,
            ),
            AmmoEffect::Plain
            | AmmoEffect::BypassArmor
            | AmmoEffect::Penetration { .. }
            | AmmoEffect::Stun => {}
        }
    }
    Ok(())
}

fn stun(world: &mut World, target: UnitId, base: u32, out: &mut Vec<Event>) {
    let amount = roll_damage(&mut world.rng, base);
    let Some(unit) = world.units.get_mut(target) else {
        return;
    };
    unit.stun_damage += amount;
    let stun_damage = unit.stun_damage;
    let knocked_out = i64::from(stun_damage) >= i64::from(unit.health);
    out.push(Event::UnitStunned {
        unit: target,
        stun_damage,
    });
    if knocked_out {
        capture(world, target, out);
    } else {
        afflict(world, target, StatusKind::Shocked, SHOCKED_DURATION, out);
    }
}

fn afflict(
    world: &mut World,
    target: UnitId,
    kind: StatusKind,
    duration: u32,
    out: &mut Vec<Event>,
) {
    if let Some(unit) = world.units.get_mut(target).filter(|unit| unit.alive) {
        unit.add_status(kind, duration);
        out.push(Event::StatusApplied { unit: target, kind });
    }
}

/// Pushes the target away from `origin`, stopping before the first tile it
/// cannot enter. Mines around the final tile are checked.
fn knock_back(
    world: &mut World,
    origin: TilePos,
    target: UnitId,
    distance: u32,
    out: &mut Vec<Event>,
) {
    let Some(start) = world.units.get(target).map(|unit| unit.pos) else {
        return;
    };
    let landing = knockback_path(origin, start, distance)
        .into_iter()
        .take_while(|pos| world.grid.is_open(*pos))
        .last();
    let Some(landing) = landing else {
        return;
    };
    if let Some(from) = world.relocate(target, landing) {
        out.push(Event::UnitKnockedBack {
            unit: target,
            from,
            to: landing,
        });
    }
    hazards::check_mines(world, target, out);
    sight::refresh(world, out);
}

/// Melee blow from `attacker`. Survivors start bleeding.
pub(crate) fn strike(
    world: &mut World,
    attacker: UnitId,
    target: UnitId,
    raw: u32,
    out: &mut Vec<Event>,
) {
    let Some(armor) = world
        .units
        .get(target)
        .filter(|unit| unit.alive)
        .map(|unit| unit.armor)
    else {
        return;
    };
    let amount = mitigate(raw, armor);
    tracing::debug!(%attacker, %target, amount, "melee strike");
    if !damage(world, target, amount, DamageSource::Melee { attacker }, out) {
        afflict(world, target, StatusKind::Bleeding, BLEEDING_DURATION, out);
    }
}

/// Wounds a living unit, killing it at 0 health. Returns whether it died.
pub(crate) fn damage(
    world: &mut World,
    target: UnitId,
    amount: u32,
    source: DamageSource,
    out: &mut Vec<Event>,
) -> bool {
    let Some(unit) = world.units.get_mut(target).filter(|unit| unit.alive) else {
        return false;
    };
    unit.health = unit
        .health
        .saturating_sub(i32::try_from(amount).unwrap_or(i32::MAX));
    out.push(Event::UnitDamaged {
        unit: target,
        amount,
        health: unit.health,
    });
    if unit.health > 0 {
        return false;
    }
    kill(world, target, source, out);
    true
}

fn kill(world: &mut World, id: UnitId, source: DamageSource, out: &mut Vec<Event>) {
    let Some(unit) = world.units.get_mut(id) else {
        return;
    };
    unit.alive = false;
    unit.overwatching = false;
    let (pos, role) = (unit.pos, unit.role);
    world.grid.vacate(pos);
    match role {
        UnitRole::Soldier => world.stats.losses += 1,
        UnitRole::Civilian => world.stats.civilians_lost += 1,
        UnitRole::Alien { .. } | UnitRole::Zombie { .. } => world.stats.kills += 1,
    }
    tracing::info!(unit = %id, ?source, "unit killed");
    out.push(Event::UnitKilled { unit: id });

    let DamageSource::Melee { attacker } = source else {
        return;
    };
    let zombifies = world
        .units
        .get(attacker)
        .and_then(|unit| unit.role.species())
        .is_some_and(|species| species.zombifies());
    if zombifies && matches!(role, UnitRole::Soldier | UnitRole::Civilian) {
        let zombie = world.spawn(pos, UnitTemplate::zombie());
        out.push(Event::ZombieRisen { zombie, victim: id });
    }
}

fn capture(world: &mut World, id: UnitId, out: &mut Vec<Event>) {
    let Some(unit) = world.units.get_mut(id) else {
        return;
    };
    unit.alive = false;
    unit.captured = true;
    unit.overwatching = false;
    let (pos, role) = (unit.pos, unit.role);
    world.grid.vacate(pos);
    if role.is_hostile() {
        world.stats.captures += 1;
    } else if matches!(role, UnitRole::Soldier) {
        world.stats.losses += 1;
    }
    tracing::info!(unit = %id, "unit captured");
    out.push(Event::UnitCaptured { unit: id });
}

/// Detonates an explosion, hurting every unit where the falloff is positive
/// and wearing down destructible terrain.
pub(crate) fn explode(
    world: &mut World,
    center: TilePos,
    blast_damage: u32,
    radius: u32,
    out: &mut Vec<Event>,
) {
    out.push(Event::Explosion {
        center,
        damage: blast_damage,
        radius,
    });
    let footprint = explosion_footprint(&world.grid.terrain_view(), center, blast_damage, radius);
    let mut reshaped = false;
    for blast in footprint {
        let amount = blast.falloff.round() as u32;
        if blast.falloff > 0.0 {
            let victim = world.grid.occupant(blast.pos).and_then(|id| {
                world
                    .units
                    .get(id)
                    .filter(|unit| unit.alive)
                    .map(|unit| (id, unit.armor))
            });
            if let Some((id, armor)) = victim {
                let _ = damage(world, id, mitigate(amount, armor), DamageSource::Explosion, out);
            }
        }
        if let Some(tile) = world
            .grid
            .tile_mut(blast.pos)
            .filter(|tile| tile.destructible)
        {
            tile.hp -= i32::try_from(amount).unwrap_or(i32::MAX);
            if tile.hp <= 0 {
                *tile = Tile::rubble();
                reshaped = true;
                out.push(Event::TerrainDestroyed { at: blast.pos });
            }
        }
    }
    if reshaped {
        sight::refresh(world, out);
    }
}

#[cfg(test)]
mod tests {
    use terror_site_core::{AlienSpecies, Command, WeaponKind};

    use super::*;
    use crate::{apply, query, MissionSpec, StatOverrides, UnitSpec};

    fn duel(shooter: UnitSpec, target: UnitSpec, width: usize) -> World {
        let row = ".".repeat(width);
        let spec = MissionSpec::new([row])
            .with_seed(11)
            .with_unit(shooter)
            .with_unit(target);
        World::from_mission(&spec).expect("valid mission")
    }

    fn fire_at(world: &mut World, shot: ShotType) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Attack {
                attacker: UnitId::new(1),
                target: UnitId::new(2),
                shot,
            },
            &mut events,
        );
        events
    }

    #[test]
    fn missing_fire_mode_is_rejected() {
        let mut world = duel(
            UnitSpec::soldier(0, 0).with_weapon(WeaponKind::Pistol),
            UnitSpec::alien(AlienSpecies::Sectoid, 3, 0),
            5,
        );
        assert_eq!(
            fire_at(&mut world, ShotType::Auto),
            vec![Event::CommandRejected {
                reason: Rejection::ShotUnavailable
            }]
        );
    }

    #[test]
    fn walls_block_shots() {
        let spec = MissionSpec::new([".#."])
            .with_unit(UnitSpec::soldier(0, 0))
            .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 2, 0));
        let mut world = World::from_mission(&spec).expect("valid mission");
        assert_eq!(
            fire_at(&mut world, ShotType::Snap),
            vec![Event::CommandRejected {
                reason: Rejection::NoLineOfSight
            }]
        );
    }

    #[test]
    fn targets_beyond_range_are_rejected() {
        let mut world = duel(
            UnitSpec::soldier(0, 0).with_weapon(WeaponKind::Pistol),
            UnitSpec::alien(AlienSpecies::Sectoid, 13, 0),
            14,
        );
        assert_eq!(
            fire_at(&mut world, ShotType::Snap),
            vec![Event::CommandRejected {
                reason: Rejection::OutOfRange
            }]
        );
    }

    #[test]
    fn auto_fire_uses_remaining_rounds() {
        let mut world = duel(
            UnitSpec::soldier(0, 0),
            UnitSpec::alien(AlienSpecies::Muton, 2, 0),
            4,
        );
        if let Some(weapon) = world
            .units
            .get_mut(UnitId::new(1))
            .and_then(|unit| unit.weapon.as_mut())
        {
            weapon.ammo = Some(2);
        }
        let events = fire_at(&mut world, ShotType::Auto);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::ShotFired { rounds: 2, .. })));
        let soldier = query::unit(&world, UnitId::new(1)).expect("soldier");
        assert_eq!(soldier.weapon.and_then(|weapon| weapon.ammo), Some(0));
        assert_eq!(
            fire_at(&mut world, ShotType::Snap),
            vec![Event::CommandRejected {
                reason: Rejection::NoAmmo
            }]
        );
    }

    #[test]
    fn stun_rod_needs_adjacency_and_captures() {
        let mut world = duel(
            UnitSpec::soldier(0, 0).with_weapon(WeaponKind::StunRod),
            UnitSpec::alien(AlienSpecies::Sectoid, 2, 0).with_stats(StatOverrides {
                health: Some(1),
                ..StatOverrides::default()
            }),
            4,
        );
        assert_eq!(
            fire_at(&mut world, ShotType::Snap),
            vec![Event::CommandRejected {
                reason: Rejection::NotAdjacent
            }]
        );
        let _ = world.relocate(UnitId::new(2), TilePos::new(1, 0));
        let events = fire_at(&mut world, ShotType::Snap);
        assert!(events.contains(&Event::UnitCaptured {
            unit: UnitId::new(2)
        }));
        let alien = query::unit(&world, UnitId::new(2)).expect("alien");
        assert!(alien.captured);
        assert!(!alien.alive);
        assert_eq!(query::stats(&world).captures, 1);
        assert_eq!(query::occupancy_view(&world).occupant(TilePos::new(1, 0)), None);
    }

    #[test]
    fn explosions_fall_off_and_flatten_walls() {
        let spec = MissionSpec::new(["......", "..#..."])
            .with_unit(UnitSpec::soldier(5, 0))
            .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 1, 0).with_stats(
                StatOverrides {
                    armor: Some(0),
                    health: Some(100),
                    ..StatOverrides::default()
                },
            ));
        let mut world = World::from_mission(&spec).expect("valid mission");
        let mut events = Vec::new();
        explode(&mut world, TilePos::new(2, 0), 120, 2, &mut events);

        let alien = world.units.get(UnitId::new(2)).expect("alien");
        assert_eq!(alien.health, 100 - 60);
        let soldier = world.units.get(UnitId::new(1)).expect("soldier");
        assert_eq!(soldier.health, soldier.health_max);
        assert!(events.contains(&Event::TerrainDestroyed {
            at: TilePos::new(2, 1)
        }));
        assert_eq!(
            world.grid.tile(TilePos::new(2, 1)).map(|tile| tile.kind),
            Some(terror_site_core::TerrainKind::Rubble)
        );
    }

    #[test]
    fn chryssalid_kills_raise_zombies() {
        let mut world = duel(
            UnitSpec::alien(AlienSpecies::Chryssalid, 0, 0),
            UnitSpec::civilian(1, 0),
            3,
        );
        let mut events = Vec::new();
        strike(&mut world, UnitId::new(1), UnitId::new(2), 500, &mut events);
        let zombie = UnitId::new(3);
        assert!(events.contains(&Event::ZombieRisen {
            zombie,
            victim: UnitId::new(2),
        }));
        assert_eq!(world.grid.occupant(TilePos::new(1, 0)), Some(zombie));
        assert_eq!(query::stats(&world).civilians_lost, 1);
    }

    #[test]
    fn melee_survivors_bleed() {
        let mut world = duel(
            UnitSpec::alien(AlienSpecies::Chryssalid, 0, 0),
            UnitSpec::soldier(1, 0),
            3,
        );
        let mut events = Vec::new();
        strike(&mut world, UnitId::new(1), UnitId::new(2), 5, &mut events);
        let soldier = world.units.get(UnitId::new(2)).expect("soldier");
        assert_eq!(soldier.health, 35);
        assert!(soldier.has_status(StatusKind::Bleeding));
    }

    #[test]
    fn knockback_pushes_its_full_distance_until_blocked() {
        let muton = UnitId::new(2);
        let cases = [
            (".......", None, Some(TilePos::new(4, 0))),
            ("....#..", None, Some(TilePos::new(3, 0))),
            ("...#...", None, None),
            (".......", Some(TilePos::new(4, 0)), Some(TilePos::new(3, 0))),
        ];
        for (row, bystander, landing) in cases {
            let mut spec = MissionSpec::new([row])
                .with_unit(UnitSpec::soldier(0, 0))
                .with_unit(UnitSpec::alien(AlienSpecies::Muton, 2, 0));
            if let Some(pos) = bystander {
                spec = spec.with_unit(UnitSpec::civilian(pos.x(), pos.y()));
            }
            let mut world = World::from_mission(&spec).expect("valid mission");
            let mut events = Vec::new();

            knock_back(&mut world, TilePos::new(0, 0), muton, 2, &mut events);

            let pushed = events.iter().find_map(|event| match event {
                Event::UnitKnockedBack { unit, from, to } if *unit == muton => {
                    assert_eq!(*from, TilePos::new(2, 0));
                    Some(*to)
                }
                _ => None,
            });
            assert_eq!(pushed, landing, "{row}");
            let alien = query::unit(&world, muton).expect("muton");
            assert_eq!(alien.pos, landing.unwrap_or(TilePos::new(2, 0)), "{row}");
            assert_eq!(
                query::occupancy_view(&world).occupant(alien.pos),
                Some(muton)
            );
        }
    }
}
