//! Grenades, mines, medikits and clips.

use terror_site_core::{Event, ItemKind, Rejection, StatusKind, TilePos, UnitId};
use terror_site_system_combat::{scatter, scatter_radius};

use crate::{attack, hazards, World};

const THROW_RANGE: f32 = 12.0;
const THROW_TU_PERCENT: f32 = 0.25;
const MEDIKIT_HEAL: i32 = 15;
const MEDIKIT_TU_COST: u32 = 10;
const RELOAD_TU_COST: u32 = 10;

/// Throws a grenade or mine toward `target`, scattering with distance.
pub(crate) fn throw(
    world: &mut World,
    id: UnitId,
    item: ItemKind,
    target: TilePos,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    if !item.is_throwable() {
        return Err(Rejection::WrongItem);
    }
    if !world.grid.in_bounds(target) {
        return Err(Rejection::OutOfBounds);
    }
    let unit = world.units.get_mut(id).ok_or(Rejection::UnknownUnit)?;
    if !unit.carries(item) {
        return Err(Rejection::ItemMissing);
    }
    let distance = unit.pos.euclidean_distance(target);
    if distance > THROW_RANGE {
        return Err(Rejection::OutOfRange);
    }
    let cost = (unit.tu_max() as f32 * THROW_TU_PERCENT).round() as u32;
    unit.time_units
        .as_mut()
        .ok_or(Rejection::NotEnoughTu)?
        .spend(cost)?;
    let _ = unit.take_item(item);
    let radius = scatter_radius(unit.stats.throwing_accuracy, distance);

    let landing = scatter(&mut world.rng, &world.grid.terrain_view(), target, radius);
    tracing::debug!(unit = %id, %item, %target, %landing, "item thrown");
    out.push(Event::ItemLanded { item, at: landing });
    match item {
        ItemKind::SmokeGrenade => hazards::deploy_smoke(world, landing, out),
        ItemKind::ProximityMine => {
            if let Some(blast) = item.blast() {
                hazards::arm_mine(world, landing, blast, id, out);
            }
        }
        ItemKind::FragGrenade | ItemKind::Medikit | ItemKind::Clip => {
            if let Some(blast) = item.blast() {
                attack::explode(world, landing, blast.damage, blast.radius, out);
            }
        }
    }
    Ok(())
}

/// Uses a non-throwable item, on the user unless another recipient is named.
pub(crate) fn use_item(
    world: &mut World,
    id: UnitId,
    item: ItemKind,
    recipient: Option<UnitId>,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    match item {
        ItemKind::Medikit => heal(world, id, recipient.unwrap_or(id), out),
        ItemKind::Clip => reload(world, id, out),
        ItemKind::FragGrenade | ItemKind::SmokeGrenade | ItemKind::ProximityMine => {
            Err(Rejection::WrongItem)
        }
    }
}

fn heal(
    world: &mut World,
    id: UnitId,
    recipient: UnitId,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    let medic = world.living(id)?;
    if !medic.carries(ItemKind::Medikit) {
        return Err(Rejection::ItemMissing);
    }
    let patient = world.living(recipient)?;
    if recipient != id {
        if patient.controller() != medic.controller() {
            return Err(Rejection::InvalidTarget);
        }
        if !patient.pos.is_adjacent(medic.pos) {
            return Err(Rejection::NotAdjacent);
        }
    }

    let medic = world.units.get_mut(id).ok_or(Rejection::UnknownUnit)?;
    medic
        .time_units
        .as_mut()
        .ok_or(Rejection::NotEnoughTu)?
        .spend(MEDIKIT_TU_COST)?;
    let _ = medic.take_item(ItemKind::Medikit);

    let patient = world
        .units
        .get_mut(recipient)
        .ok_or(Rejection::UnknownUnit)?;
    let restored = MEDIKIT_HEAL.min(patient.health_max - patient.health).max(0);
    patient.health += restored;
    if patient.clear_status(StatusKind::Bleeding) {
        out.push(Event::StatusExpired {
            unit: recipient,
            kind: StatusKind::Bleeding,
        });
    }
    out.push(Event::Healed {
        unit: recipient,
        amount: restored.unsigned_abs(),
    });
    Ok(())
}

/// Refills the equipped weapon from a carried clip.
pub(crate) fn reload(
    world: &mut World,
    id: UnitId,
    out: &mut Vec<Event>,
) -> Result<(), Rejection> {
    let unit = world.units.get_mut(id).ok_or(Rejection::UnknownUnit)?;
    let weapon = unit.weapon.ok_or(Rejection::NoWeapon)?;
    let capacity = weapon
        .kind
        .stats()
        .ammo_capacity
        .ok_or(Rejection::WrongItem)?;
    if !unit.carries(ItemKind::Clip) {
        return Err(Rejection::ItemMissing);
    }
    unit.time_units
        .as_mut()
        .ok_or(Rejection::NotEnoughTu)?
        .spend(RELOAD_TU_COST)?;
    let _ = unit.take_item(ItemKind::Clip);
    if let Some(weapon) = unit.weapon.as_mut() {
        weapon.ammo = Some(capacity);
    }
    out.push(Event::Reloaded { unit: id });
    Ok(())
}

#[cfg(test)]
mod tests {
    use terror_site_core::{AlienSpecies, Command};

    use super::*;
    use crate::{apply, query, MissionSpec, StatOverrides, UnitSpec};

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    #[test]
    fn medikit_heals_an_adjacent_ally_and_stops_bleeding() {
        let spec = MissionSpec::new(["...."])
            .with_unit(UnitSpec::soldier(0, 0).with_inventory([ItemKind::Medikit]))
            .with_unit(UnitSpec::soldier(1, 0))
            .with_unit(UnitSpec::soldier(3, 0));
        let mut world = World::from_mission(&spec).expect("valid mission");
        if let Some(unit) = world.units.get_mut(UnitId::new(2)) {
            unit.health = 10;
            unit.add_status(StatusKind::Bleeding, 3);
        }

        let far = run(
            &mut world,
            Command::UseItem {
                unit: UnitId::new(1),
                item: ItemKind::Medikit,
                target: Some(UnitId::new(3)),
            },
        );
        assert_eq!(
            far,
            vec![Event::CommandRejected {
                reason: Rejection::NotAdjacent
            }]
        );

        let events = run(
            &mut world,
            Command::UseItem {
                unit: UnitId::new(1),
                item: ItemKind::Medikit,
                target: Some(UnitId::new(2)),
            },
        );
        assert!(events.contains(&Event::Healed {
            unit: UnitId::new(2),
            amount: 15,
        }));
        let patient = query::unit(&world, UnitId::new(2)).expect("patient");
        assert_eq!(patient.health, 25);
        assert!(patient.status.is_empty());
        let medic = query::unit(&world, UnitId::new(1)).expect("medic");
        assert_eq!(medic.tu(), 40);
        assert!(medic.inventory.is_empty());
    }

    #[test]
    fn reload_consumes_a_clip() {
        let spec = MissionSpec::new([".."])
            .with_unit(UnitSpec::soldier(0, 0).with_inventory([ItemKind::Clip]));
        let mut world = World::from_mission(&spec).expect("valid mission");
        if let Some(weapon) = world
            .units
            .get_mut(UnitId::new(1))
            .and_then(|unit| unit.weapon.as_mut())
        {
            weapon.ammo = Some(3);
        }
        let events = run(
            &mut world,
            Command::Reload {
                unit: UnitId::new(1),
            },
        );
        assert_eq!(
            events,
            vec![Event::Reloaded {
                unit: UnitId::new(1)
            }]
        );
        let soldier = query::unit(&world, UnitId::new(1)).expect("soldier");
        assert_eq!(soldier.weapon.and_then(|weapon| weapon.ammo), Some(20));
        assert_eq!(
            run(
                &mut world,
                Command::Reload {
                    unit: UnitId::new(1)
                }
            ),
            vec![Event::CommandRejected {
                reason: Rejection::ItemMissing
            }]
        );
    }

    #[test]
    fn thrown_mines_arm_where_they_land() {
        let spec = MissionSpec::new([".........."])
            .with_unit(
                UnitSpec::soldier(0, 0)
                    .with_inventory([ItemKind::ProximityMine])
                    .with_stats(StatOverrides {
                        throwing_accuracy: Some(100),
                        ..StatOverrides::default()
                    }),
            )
            .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 9, 0));
        let mut world = World::from_mission(&spec).expect("valid mission");
        let events = run(
            &mut world,
            Command::Throw {
                unit: UnitId::new(1),
                item: ItemKind::ProximityMine,
                target: TilePos::new(5, 0),
            },
        );
        assert!(events.contains(&Event::MineArmed {
            at: TilePos::new(5, 0)
        }));
        assert_eq!(query::mines(&world).len(), 1);
        let soldier = query::unit(&world, UnitId::new(1)).expect("soldier");
        assert_eq!(soldier.tu(), 50 - 13);
    }

    #[test]
    fn medikits_cannot_be_thrown() {
        let spec = MissionSpec::new([".."])
            .with_unit(UnitSpec::soldier(0, 0).with_inventory([ItemKind::Medikit]));
        let mut world = World::from_mission(&spec).expect("valid mission");
        assert_eq!(
            run(
                &mut world,
                Command::Throw {
                    unit: UnitId::new(1),
                    item: ItemKind::Medikit,
                    target: TilePos::new(1, 0),
                }
            ),
            vec![Event::CommandRejected {
                reason: Rejection::WrongItem
            }]
        );
    }
}
