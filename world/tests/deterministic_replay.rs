use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use terror_site_core::{
    AlienAbility, AlienSpecies, Command, Event, ItemKind, ShotType, TilePos, UnitId, UnitSnapshot,
    WeaponKind,
};
use terror_site_world::{self as world, query, MissionSpec, UnitSpec, World};

#[test]
fn deterministic_replay_of_a_scripted_mission() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(first
        .events
        .iter()
        .any(|event| matches!(event, Event::ShotFired { .. })));
    assert!(first
        .events
        .iter()
        .any(|event| matches!(event, Event::Explosion { .. })));
}

#[test]
fn different_seeds_diverge() {
    let baseline = replay_with_seed(scripted_commands(), 1);
    let diverged = (2..12).any(|seed| replay_with_seed(scripted_commands(), seed) != baseline);
    assert!(diverged, "seed had no influence on the outcome");
}

fn mission(seed: u64) -> MissionSpec {
    MissionSpec::new([
        "..........",
        "..+...*...",
        "..........",
        "....#.....",
        "..........",
    ])
    .with_seed(seed)
    .with_unit(
        UnitSpec::soldier(0, 0)
            .with_inventory([ItemKind::FragGrenade, ItemKind::SmokeGrenade, ItemKind::Clip]),
    )
    .with_unit(UnitSpec::soldier(0, 2).with_weapon(WeaponKind::HeavyCannon))
    .with_unit(UnitSpec::soldier(0, 4).with_weapon(WeaponKind::LaserRifle))
    .with_unit(UnitSpec::alien(AlienSpecies::Muton, 7, 1))
    .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 8, 3))
    .with_unit(UnitSpec::alien(AlienSpecies::Reaper, 9, 4))
}

fn scripted_commands() -> Vec<Command> {
    let soldier = UnitId::new;
    vec![
        Command::Attack {
            attacker: soldier(1),
            target: UnitId::new(4),
            shot: ShotType::Auto,
        },
        Command::Attack {
            attacker: soldier(2),
            target: UnitId::new(4),
            shot: ShotType::Snap,
        },
        Command::Throw {
            unit: soldier(1),
            item: ItemKind::FragGrenade,
            target: TilePos::new(8, 2),
        },
        Command::Attack {
            attacker: soldier(3),
            target: UnitId::new(5),
            shot: ShotType::Auto,
        },
        Command::SetOverwatch { unit: soldier(3) },
        Command::EndTurn,
        Command::Move {
            unit: UnitId::new(5),
            destination: TilePos::new(5, 4),
        },
        Command::AlienAbility {
            unit: UnitId::new(6),
            ability: AlienAbility::Charge {
                target: soldier(3),
            },
        },
        Command::EndAlienTurn,
        Command::Move {
            unit: soldier(2),
            destination: TilePos::new(3, 2),
        },
        Command::Throw {
            unit: soldier(1),
            item: ItemKind::SmokeGrenade,
            target: TilePos::new(2, 1),
        },
        Command::Reload { unit: soldier(1) },
        Command::EndTurn,
        Command::EndAlienTurn,
    ]
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
    units: Vec<UnitSnapshot>,
    messages: Vec<String>,
    turn: u32,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        format!("{:?}", self.events).hash(&mut hasher);
        format!("{:?}", self.units).hash(&mut hasher);
        self.messages.hash(&mut hasher);
        self.turn.hash(&mut hasher);
        hasher.finish()
    }
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    replay_with_seed(commands, 42)
}

fn replay_with_seed(commands: Vec<Command>, seed: u64) -> ReplayOutcome {
    let mut world = World::from_mission(&mission(seed)).expect("valid mission");
    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    ReplayOutcome {
        events,
        units: query::unit_view(&world).into_vec(),
        messages: query::messages(&world).map(str::to_owned).collect(),
        turn: query::turn(&world),
    }
}
