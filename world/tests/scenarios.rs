use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use terror_site_core::{
    AlienAbility, AlienSpecies, Command, Event, ItemKind, Phase, Rejection, ShotType, TilePos,
    UnitId, WeaponKind, MESSAGE_LOG_CAPACITY,
};
use terror_site_world::{self as world, query, MissionSpec, StatOverrides, UnitSpec, World};

fn deploy(spec: &MissionSpec) -> World {
    World::from_mission(spec).expect("valid mission")
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn open_field(width: usize, height: usize) -> Vec<String> {
    vec![".".repeat(width); height]
}

#[test]
fn pistol_snap_shots_cost_nine_tu_until_the_budget_runs_dry() {
    let spec = MissionSpec::new(open_field(6, 1))
        .with_seed(5)
        .with_unit(UnitSpec::soldier(0, 0).with_weapon(WeaponKind::Pistol))
        .with_unit(UnitSpec::alien(AlienSpecies::Ethereal, 3, 0));
    let mut world = deploy(&spec);
    let soldier = UnitId::new(1);
    let snap = Command::Attack {
        attacker: soldier,
        target: UnitId::new(2),
        shot: ShotType::Snap,
    };

    for expected in [41, 32, 23, 14, 5] {
        let events = run(&mut world, snap.clone());
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::ShotFired { .. })));
        assert_eq!(query::unit(&world, soldier).expect("soldier").tu(), expected);
    }

    let events = run(&mut world, snap);
    assert_eq!(
        events,
        vec![Event::CommandRejected {
            reason: Rejection::NotEnoughTu
        }]
    );
    assert_eq!(query::unit(&world, soldier).expect("soldier").tu(), 5);
    assert_eq!(query::messages(&world).last(), Some("Not enough TU!"));
}

#[test]
fn frag_grenade_one_tile_away_deals_a_third_of_its_damage() {
    let spec = MissionSpec::new(open_field(8, 1))
        .with_unit(
            UnitSpec::soldier(0, 0)
                .with_inventory([ItemKind::FragGrenade])
                .with_stats(StatOverrides {
                    throwing_accuracy: Some(100),
                    ..StatOverrides::default()
                }),
        )
        .with_unit(
            UnitSpec::alien(AlienSpecies::Sectoid, 6, 0).with_stats(StatOverrides {
                health: Some(100),
                armor: Some(0),
                ..StatOverrides::default()
            }),
        );
    let mut world = deploy(&spec);
    let events = run(
        &mut world,
        Command::Throw {
            unit: UnitId::new(1),
            item: ItemKind::FragGrenade,
            target: TilePos::new(5, 0),
        },
    );
    assert!(events.contains(&Event::ItemLanded {
        item: ItemKind::FragGrenade,
        at: TilePos::new(5, 0),
    }));
    assert!(events.contains(&Event::UnitDamaged {
        unit: UnitId::new(2),
        amount: 33,
        health: 67,
    }));
    let soldier = query::unit(&world, UnitId::new(1)).expect("soldier");
    assert_eq!(soldier.health, soldier.health_max);
    assert!(soldier.inventory.is_empty());
}

#[test]
fn reaction_fire_triggers_at_the_reactions_rate() {
    const TRIALS: u64 = 10_000;
    let mut reactions = 0;
    for seed in 0..TRIALS {
        let spec = MissionSpec::new(open_field(8, 3))
            .with_seed(seed)
            .with_unit(UnitSpec::soldier(0, 1).with_stats(StatOverrides {
                reactions: Some(70),
                ..StatOverrides::default()
            }))
            .with_unit(UnitSpec::alien(AlienSpecies::Ethereal, 6, 1));
        let mut world = deploy(&spec);
        let _ = run(
            &mut world,
            Command::SetOverwatch {
                unit: UnitId::new(1),
            },
        );
        let _ = run(&mut world, Command::EndTurn);
        let events = run(
            &mut world,
            Command::Move {
                unit: UnitId::new(2),
                destination: TilePos::new(6, 0),
            },
        );
        reactions += events
            .iter()
            .filter(|event| matches!(event, Event::ReactionFire { .. }))
            .count();
    }
    let rate = reactions as f64 / TRIALS as f64;
    assert!((0.67..=0.73).contains(&rate), "reaction rate {rate}");
}

#[test]
fn zombies_hatch_after_three_alien_turns() {
    let spec = MissionSpec::new(open_field(10, 1))
        .with_unit(UnitSpec::soldier(9, 0))
        .with_unit(UnitSpec::alien(AlienSpecies::Chryssalid, 0, 0))
        .with_unit(UnitSpec::civilian(1, 0));
    let mut world = deploy(&spec);
    let _ = run(&mut world, Command::EndTurn);
    let events = run(
        &mut world,
        Command::AlienAbility {
            unit: UnitId::new(2),
            ability: AlienAbility::Melee {
                target: UnitId::new(3),
            },
        },
    );
    let zombie = UnitId::new(4);
    assert!(events.contains(&Event::ZombieRisen {
        zombie,
        victim: UnitId::new(3),
    }));

    let mut hatched_on = None;
    for alien_turn in 1..=4 {
        let _ = run(&mut world, Command::EndAlienTurn);
        let events = run(&mut world, Command::EndTurn);
        if events
            .iter()
            .any(|event| matches!(event, Event::ZombieHatched { .. }))
        {
            hatched_on = Some(alien_turn);
            break;
        }
    }
    assert_eq!(hatched_on, Some(3));
    let shell = query::unit(&world, zombie).expect("zombie");
    assert!(!shell.alive);
    let chryssalid = query::unit(&world, UnitId::new(5)).expect("hatchling");
    assert_eq!(chryssalid.pos, TilePos::new(1, 0));
    assert!(chryssalid.alive);
}

#[test]
fn time_units_stay_within_bounds_under_random_orders() {
    let spec = MissionSpec::new(["......", "..+...", "......", "..#..."])
        .with_seed(21)
        .with_unit(UnitSpec::soldier(0, 0).with_inventory([ItemKind::Clip, ItemKind::Medikit]))
        .with_unit(UnitSpec::soldier(0, 2))
        .with_unit(UnitSpec::alien(AlienSpecies::Muton, 5, 3))
        .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 5, 0));
    let mut world = deploy(&spec);
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let shots = [ShotType::Snap, ShotType::Aimed, ShotType::Auto];

    for _ in 0..400 {
        if query::phase(&world).is_terminal() {
            break;
        }
        let unit = UnitId::new(rng.gen_range(1..=4));
        let command = match rng.gen_range(0..8) {
            0 => Command::Move {
                unit,
                destination: TilePos::new(rng.gen_range(0..6), rng.gen_range(0..4)),
            },
            1 => Command::Attack {
                attacker: unit,
                target: UnitId::new(rng.gen_range(1..=4)),
                shot: shots[rng.gen_range(0..shots.len())],
            },
            2 => Command::ToggleStance { unit },
            3 => Command::SetOverwatch { unit },
            4 => Command::Reload { unit },
            5 => Command::UseItem {
                unit,
                item: ItemKind::Medikit,
                target: None,
            },
            6 => Command::EndTurn,
            _ => Command::EndAlienTurn,
        };
        let _ = run(&mut world, command);
        for snapshot in query::unit_view(&world).iter() {
            assert!(snapshot.tu() <= snapshot.tu_max(), "{snapshot:?}");
        }
    }
}

#[test]
fn message_log_keeps_the_latest_lines() {
    let spec = MissionSpec::new(open_field(3, 1)).with_unit(UnitSpec::soldier(0, 0));
    let mut world = deploy(&spec);
    for _ in 0..MESSAGE_LOG_CAPACITY + 3 {
        let _ = run(
            &mut world,
            Command::Reload {
                unit: UnitId::new(1),
            },
        );
    }
    let messages: Vec<&str> = query::messages(&world).collect();
    assert_eq!(messages.len(), MESSAGE_LOG_CAPACITY);
    assert!(messages
        .iter()
        .all(|message| *message == "Item not in inventory!"));
}

#[test]
fn a_wiped_out_squad_loses() {
    let spec = MissionSpec::new(open_field(4, 1))
        .with_unit(UnitSpec::soldier(0, 0).with_stats(StatOverrides {
            health: Some(1),
            ..StatOverrides::default()
        }))
        .with_unit(UnitSpec::alien(AlienSpecies::Chryssalid, 1, 0));
    let mut world = deploy(&spec);
    let _ = run(&mut world, Command::EndTurn);
    let _ = run(
        &mut world,
        Command::AlienAbility {
            unit: UnitId::new(2),
            ability: AlienAbility::Melee {
                target: UnitId::new(1),
            },
        },
    );
    let events = run(&mut world, Command::EndAlienTurn);
    assert!(events.contains(&Event::PhaseChanged {
        phase: Phase::Defeat,
        turn: 1,
    }));
    assert_eq!(query::stats(&world).losses, 1);
    assert_eq!(
        run(&mut world, Command::EndTurn),
        vec![Event::CommandRejected {
            reason: Rejection::GameOver
        }]
    );
}

#[test]
fn knocked_back_movers_never_skip_tiles() {
    let muton = UnitId::new(2);
    let (start, destination) = (TilePos::new(4, 1), TilePos::new(4, 5));
    let mut knocked = 0;
    for seed in 0..100 {
        let spec = MissionSpec::new(open_field(8, 7))
            .with_seed(seed)
            .with_unit(
                UnitSpec::soldier(0, 0)
                    .with_weapon(WeaponKind::HeavyCannon)
                    .with_stats(StatOverrides {
                        reactions: Some(100),
                        ..StatOverrides::default()
                    }),
            )
            .with_unit(
                UnitSpec::alien(AlienSpecies::Muton, start.x(), start.y()).with_stats(
                    StatOverrides {
                        health: Some(1_000),
                        ..StatOverrides::default()
                    },
                ),
            );
        let mut world = deploy(&spec);
        let _ = run(&mut world, Command::SetOverwatch { unit: UnitId::new(1) });
        let _ = run(&mut world, Command::EndTurn);
        let events = run(
            &mut world,
            Command::Move {
                unit: muton,
                destination,
            },
        );

        let mut at = start;
        let mut pushed = false;
        for event in &events {
            match event {
                Event::UnitMoved { unit, from, to } if *unit == muton => {
                    assert_eq!(*from, at, "seed {seed}: {events:?}");
                    assert_eq!(from.manhattan_distance(*to), 1, "seed {seed}: {events:?}");
                    at = *to;
                }
                Event::UnitKnockedBack { unit, from, to } if *unit == muton => {
                    assert_eq!(*from, at, "seed {seed}: {events:?}");
                    at = *to;
                    pushed = true;
                }
                _ => {}
            }
        }
        assert_eq!(query::unit(&world, muton).expect("muton").pos, at);
        if pushed {
            knocked += 1;
            if at != destination {
                assert!(
                    events.contains(&Event::MoveInterrupted { unit: muton, at }),
                    "seed {seed}: {events:?}"
                );
            }
        }
    }
    assert!(knocked > 0, "no reaction shot ever knocked the mover back");
}

#[test]
fn reaction_fire_stops_once_the_mover_is_down() {
    let sectoid = UnitId::new(3);
    let mut killed_by_first = 0;
    for seed in 0..60 {
        let watcher = || {
            StatOverrides {
                reactions: Some(100),
                ..StatOverrides::default()
            }
        };
        let spec = MissionSpec::new(open_field(8, 3))
            .with_seed(seed)
            .with_unit(UnitSpec::soldier(0, 0).with_stats(watcher()))
            .with_unit(UnitSpec::soldier(0, 2).with_stats(watcher()))
            .with_unit(
                UnitSpec::alien(AlienSpecies::Sectoid, 6, 1).with_stats(StatOverrides {
                    health: Some(1),
                    armor: Some(0),
                    ..StatOverrides::default()
                }),
            );
        let mut world = deploy(&spec);
        for soldier in [UnitId::new(1), UnitId::new(2)] {
            let _ = run(&mut world, Command::SetOverwatch { unit: soldier });
        }
        let _ = run(&mut world, Command::EndTurn);
        let events = run(
            &mut world,
            Command::Move {
                unit: sectoid,
                destination: TilePos::new(6, 0),
            },
        );

        let first_hit = events.iter().find_map(|event| match event {
            Event::ShotFired { attacker, hits, .. } if *attacker == UnitId::new(1) => {
                Some(*hits > 0)
            }
            _ => None,
        });
        if first_hit == Some(true) {
            killed_by_first += 1;
            assert!(events.contains(&Event::UnitKilled { unit: sectoid }));
            let reactions = events
                .iter()
                .filter(|event| matches!(event, Event::ReactionFire { .. }))
                .count();
            assert_eq!(reactions, 1, "seed {seed}: {events:?}");
            assert!(!query::unit(&world, sectoid).expect("sectoid").alive);
        }
    }
    assert!(killed_by_first > 0);
}
