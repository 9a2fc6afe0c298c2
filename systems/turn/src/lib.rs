#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn controller sequencing the squad turn, the alien phase and the
//! mission outcome.
//!
//! The world owns the phase state; this system drives it. Ending the squad
//! turn applies [`Command::EndTurn`], lets the alien AI act for every unit the
//! aliens control, then applies [`Command::EndAlienTurn`] so the world can
//! settle victory or defeat before handing the next turn back.

use std::collections::BTreeSet;

use terror_site_core::{Command, Event, Phase, Team, UnitId};
use terror_site_system_alien_ai::{self as alien_ai, AlienAi};
use terror_site_world::{self as world, query, World};

/// Configuration parameters required to construct the turn controller.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    ai_seed: u64,
}

impl Config {
    /// Creates a new configuration seeding the alien AI.
    #[must_use]
    pub const fn new(ai_seed: u64) -> Self {
        Self { ai_seed }
    }
}

/// Drives full rounds of play against the world.
#[derive(Debug)]
pub struct TurnController {
    ai: AlienAi,
    commands: Vec<Command>,
}

impl TurnController {
    /// Creates a new controller using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            ai: AlienAi::new(alien_ai::Config::new(config.ai_seed)),
            commands: Vec::new(),
        }
    }

    /// Alien AI driving the alien phase.
    #[must_use]
    pub fn ai(&self) -> &AlienAi {
        &self.ai
    }

    /// Ends the squad turn, plays the alien phase and closes it.
    ///
    /// Returns the phase the world settled in: the next squad turn, or a
    /// terminal phase. When the squad turn cannot be ended the rejection is
    /// reported through `out` and nothing else happens.
    pub fn end_player_turn(&mut self, world: &mut World, out: &mut Vec<Event>) -> Phase {
        world::apply(world, Command::EndTurn, out);
        if query::phase(world) != Phase::AlienTurn {
            return query::phase(world);
        }
        self.play_aliens(world, out);
        world::apply(world, Command::EndAlienTurn, out);

        let phase = query::phase(world);
        tracing::info!(?phase, turn = query::turn(world), "round complete");
        phase
    }

    /// Lets every alien-controlled unit act once, in ascending id order.
    ///
    /// The roster is re-read after each unit so units dominated mid-phase
    /// still get their turn.
    fn play_aliens(&mut self, world: &mut World, out: &mut Vec<Event>) {
        let mut acted = BTreeSet::new();
        loop {
            let next = query::alien_actors(world)
                .into_iter()
                .find(|unit| !acted.contains(unit));
            let Some(unit) = next else {
                break;
            };
            let _ = acted.insert(unit);
            self.commands.clear();
            self.ai.plan_turn(unit, world, &mut self.commands);
            for command in self.commands.drain(..) {
                let start = out.len();
                world::apply(world, command, out);
                let rejected = matches!(out.get(start), Some(Event::CommandRejected { .. }));
                if rejected || !still_alien(world, unit) {
                    break;
                }
            }
        }
        tracing::debug!(acted = acted.len(), "alien phase played");
    }
}

fn still_alien(world: &World, unit: UnitId) -> bool {
    query::unit(world, unit)
        .is_some_and(|snapshot| snapshot.alive && snapshot.controller == Team::Alien)
}
