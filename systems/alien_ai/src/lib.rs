#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Alien AI system that turns world queries into command batches.
//!
//! Every alien carries a small state machine (patrol, chase, attack, return)
//! advanced once per alien turn. Bosses skip it and cycle through a fixed
//! attack rotation instead. The system never mutates the world: it reads the
//! world's queries and pushes [`Command`] values for the turn controller to
//! apply, predicting its own position and TU along the way so a batch rarely
//! asks for something the world will refuse.

use std::collections::BTreeMap;

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use terror_site_core::{
    AlienAbility, AlienBehavior, AlienSpecies, Command, ShotType, Team, TilePos,
    UnitId, UnitRole, UnitSnapshot, UnitView, WeaponStats, JUMP_RANGE, PSIONIC_TU_COST,
};
use terror_site_system_movement::{affordable_prefix, path_cost};
use terror_site_world::{query, World};

const DETECTION_RANGE: u32 = 10;
const NIGHT_DETECTION_RANGE: u32 = 6;
const ALERT_TURNS: u32 = 3;
const WANDER_RADIUS: u32 = 5;
const WANDER_REROLL_TURNS: u32 = 3;
const WANDER_ATTEMPTS: usize = 8;
const CHARGE_RANGE: u32 = 6;
const CHARGE_COOLDOWN: u32 = 2;
const AIMED_BEYOND: u32 = 6;
const LOW_HEALTH_RATIO: f32 = 0.5;
const PREFERRED_DISTANCE: f32 = 6.0;
const PSIONIC_CHANCE: f64 = 0.3;
const PSIONIC_BRAVERY_CEILING: u32 = 60;
const SWARM_VOLLEY: usize = 2;
const BURST_LIMIT: usize = 8;
const BOSS_PHASE_TURNS: u32 = 2;
const BOSS_ROTATION: [BossPhase; 3] = [BossPhase::BurstA, BossPhase::BurstB, BossPhase::SummonJump];

/// Configuration parameters required to construct the alien AI.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration seeding the AI's random decisions.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Step of the boss attack rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BossPhase {
    /// Aimed fire at the nearest visible target until TU runs out.
    BurstA,
    /// Psionic blast centred on the target.
    BurstB,
    /// Reinforcements, or a jump when no tile is free for them.
    SummonJump,
}

/// Behavioural state of a single alien.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlienState {
    /// Wandering around the spawn point.
    Patrol,
    /// Closing in on the last known position of a target.
    Chase,
    /// Trading fire with a visible target.
    Attack,
    /// Heading back to the spawn point after losing contact.
    Return,
    /// Following the boss rotation.
    Boss(BossPhase),
}

#[derive(Clone, Debug)]
struct Mind {
    state: AlienState,
    spawn: TilePos,
    target: Option<UnitId>,
    last_known: Option<TilePos>,
    alert: u32,
    wander: Option<TilePos>,
    wander_age: u32,
    charge_cooldown: u32,
    tank_resting: bool,
    boss_turns: u32,
}

impl Mind {
    fn new(spawn: TilePos, behavior: AlienBehavior) -> Self {
        let state = if behavior == AlienBehavior::Boss {
            AlienState::Boss(BOSS_ROTATION[0])
        } else {
            AlienState::Patrol
        };
        Self {
            state,
            spawn,
            target: None,
            last_known: None,
            alert: 0,
            wander: None,
            wander_age: 0,
            charge_cooldown: 0,
            tank_resting: false,
            boss_turns: 0,
        }
    }
}

/// Alien decision maker holding per-unit memory across turns.
#[derive(Debug)]
pub struct AlienAi {
    minds: BTreeMap<UnitId, Mind>,
    rng: ChaCha8Rng,
}

impl AlienAi {
    /// Creates a new AI using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            minds: BTreeMap::new(),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// State the unit ended its last planned turn in, if it has acted.
    #[must_use]
    pub fn state(&self, unit: UnitId) -> Option<AlienState> {
        self.minds.get(&unit).map(|mind| mind.state)
    }

    /// Plans one alien turn for the unit, pushing the resulting commands.
    ///
    /// Units that are down, panicking, zombified or not under alien control
    /// produce nothing. The batch is planned against the current world; the
    /// caller applies it and should stop at the first rejection.
    pub fn plan_turn(&mut self, unit: UnitId, world: &World, out: &mut Vec<Command>) {
        let units = query::unit_view(world);
        let Some(me) = units.get(unit).filter(|me| can_act(me)).cloned() else {
            return;
        };
        let behavior = behavior(&me);
        let mut mind = self
            .minds
            .remove(&unit)
            .unwrap_or_else(|| Mind::new(me.spawn, behavior));
        let queued = out.len();

        let target = detect(&mut mind, &me, behavior, world, &units);
        let mut orders = Orders::new(world, me, out);
        if behavior == AlienBehavior::Boss {
            self.boss_turn(&mut mind, target, &mut orders);
        } else {
            self.hunt(&mut mind, behavior, target, &mut orders);
        }

        tracing::debug!(
            %unit,
            state = ?mind.state,
            commands = out.len() - queued,
            "alien turn planned"
        );
        let _ = self.minds.insert(unit, mind);
    }

    fn hunt(
        &mut self,
        mind: &mut Mind,
        behavior: AlienBehavior,
        target: Option<&UnitSnapshot>,
        orders: &mut Orders<'_>,
    ) {
        let charge_ready = mind.charge_cooldown == 0;
        mind.charge_cooldown = mind.charge_cooldown.saturating_sub(1);

        match (mind.state, target) {
            (AlienState::Chase | AlienState::Attack, Some(target)) => match behavior {
                AlienBehavior::Melee | AlienBehavior::Charge => {
                    close_in(mind, behavior, charge_ready, target, orders);
                }
                AlienBehavior::Ranged
                | AlienBehavior::Swarm
                | AlienBehavior::Tank
                | AlienBehavior::Boss => self.engage(mind, behavior, target, orders),
            },
            (AlienState::Chase | AlienState::Attack, None) => {
                if let Some(goal) = mind.last_known {
                    let _ = orders.walk(goal, 0, |_| false);
                }
            }
            (AlienState::Return, _) => self.head_home(mind, orders),
            (AlienState::Patrol | AlienState::Boss(_), _) => self.wander(mind, orders),
        }
    }

    /// Gun-toting behaviours: close to firing range, then shoot at the
    /// behaviour's cadence.
    fn engage(
        &mut self,
        mind: &mut Mind,
        behavior: AlienBehavior,
        target: &UnitSnapshot,
        orders: &mut Orders<'_>,
    ) {
        let wounded = orders.me.health_ratio() < LOW_HEALTH_RATIO;
        if mind.state == AlienState::Attack
            && wounded
            && matches!(behavior, AlienBehavior::Ranged | AlienBehavior::Swarm)
        {
            if let Some(cover) = cover_position(orders, target) {
                if orders.walk(cover, 0, |_| false) {
                    return;
                }
            }
        }

        let reserve = orders.shot_cost(ShotType::Snap).unwrap_or(0);
        if !orders.approach(target.pos, reserve) {
            mind.state = AlienState::Chase;
            return;
        }

        mind.state = AlienState::Attack;
        if self.try_psionics(target, orders) {
            return;
        }
        let preferred = if orders.at.manhattan_distance(target.pos) > AIMED_BEYOND {
            ShotType::Aimed
        } else {
            ShotType::Snap
        };
        match behavior {
            AlienBehavior::Swarm => {
                for _ in 0..SWARM_VOLLEY {
                    if !orders.fire(target, ShotType::Snap) {
                        break;
                    }
                }
            }
            AlienBehavior::Tank => {
                if !mind.tank_resting {
                    let _ = orders.fire(target, preferred);
                }
                mind.tank_resting = !mind.tank_resting;
            }
            AlienBehavior::Ranged
            | AlienBehavior::Melee
            | AlienBehavior::Charge
            | AlienBehavior::Boss => {
                let _ = orders.fire(target, preferred);
            }
        }
    }

    fn try_psionics(&mut self, target: &UnitSnapshot, orders: &mut Orders<'_>) -> bool {
        if !orders.me.psionic
            || target.stats.bravery >= PSIONIC_BRAVERY_CEILING
            || orders.budget < PSIONIC_TU_COST
            || !orders.can_see(target.pos)
        {
            return false;
        }
        if !self.rng.gen_bool(PSIONIC_CHANCE) {
            return false;
        }
        orders.budget -= PSIONIC_TU_COST;
        orders.out.push(Command::PsionicAttack {
            attacker: orders.me.id,
            target: target.id,
        });
        true
    }

    fn wander(&mut self, mind: &mut Mind, orders: &mut Orders<'_>) {
        mind.state = AlienState::Patrol;
        let reached = mind.wander.map_or(true, |goal| goal == orders.at);
        if reached || mind.wander_age >= WANDER_REROLL_TURNS {
            mind.wander = self.wander_point(mind.spawn, orders);
            mind.wander_age = 0;
        }
        mind.wander_age += 1;
        if let Some(goal) = mind.wander {
            let _ = orders.walk(goal, 0, |_| false);
        }
    }

    fn wander_point(&mut self, around: TilePos, orders: &Orders<'_>) -> Option<TilePos> {
        let terrain = query::terrain_view(orders.world);
        let reach = i64::from(WANDER_RADIUS);
        for _ in 0..WANDER_ATTEMPTS {
            let dx = self.rng.gen_range(-reach..=reach);
            let spare = reach - dx.abs();
            let dy = self.rng.gen_range(-spare..=spare);
            let Some(pos) = around.offset(dx, dy) else {
                continue;
            };
            if pos != orders.at && terrain.is_passable(pos) {
                return Some(pos);
            }
        }
        None
    }

    fn head_home(&mut self, mind: &mut Mind, orders: &mut Orders<'_>) {
        if orders.at == mind.spawn {
            self.wander(mind, orders);
            return;
        }
        let moved = orders.walk(mind.spawn, 0, |_| false);
        if !moved || orders.at.manhattan_distance(mind.spawn) <= 1 {
            mind.state = AlienState::Patrol;
        }
    }

    /// Fixed rotation advancing every [`BOSS_PHASE_TURNS`] alien turns.
    fn boss_turn(
        &mut self,
        mind: &mut Mind,
        target: Option<&UnitSnapshot>,
        orders: &mut Orders<'_>,
    ) {
        let step = (mind.boss_turns / BOSS_PHASE_TURNS) as usize % BOSS_ROTATION.len();
        let phase = BOSS_ROTATION[step];
        mind.boss_turns += 1;
        mind.state = AlienState::Boss(phase);

        match (phase, target) {
            (BossPhase::BurstA, Some(target)) => {
                let reserve = orders.shot_cost(ShotType::Aimed).unwrap_or(0);
                let _ = orders.approach(target.pos, reserve);
                for _ in 0..BURST_LIMIT {
                    if !orders.fire(target, ShotType::Aimed) {
                        break;
                    }
                }
            }
            (BossPhase::BurstB, Some(target)) => {
                if orders.can_see(target.pos) {
                    let _ = orders.ability(AlienAbility::Blast { center: target.pos });
                }
            }
            (BossPhase::SummonJump, _) => {
                if !summon(orders) {
                    self.jump(orders);
                }
            }
            (BossPhase::BurstA | BossPhase::BurstB, None) => {
                if let Some(goal) = mind.last_known {
                    let _ = orders.walk(goal, 0, |_| false);
                }
            }
        }
    }

    fn jump(&mut self, orders: &mut Orders<'_>) {
        let world = orders.world;
        let (terrain, occupancy) = (query::terrain_view(world), query::occupancy_view(world));
        let from = orders.at;
        let reach = i64::from(JUMP_RANGE);
        let spots: Vec<TilePos> = (-reach..=reach)
            .flat_map(|dy| (-reach..=reach).map(move |dx| (dx, dy)))
            .filter_map(|(dx, dy)| from.offset(dx, dy))
            .filter(|pos| {
                *pos != from
                    && from.manhattan_distance(*pos) <= JUMP_RANGE
                    && terrain.is_passable(*pos)
                    && occupancy.is_free(*pos)
            })
            .collect();
        if let Some(&to) = spots.choose(&mut self.rng) {
            if orders.ability(AlienAbility::Jump { to }) {
                orders.at = to;
            }
        }
    }
}

/// Melee behaviours: strike when adjacent, charge when allowed, else close in.
fn close_in(
    mind: &mut Mind,
    behavior: AlienBehavior,
    charge_ready: bool,
    target: &UnitSnapshot,
    orders: &mut Orders<'_>,
) {
    mind.state = AlienState::Chase;
    let strike = AlienAbility::Melee { target: target.id };
    if orders.at.is_adjacent(target.pos) {
        let _ = orders.ability(strike);
        return;
    }
    if behavior == AlienBehavior::Charge
        && charge_ready
        && orders.at.manhattan_distance(target.pos) <= CHARGE_RANGE
    {
        if orders.ability(AlienAbility::Charge { target: target.id }) {
            mind.charge_cooldown = CHARGE_COOLDOWN;
            orders.budget = 0;
        }
        return;
    }
    let reserve = share(orders.me.tu_max(), strike.tu_percent());
    let goal = target.pos;
    if orders.walk(goal, reserve, |tile| tile.is_adjacent(goal)) && orders.at.is_adjacent(goal) {
        let _ = orders.ability(strike);
    }
}

fn summon(orders: &mut Orders<'_>) -> bool {
    let world = orders.world;
    let (terrain, occupancy) = (query::terrain_view(world), query::occupancy_view(world));
    let free = terrain
        .neighbors(orders.at)
        .find(|pos| terrain.is_passable(*pos) && occupancy.is_free(*pos));
    free.is_some_and(|at| orders.ability(AlienAbility::Summon { at }))
}

/// Updates the unit's memory with what it can see and returns its target.
fn detect<'v>(
    mind: &mut Mind,
    me: &UnitSnapshot,
    behavior: AlienBehavior,
    world: &World,
    units: &'v UnitView,
) -> Option<&'v UnitSnapshot> {
    let range = if query::is_night(world) {
        NIGHT_DETECTION_RANGE
    } else {
        DETECTION_RANGE
    };
    let visible: Vec<&UnitSnapshot> = units
        .living()
        .filter(|other| {
            is_prey(other, behavior)
                && me.pos.manhattan_distance(other.pos) <= range
                && query::has_line_of_sight(world, me.pos, other.pos)
        })
        .collect();
    let target = visible
        .iter()
        .copied()
        .find(|other| Some(other.id) == mind.target)
        .or_else(|| {
            visible
                .iter()
                .copied()
                .min_by_key(|other| (me.pos.manhattan_distance(other.pos), other.id))
        });

    match target {
        Some(target) => {
            mind.target = Some(target.id);
            mind.last_known = Some(target.pos);
            mind.alert = ALERT_TURNS;
            if matches!(mind.state, AlienState::Patrol | AlienState::Return) {
                mind.state = AlienState::Chase;
            }
        }
        None if matches!(mind.state, AlienState::Chase | AlienState::Attack) => {
            mind.alert = mind.alert.saturating_sub(1);
            if mind.alert == 0 {
                mind.state = AlienState::Return;
                mind.target = None;
                mind.last_known = None;
            } else {
                mind.state = AlienState::Chase;
            }
        }
        None => {}
    }
    target
}

fn can_act(unit: &UnitSnapshot) -> bool {
    unit.alive
        && unit.controller == Team::Alien
        && unit.panicked_turns == 0
        && !matches!(unit.role, UnitRole::Zombie { .. })
}

/// Dominated squad members fight like ordinary ranged aliens.
fn behavior(unit: &UnitSnapshot) -> AlienBehavior {
    unit.role
        .species()
        .map_or(AlienBehavior::Ranged, AlienSpecies::behavior)
}

fn is_prey(other: &UnitSnapshot, behavior: AlienBehavior) -> bool {
    match other.controller {
        Team::Player => true,
        Team::Neutral => {
            other.role == UnitRole::Civilian
                && matches!(behavior, AlienBehavior::Melee | AlienBehavior::Charge)
        }
        Team::Alien => false,
    }
}

fn share(tu_max: u32, percent: f32) -> u32 {
    (tu_max as f32 * percent).round() as u32
}

fn in_reach(stats: Option<WeaponStats>, from: TilePos, to: TilePos) -> bool {
    match stats {
        Some(stats) => stats.reaches(from, to),
        None => false,
    }
}

/// Rates a firing position against the target: sight, cover, then distance.
fn cover_score(world: &World, tile: TilePos, target: TilePos) -> f32 {
    let sight = if query::has_line_of_sight(world, tile, target) {
        10.0
    } else {
        0.0
    };
    let cover = query::terrain_view(world).cover(tile);
    let distance = tile.manhattan_distance(target) as f32;
    sight + 20.0 * cover - (distance - PREFERRED_DISTANCE).abs()
}

/// Best reachable tile scoring strictly above the current one.
fn cover_position(orders: &Orders<'_>, target: &UnitSnapshot) -> Option<TilePos> {
    let world = orders.world;
    let range = query::movement_range(world, orders.me.id)?;
    let occupancy = query::occupancy_view(world);
    let here = cover_score(world, orders.at, target.pos);
    range
        .tiles()
        .filter(|tile| *tile != orders.at && occupancy.is_free(*tile))
        .map(|tile| (tile, cover_score(world, tile, target.pos)))
        .filter(|(_, score)| *score > here)
        .max_by(|left, right| left.1.total_cmp(&right.1).then(right.0.cmp(&left.0)))
        .map(|(tile, _)| tile)
}

/// Command batch under construction, tracking where the unit will stand and
/// what it can still afford once the queued commands have run.
struct Orders<'a> {
    world: &'a World,
    me: UnitSnapshot,
    at: TilePos,
    budget: u32,
    ammo: Option<u32>,
    out: &'a mut Vec<Command>,
}

impl<'a> Orders<'a> {
    fn new(world: &'a World, me: UnitSnapshot, out: &'a mut Vec<Command>) -> Self {
        Self {
            world,
            at: me.pos,
            budget: me.tu(),
            ammo: me.weapon.and_then(|weapon| weapon.ammo),
            me,
            out,
        }
    }

    fn can_see(&self, target: TilePos) -> bool {
        query::has_line_of_sight(self.world, self.at, target)
    }

    fn can_hit(&self, target: TilePos) -> bool {
        let stats = self.me.weapon.map(|weapon| weapon.kind.stats());
        in_reach(stats, self.at, target) && self.can_see(target)
    }

    fn shot_cost(&self, shot: ShotType) -> Option<u32> {
        let profile = self.me.weapon?.kind.stats().profile(shot)?;
        Some(profile.tu_cost(self.me.tu_max()))
    }

    /// Queues a walk toward `goal`, keeping `reserve` TU back and stopping
    /// early on the first tile satisfying `arrived`. An occupied goal is
    /// approached to the neighbouring tile. Only the first walk of a batch is
    /// planned; later calls report `false`.
    fn walk(&mut self, goal: TilePos, reserve: u32, arrived: impl Fn(TilePos) -> bool) -> bool {
        if self.at != self.me.pos {
            return false;
        }
        let Some(mut path) = query::find_path(self.world, self.me.id, goal) else {
            return false;
        };
        let occupancy = query::occupancy_view(self.world);
        if path.last().is_some_and(|last| !occupancy.is_free(*last)) {
            let _ = path.pop();
        }
        let terrain = query::terrain_view(self.world);
        let steps = affordable_prefix(&terrain, &path, self.budget.saturating_sub(reserve));
        path.truncate(steps);
        if let Some(stop) = path.iter().position(|tile| arrived(*tile)) {
            path.truncate(stop + 1);
        }
        let Some(&end) = path.last() else {
            return false;
        };
        let cost = path_cost(&terrain, &path).unwrap_or(self.budget);
        self.budget = self.budget.saturating_sub(cost);
        self.at = end;
        self.out.push(Command::Move {
            unit: self.me.id,
            destination: end,
        });
        true
    }

    /// Walks until the target can be shot at, if it cannot already, and
    /// reports whether it then can.
    fn approach(&mut self, goal: TilePos, reserve: u32) -> bool {
        if self.can_hit(goal) {
            return true;
        }
        let world = self.world;
        let stats = self.me.weapon.map(|weapon| weapon.kind.stats());
        let _ = self.walk(goal, reserve, |tile| {
            in_reach(stats, tile, goal) && query::has_line_of_sight(world, tile, goal)
        });
        self.can_hit(goal)
    }

    /// Queues a shot, falling back to a snap shot when the preferred mode is
    /// missing or unaffordable.
    fn fire(&mut self, target: &UnitSnapshot, preferred: ShotType) -> bool {
        if self.ammo == Some(0) || !self.can_hit(target.pos) {
            return false;
        }
        let Some(weapon) = self.me.weapon else {
            return false;
        };
        let stats = weapon.kind.stats();
        let (tu_max, budget) = (self.me.tu_max(), self.budget);
        let chosen = [preferred, ShotType::Snap].into_iter().find_map(|shot| {
            let profile = stats.profile(shot)?;
            let cost = profile.tu_cost(tu_max);
            (cost > 0 && cost <= budget).then_some((shot, profile.rounds, cost))
        });
        let Some((shot, rounds, cost)) = chosen else {
            return false;
        };
        self.budget -= cost;
        self.ammo = self.ammo.map(|loaded| loaded - rounds.min(loaded));
        self.out.push(Command::Attack {
            attacker: self.me.id,
            target: target.id,
            shot,
        });
        true
    }

    fn ability(&mut self, ability: AlienAbility) -> bool {
        let cost = share(self.me.tu_max(), ability.tu_percent());
        if cost > self.budget {
            return false;
        }
        self.budget -= cost;
        self.out.push(Command::AlienAbility {
            unit: self.me.id,
            ability,
        });
        true
    }
}
