#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Terror Site tactical engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and the alien AI submit
//! [`Command`] values describing desired actions, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what happened. Rejected commands never mutate state; they
//! surface as [`Event::CommandRejected`] carrying a typed [`Rejection`].
//! Systems read immutable views such as [`TerrainView`] and [`UnitView`] and
//! respond exclusively with new command batches.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Manhattan sight radius granted to the squad on day missions.
pub const DAY_SIGHT_RADIUS: u32 = 12;

/// Manhattan sight radius granted to the squad on night missions.
pub const NIGHT_SIGHT_RADIUS: u32 = 6;

/// Number of human-readable messages retained by the world's message log.
pub const MESSAGE_LOG_CAPACITY: usize = 6;

/// Entry cost marking terrain that is nominally passable but never affordable.
pub const SENTINEL_TU_COST: u32 = 99;

/// TU spent by a psionic assault.
pub const PSIONIC_TU_COST: u32 = 25;

/// Furthest Manhattan distance a boss may jump.
pub const JUMP_RANGE: u32 = 5;

/// Location of a single map tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    x: u32,
    y: u32,
}

impl TilePos {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the tile.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the tile.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two tiles.
    #[must_use]
    pub fn manhattan_distance(self, other: TilePos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Computes the Chebyshev (king move) distance between two tiles.
    #[must_use]
    pub fn chebyshev_distance(self, other: TilePos) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Computes the straight-line distance between two tile centres.
    #[must_use]
    pub fn euclidean_distance(self, other: TilePos) -> f32 {
        let dx = self.x.abs_diff(other.x) as f32;
        let dy = self.y.abs_diff(other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Reports whether the two tiles touch, diagonals included.
    #[must_use]
    pub fn is_adjacent(self, other: TilePos) -> bool {
        self.chebyshev_distance(other) == 1
    }

    /// Returns the tile shifted by the provided signed offset.
    ///
    /// Offsets that would produce a negative coordinate yield `None`; upper
    /// bounds are the caller's responsibility.
    #[must_use]
    pub fn offset(self, dx: i64, dy: i64) -> Option<TilePos> {
        let x = u32::try_from(i64::from(self.x) + dx).ok()?;
        let y = u32::try_from(i64::from(self.y) + dy).ok()?;
        Some(TilePos::new(x, y))
    }

    /// Returns the orthogonal neighbour in the provided direction.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<TilePos> {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal movement directions. Diagonal movement is never allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All four directions in canonical scan order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Signed column and row delta applied by a single step.
    #[must_use]
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Unique identifier assigned to a unit. Identifiers are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side a unit fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// The player's squad.
    Player,
    /// Aliens, zombies and anything they control.
    Alien,
    /// Civilians caught in the middle.
    Neutral,
}

/// Turn structure of a mission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The player issues commands to the squad.
    PlayerTurn,
    /// The alien AI acts and the environment ticks.
    AlienTurn,
    /// Every alien was killed or captured.
    Victory,
    /// Every soldier was lost.
    Defeat,
}

impl Phase {
    /// Team whose units may act during the phase, if any.
    #[must_use]
    pub const fn acting_team(self) -> Option<Team> {
        match self {
            Self::PlayerTurn => Some(Team::Player),
            Self::AlienTurn => Some(Team::Alien),
            Self::Victory | Self::Defeat => None,
        }
    }

    /// Reports whether the mission has concluded.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }
}

/// Body posture of a unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    /// Default posture.
    #[default]
    Standing,
    /// Crouched posture granting an accuracy bonus.
    Kneeling,
}

impl Stance {
    /// Multiplier applied to the unit's firing accuracy.
    #[must_use]
    pub const fn accuracy_modifier(self) -> f32 {
        match self {
            Self::Standing => 1.0,
            Self::Kneeling => 1.15,
        }
    }

    /// Posture reached after toggling.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Standing => Self::Kneeling,
            Self::Kneeling => Self::Standing,
        }
    }
}

/// Fire modes available to ranged weapons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShotType {
    /// Quick shot with modest accuracy.
    Snap,
    /// Slow, deliberate shot.
    Aimed,
    /// Three-round burst.
    Auto,
}

impl fmt::Display for ShotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Snap => "snap",
            Self::Aimed => "aimed",
            Self::Auto => "auto",
        };
        f.write_str(label)
    }
}

/// Accuracy and time cost of a single fire mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShotProfile {
    /// Multiplier applied to the shooter's accuracy.
    pub accuracy: f32,
    /// Fraction of the shooter's maximum TU consumed.
    pub tu_percent: f32,
    /// Rounds discharged by a single trigger pull.
    pub rounds: u32,
}

impl ShotProfile {
    const fn single(accuracy: f32, tu_percent: f32) -> Self {
        Self {
            accuracy,
            tu_percent,
            rounds: 1,
        }
    }

    const fn burst(accuracy: f32, tu_percent: f32) -> Self {
        Self {
            accuracy,
            tu_percent,
            rounds: 3,
        }
    }

    /// TU charged to a shooter with the provided TU maximum.
    #[must_use]
    pub fn tu_cost(&self, tu_max: u32) -> u32 {
        (tu_max as f32 * self.tu_percent).round() as u32
    }
}

/// Special behaviour layered on top of a weapon's base damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AmmoEffect {
    /// Plain ballistic damage.
    Plain,
    /// Ignores the target's armor entirely.
    BypassArmor,
    /// Reduces the target's armor by a percentage.
    Penetration {
        /// Share of armor ignored, 0 to 100.
        percent: u32,
    },
    /// Pushes surviving targets away from the shooter.
    Knockback {
        /// Number of tiles the target is pushed.
        distance: u32,
    },
    /// Accumulates stun damage instead of wounding.
    Stun,
    /// Sets the target's tile on fire.
    Incendiary,
    /// Leaves an irradiated status on the target.
    Irradiate,
}

/// Weapons that can be carried by soldiers and aliens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Sidearm.
    Pistol,
    /// Standard-issue rifle.
    Rifle,
    /// Magnetic rifle that ignores armor.
    GaussRifle,
    /// Heavy cannon that knocks targets back.
    HeavyCannon,
    /// Laser rifle with incendiary beams.
    LaserRifle,
    /// Alien plasma pistol.
    PlasmaPistol,
    /// Alien plasma rifle.
    PlasmaRifle,
    /// Melee stun rod used to capture live aliens.
    StunRod,
    /// Single-shot explosive launcher.
    RocketLauncher,
}

/// Static statistics describing a weapon.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponStats {
    /// Base damage of a single round.
    pub damage: u32,
    /// Maximum engagement distance in tiles.
    pub range: u32,
    /// Magazine size, `None` for unlimited ammunition.
    pub ammo_capacity: Option<u32>,
    /// Special ammunition behaviour.
    pub effect: AmmoEffect,
    /// Explosion radius triggered by lethal hits, if explosive.
    pub blast_radius: Option<u32>,
    snap: Option<ShotProfile>,
    aimed: Option<ShotProfile>,
    auto: Option<ShotProfile>,
}

impl WeaponStats {
    /// Fire profile for the requested shot type, if the weapon supports it.
    #[must_use]
    pub const fn profile(&self, shot: ShotType) -> Option<ShotProfile> {
        match shot {
            ShotType::Snap => self.snap,
            ShotType::Aimed => self.aimed,
            ShotType::Auto => self.auto,
        }
    }

    /// Reports whether a shot from `from` can reach `to`. Stun weapons only
    /// reach adjacent tiles.
    #[must_use]
    pub fn reaches(&self, from: TilePos, to: TilePos) -> bool {
        if self.effect == AmmoEffect::Stun {
            from.is_adjacent(to)
        } else {
            from.euclidean_distance(to) <= self.range as f32
        }
    }
}

impl WeaponKind {
    /// Statistics for the weapon.
    #[must_use]
    pub const fn stats(self) -> WeaponStats {
        match self {
            Self::Pistol => WeaponStats {
                damage: 26,
                range: 12,
                ammo_capacity: Some(12),
                effect: AmmoEffect::Plain,
                blast_radius: None,
                snap: Some(ShotProfile::single(0.60, 0.18)),
                aimed: Some(ShotProfile::single(0.78, 0.30)),
                auto: None,
            },
            Self::Rifle => WeaponStats {
                damage: 30,
                range: 20,
                ammo_capacity: Some(20),
                effect: AmmoEffect::Plain,
                blast_radius: None,
                snap: Some(ShotProfile::single(0.60, 0.25)),
                aimed: Some(ShotProfile::single(1.10, 0.80)),
                auto: Some(ShotProfile::burst(0.35, 0.35)),
            },
            Self::GaussRifle => WeaponStats {
                damage: 40,
                range: 22,
                ammo_capacity: Some(10),
                effect: AmmoEffect::BypassArmor,
                blast_radius: None,
                snap: Some(ShotProfile::single(0.70, 0.30)),
                aimed: Some(ShotProfile::single(1.05, 0.60)),
                auto: None,
            },
            Self::HeavyCannon => WeaponStats {
                damage: 56,
                range: 18,
                ammo_capacity: Some(6),
                effect: AmmoEffect::Knockback { distance: 2 },
                blast_radius: None,
                snap: Some(ShotProfile::single(0.60, 0.33)),
                aimed: Some(ShotProfile::single(0.90, 0.80)),
                auto: None,
            },
            Self::LaserRifle => WeaponStats {
                damage: 60,
                range: 20,
                ammo_capacity: None,
                effect: AmmoEffect::Incendiary,
                blast_radius: None,
                snap: Some(ShotProfile::single(0.65, 0.25)),
                aimed: Some(ShotProfile::single(1.00, 0.50)),
                auto: Some(ShotProfile::burst(0.46, 0.34)),
            },
            Self::PlasmaPistol => WeaponStats {
                damage: 52,
                range: 14,
                ammo_capacity: Some(26),
                effect: AmmoEffect::Irradiate,
                blast_radius: None,
                snap: Some(ShotProfile::single(0.65, 0.30)),
                aimed: Some(ShotProfile::single(0.85, 0.60)),
                auto: Some(ShotProfile::burst(0.50, 0.30)),
            },
            Self::PlasmaRifle => WeaponStats {
                damage: 80,
                range: 20,
                ammo_capacity: Some(28),
                effect: AmmoEffect::Penetration { percent: 50 },
                blast_radius: None,
                snap: Some(ShotProfile::single(0.86, 0.30)),
                aimed: Some(ShotProfile::single(1.00, 0.60)),
                auto: Some(ShotProfile::burst(0.55, 0.36)),
            },
            Self::StunRod => WeaponStats {
                damage: 65,
                range: 1,
                ammo_capacity: None,
                effect: AmmoEffect::Stun,
                blast_radius: None,
                snap: Some(ShotProfile::single(1.00, 0.30)),
                aimed: None,
                auto: None,
            },
            Self::RocketLauncher => WeaponStats {
                damage: 75,
                range: 20,
                ammo_capacity: Some(1),
                effect: AmmoEffect::Plain,
                blast_radius: Some(3),
                snap: Some(ShotProfile::single(0.55, 0.45)),
                aimed: Some(ShotProfile::single(1.15, 0.75)),
                auto: None,
            },
        }
    }
}

/// Weapon carried by a unit together with its loaded ammunition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Weapon {
    /// Kind of weapon equipped.
    pub kind: WeaponKind,
    /// Rounds loaded, `None` for weapons with unlimited ammunition.
    pub ammo: Option<u32>,
}

impl Weapon {
    /// Equips a fully loaded weapon of the provided kind.
    #[must_use]
    pub const fn loaded(kind: WeaponKind) -> Self {
        Self {
            kind,
            ammo: kind.stats().ammo_capacity,
        }
    }
}

/// Radius and damage of an explosive device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Blast {
    /// Damage at the centre of the blast.
    pub damage: u32,
    /// Euclidean radius at which damage reaches zero.
    pub radius: u32,
}

/// Consumable items stored in a unit's inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Fragmentation grenade.
    FragGrenade,
    /// Grenade that lays a smoke cloud.
    SmokeGrenade,
    /// Proximity mine, armed where it lands.
    ProximityMine,
    /// Field medical kit.
    Medikit,
    /// Spare magazine for the equipped weapon.
    Clip,
}

impl ItemKind {
    /// Reports whether the item is thrown rather than used in place.
    #[must_use]
    pub const fn is_throwable(self) -> bool {
        matches!(
            self,
            Self::FragGrenade | Self::SmokeGrenade | Self::ProximityMine
        )
    }

    /// Explosion produced by the item, if explosive.
    #[must_use]
    pub const fn blast(self) -> Option<Blast> {
        match self {
            Self::FragGrenade => Some(Blast {
                damage: 50,
                radius: 3,
            }),
            Self::ProximityMine => Some(Blast {
                damage: 60,
                radius: 2,
            }),
            Self::SmokeGrenade | Self::Medikit | Self::Clip => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FragGrenade => "frag grenade",
            Self::SmokeGrenade => "smoke grenade",
            Self::ProximityMine => "proximity mine",
            Self::Medikit => "medikit",
            Self::Clip => "clip",
        };
        f.write_str(label)
    }
}

/// Lingering conditions that tick during the alien turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusKind {
    /// Open wounds. One damage per stack per tick.
    Bleeding,
    /// Nervous-system shock. Reduces the next TU refill.
    Shocked,
    /// Radiation poisoning. Two damage per stack per tick.
    Irradiated,
}

impl StatusKind {
    /// Upper bound on accumulated stacks.
    #[must_use]
    pub const fn max_stacks(self) -> u32 {
        match self {
            Self::Bleeding => 3,
            Self::Shocked => 1,
            Self::Irradiated => 5,
        }
    }

    /// Damage dealt per stack on every tick.
    #[must_use]
    pub const fn damage_per_stack(self) -> u32 {
        match self {
            Self::Bleeding => 1,
            Self::Shocked => 0,
            Self::Irradiated => 2,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bleeding => "bleeding",
            Self::Shocked => "shocked",
            Self::Irradiated => "irradiated",
        };
        f.write_str(label)
    }
}

/// Instance of a status effect attached to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StatusEffect {
    /// Kind of effect.
    pub kind: StatusKind,
    /// Remaining ticks before the effect expires.
    pub duration: u32,
    /// Accumulated intensity.
    pub stacks: u32,
}

/// Tactical archetype that drives an alien's decision making.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlienBehavior {
    /// Keeps its distance and shoots.
    Ranged,
    /// Fragile but fires often.
    Swarm,
    /// Durable, fires slowly.
    Tank,
    /// Closes to melee range.
    Melee,
    /// Rushes its target from a distance.
    Charge,
    /// Fixed three-phase attack rotation.
    Boss,
}

/// Alien species that may appear on a mission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlienSpecies {
    /// Small psionic grey.
    Sectoid,
    /// Hovering cyborg, fights in swarms.
    Floater,
    /// Armoured brute.
    Muton,
    /// Melee terror unit that zombifies its victims.
    Chryssalid,
    /// Charging beast.
    Reaper,
    /// Psionic commander.
    Ethereal,
}

/// Baseline statistics of a species.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpeciesStats {
    /// Starting and maximum health.
    pub health: i32,
    /// Flat damage reduction.
    pub armor: u32,
    /// Firing accuracy, 0 to 100.
    pub accuracy: u32,
    /// Reaction-fire probability, 0 to 100.
    pub reactions: u32,
    /// Psionic defence.
    pub bravery: u32,
    /// Maximum time units.
    pub time_units: u32,
    /// Equipped weapon, if the species shoots.
    pub weapon: Option<WeaponKind>,
    /// Damage dealt by melee strikes.
    pub melee_damage: u32,
    /// Reports whether the species can launch psionic attacks.
    pub psionic: bool,
}

impl AlienSpecies {
    /// Archetype that drives the species' AI.
    #[must_use]
    pub const fn behavior(self) -> AlienBehavior {
        match self {
            Self::Sectoid => AlienBehavior::Ranged,
            Self::Floater => AlienBehavior::Swarm,
            Self::Muton => AlienBehavior::Tank,
            Self::Chryssalid => AlienBehavior::Melee,
            Self::Reaper => AlienBehavior::Charge,
            Self::Ethereal => AlienBehavior::Boss,
        }
    }

    /// Reports whether melee kills by this species raise zombies.
    #[must_use]
    pub const fn zombifies(self) -> bool {
        matches!(self, Self::Chryssalid)
    }

    /// Baseline statistics of the species.
    #[must_use]
    pub const fn stats(self) -> SpeciesStats {
        match self {
            Self::Sectoid => SpeciesStats {
                health: 30,
                armor: 4,
                accuracy: 60,
                reactions: 63,
                bravery: 80,
                time_units: 54,
                weapon: Some(WeaponKind::PlasmaPistol),
                melee_damage: 0,
                psionic: true,
            },
            Self::Floater => SpeciesStats {
                health: 40,
                armor: 6,
                accuracy: 55,
                reactions: 50,
                bravery: 60,
                time_units: 55,
                weapon: Some(WeaponKind::PlasmaPistol),
                melee_damage: 0,
                psionic: false,
            },
            Self::Muton => SpeciesStats {
                health: 125,
                armor: 20,
                accuracy: 65,
                reactions: 60,
                bravery: 110,
                time_units: 60,
                weapon: Some(WeaponKind::PlasmaRifle),
                melee_damage: 0,
                psionic: false,
            },
            Self::Chryssalid => SpeciesStats {
                health: 96,
                armor: 18,
                accuracy: 0,
                reactions: 70,
                bravery: 110,
                time_units: 110,
                weapon: None,
                melee_damage: 40,
                psionic: false,
            },
            Self::Reaper => SpeciesStats {
                health: 90,
                armor: 12,
                accuracy: 0,
                reactions: 50,
                bravery: 100,
                time_units: 80,
                weapon: None,
                melee_damage: 45,
                psionic: false,
            },
            Self::Ethereal => SpeciesStats {
                health: 250,
                armor: 30,
                accuracy: 75,
                reactions: 80,
                bravery: 150,
                time_units: 100,
                weapon: Some(WeaponKind::PlasmaRifle),
                melee_damage: 0,
                psionic: true,
            },
        }
    }
}

impl fmt::Display for AlienSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Role-specific portion of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnitRole {
    /// Player-controlled soldier.
    Soldier,
    /// Alien of the provided species.
    Alien {
        /// Species of the alien.
        species: AlienSpecies,
    },
    /// Non-combatant.
    Civilian,
    /// Corpse animated by a Chryssalid, hatching into a new one.
    Zombie {
        /// Alien-turn ticks left before a Chryssalid bursts out.
        turns_to_hatch: u32,
    },
}

impl UnitRole {
    /// Species of the unit when it is an alien.
    #[must_use]
    pub const fn species(self) -> Option<AlienSpecies> {
        match self {
            Self::Alien { species } => Some(species),
            Self::Soldier | Self::Civilian | Self::Zombie { .. } => None,
        }
    }

    /// Reports whether the unit counts toward the hostile roster.
    #[must_use]
    pub const fn is_hostile(self) -> bool {
        matches!(self, Self::Alien { .. } | Self::Zombie { .. })
    }
}

/// Per-turn action budget of soldiers and aliens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeUnits {
    current: u32,
    max: u32,
}

impl TimeUnits {
    /// Creates a full budget with the provided maximum.
    #[must_use]
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Remaining time units.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Maximum time units.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Reports whether the provided cost can be paid.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.current >= cost
    }

    /// Deducts the provided cost, rejecting it when the budget is too small.
    pub fn spend(&mut self, cost: u32) -> Result<(), Rejection> {
        if !self.can_afford(cost) {
            return Err(Rejection::NotEnoughTu);
        }
        self.current -= cost;
        Ok(())
    }

    /// Refills the budget to the provided share of the maximum.
    pub fn refill(&mut self, percent: u32) {
        let percent = percent.min(100);
        self.current = self.max * percent / 100;
    }

    /// Halves the remaining time units.
    pub fn halve(&mut self) {
        self.current /= 2;
    }
}

/// Temporary psionic domination of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MindControl {
    /// Team currently in control of the unit.
    pub controller: Team,
    /// Turns of the unit's home team that must end before control reverts.
    pub turns_left: u32,
}

/// Combat statistics shared by every unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// Firing accuracy, 0 to 100.
    pub accuracy: u32,
    /// Reaction-fire probability, 0 to 100.
    pub reactions: u32,
    /// Psionic defence.
    pub bravery: u32,
    /// Grenade throwing accuracy, 0 to 100.
    pub throwing_accuracy: u32,
}

/// Terrain categories supplied by map generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Open floor.
    Floor,
    /// Open ground.
    Grass,
    /// Light vegetation offering some cover.
    Bush,
    /// Waist-high fence offering good cover.
    Fence,
    /// Debris left behind by destroyed terrain.
    Rubble,
    /// Deep water. Enterable in name only.
    Water,
    /// Destructible wall.
    Wall,
    /// Indestructible rock.
    Bedrock,
}

impl TerrainKind {
    /// Parses a mission layout legend character.
    #[must_use]
    pub const fn from_legend(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(Self::Floor),
            ',' => Some(Self::Grass),
            '*' => Some(Self::Bush),
            '+' => Some(Self::Fence),
            '=' => Some(Self::Rubble),
            '~' => Some(Self::Water),
            '#' => Some(Self::Wall),
            'X' => Some(Self::Bedrock),
            _ => None,
        }
    }

    /// Legend character used in mission layouts.
    #[must_use]
    pub const fn legend(self) -> char {
        match self {
            Self::Floor => '.',
            Self::Grass => ',',
            Self::Bush => '*',
            Self::Fence => '+',
            Self::Rubble => '=',
            Self::Water => '~',
            Self::Wall => '#',
            Self::Bedrock => 'X',
        }
    }
}

/// Static description of a single map tile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Terrain category.
    pub kind: TerrainKind,
    /// Reports whether units may enter and sight may pass.
    pub passable: bool,
    /// TU charged for entering the tile.
    pub tu_cost: u32,
    /// Fractional cover granted to adjacent defenders.
    pub cover: f32,
    /// Reports whether explosions can wear the tile down.
    pub destructible: bool,
    /// Remaining durability of destructible terrain.
    pub hp: i32,
}

impl Tile {
    /// Default tile of the provided terrain kind.
    #[must_use]
    pub const fn of(kind: TerrainKind) -> Self {
        let (passable, tu_cost, cover, destructible, hp) = match kind {
            TerrainKind::Floor | TerrainKind::Grass => (true, 4, 0.0, false, 0),
            TerrainKind::Bush => (true, 6, 0.2, true, 20),
            TerrainKind::Fence => (true, 8, 0.4, true, 30),
            TerrainKind::Rubble => (true, 6, 0.0, false, 0),
            TerrainKind::Water => (true, SENTINEL_TU_COST, 0.0, false, 0),
            TerrainKind::Wall => (false, 0, 0.0, true, 60),
            TerrainKind::Bedrock => (false, 0, 0.0, false, 0),
        };
        Self {
            kind,
            passable,
            tu_cost,
            cover,
            destructible,
            hp,
        }
    }

    /// Debris a destroyed tile collapses into.
    #[must_use]
    pub const fn rubble() -> Self {
        Self::of(TerrainKind::Rubble)
    }
}

/// Result of a psionic assault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PsionicOutcome {
    /// The target's bravery held.
    Resisted,
    /// The target panics and cannot act.
    Panic,
    /// The target loses half its TU and some morale.
    Demoralize,
    /// The attacker's team takes control of the target.
    MindControl,
}

/// Special actions available only to certain alien species.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlienAbility {
    /// Claw or bite an adjacent unit.
    Melee {
        /// Unit being struck.
        target: UnitId,
    },
    /// Rush toward a unit and strike it on contact.
    Charge {
        /// Unit being charged.
        target: UnitId,
    },
    /// Detonate a psionic blast centred on a tile.
    Blast {
        /// Centre of the blast.
        center: TilePos,
    },
    /// Call a Sectoid onto an adjacent tile.
    Summon {
        /// Tile the reinforcement appears on.
        at: TilePos,
    },
    /// Teleport to a nearby tile.
    Jump {
        /// Destination of the jump.
        to: TilePos,
    },
}

impl AlienAbility {
    /// Share of the performer's maximum TU the ability costs, movement excluded.
    #[must_use]
    pub const fn tu_percent(self) -> f32 {
        match self {
            Self::Melee { .. } | Self::Charge { .. } | Self::Jump { .. } => 0.25,
            Self::Blast { .. } | Self::Summon { .. } => 0.5,
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Walks a unit toward the destination, spending TU per tile.
    Move {
        /// Unit being moved.
        unit: UnitId,
        /// Tile the unit should walk toward.
        destination: TilePos,
    },
    /// Fires the attacker's weapon at a target.
    Attack {
        /// Unit firing.
        attacker: UnitId,
        /// Unit being fired upon.
        target: UnitId,
        /// Fire mode.
        shot: ShotType,
    },
    /// Throws a throwable item toward a tile.
    Throw {
        /// Unit throwing.
        unit: UnitId,
        /// Item being thrown.
        item: ItemKind,
        /// Intended landing tile before scatter.
        target: TilePos,
    },
    /// Uses a non-throwable item, optionally on another unit.
    UseItem {
        /// Unit using the item.
        unit: UnitId,
        /// Item being used.
        item: ItemKind,
        /// Recipient of the item, the user when absent.
        target: Option<UnitId>,
    },
    /// Reloads the equipped weapon from a spare clip.
    Reload {
        /// Unit reloading.
        unit: UnitId,
    },
    /// Switches between standing and kneeling.
    ToggleStance {
        /// Unit changing posture.
        unit: UnitId,
    },
    /// Readies the unit for reaction fire.
    SetOverwatch {
        /// Unit going on overwatch.
        unit: UnitId,
    },
    /// Launches a psionic attack.
    PsionicAttack {
        /// Psionic unit.
        attacker: UnitId,
        /// Unit being assaulted.
        target: UnitId,
    },
    /// Performs a species-specific alien ability.
    AlienAbility {
        /// Alien performing the ability.
        unit: UnitId,
        /// Ability performed.
        ability: AlienAbility,
    },
    /// Ends the player turn and hands control to the aliens.
    EndTurn,
    /// Ends the alien turn, evaluating the mission outcome.
    EndAlienTurn,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A new phase began.
    PhaseChanged {
        /// Phase entered.
        phase: Phase,
        /// Turn counter after the transition.
        turn: u32,
    },
    /// A unit entered a new tile.
    UnitMoved {
        /// Unit that moved.
        unit: UnitId,
        /// Tile left.
        from: TilePos,
        /// Tile entered.
        to: TilePos,
    },
    /// A move stopped before reaching its destination.
    MoveInterrupted {
        /// Unit whose move stopped.
        unit: UnitId,
        /// Tile the unit stopped on.
        at: TilePos,
    },
    /// A unit changed posture.
    StanceChanged {
        /// Unit that changed posture.
        unit: UnitId,
        /// New posture.
        stance: Stance,
    },
    /// A unit went on overwatch.
    OverwatchSet {
        /// Unit on overwatch.
        unit: UnitId,
    },
    /// A weapon was discharged.
    ShotFired {
        /// Unit firing.
        attacker: UnitId,
        /// Unit fired upon.
        target: UnitId,
        /// Fire mode.
        shot: ShotType,
        /// Rounds discharged.
        rounds: u32,
        /// Rounds that connected.
        hits: u32,
    },
    /// An overwatching unit interrupted an enemy move.
    ReactionFire {
        /// Unit reacting.
        shooter: UnitId,
        /// Moving unit.
        target: UnitId,
    },
    /// A unit lost health.
    UnitDamaged {
        /// Unit hurt.
        unit: UnitId,
        /// Health lost.
        amount: u32,
        /// Health remaining.
        health: i32,
    },
    /// A unit accumulated stun damage.
    UnitStunned {
        /// Unit stunned.
        unit: UnitId,
        /// Total stun damage accumulated.
        stun_damage: u32,
    },
    /// A unit died.
    UnitKilled {
        /// Unit killed.
        unit: UnitId,
    },
    /// A unit was knocked unconscious and captured.
    UnitCaptured {
        /// Unit captured.
        unit: UnitId,
    },
    /// A unit was pushed by a heavy impact.
    UnitKnockedBack {
        /// Unit pushed.
        unit: UnitId,
        /// Tile before the push.
        from: TilePos,
        /// Tile after the push.
        to: TilePos,
    },
    /// An explosion went off.
    Explosion {
        /// Centre of the explosion.
        center: TilePos,
        /// Damage at the centre.
        damage: u32,
        /// Radius at which damage reaches zero.
        radius: u32,
    },
    /// Destructible terrain collapsed into rubble.
    TerrainDestroyed {
        /// Tile destroyed.
        at: TilePos,
    },
    /// A thrown item came to rest.
    ItemLanded {
        /// Item thrown.
        item: ItemKind,
        /// Tile the item landed on.
        at: TilePos,
    },
    /// A smoke cloud was laid.
    SmokeDeployed {
        /// Centre of the cloud.
        center: TilePos,
    },
    /// A proximity mine was armed.
    MineArmed {
        /// Tile holding the mine.
        at: TilePos,
    },
    /// A proximity mine detonated.
    MineTriggered {
        /// Tile holding the mine.
        at: TilePos,
        /// Unit whose step set it off.
        by: UnitId,
    },
    /// A tile caught fire.
    FireStarted {
        /// Burning tile.
        at: TilePos,
    },
    /// A fire burned out.
    FireBurnedOut {
        /// Tile that stopped burning.
        at: TilePos,
    },
    /// A status effect was applied or intensified.
    StatusApplied {
        /// Affected unit.
        unit: UnitId,
        /// Kind of effect.
        kind: StatusKind,
    },
    /// A status effect wore off.
    StatusExpired {
        /// Affected unit.
        unit: UnitId,
        /// Kind of effect.
        kind: StatusKind,
    },
    /// A unit was healed.
    Healed {
        /// Unit healed.
        unit: UnitId,
        /// Health restored.
        amount: u32,
    },
    /// A weapon was reloaded.
    Reloaded {
        /// Unit reloading.
        unit: UnitId,
    },
    /// A psionic attack was resolved.
    PsionicAttack {
        /// Psionic unit.
        attacker: UnitId,
        /// Unit assaulted.
        target: UnitId,
        /// Result of the assault.
        outcome: PsionicOutcome,
    },
    /// A mind-controlled unit returned to its team.
    MindControlExpired {
        /// Unit released.
        unit: UnitId,
    },
    /// An alien entered the squad's field of view.
    UnitSpotted {
        /// Alien spotted.
        unit: UnitId,
    },
    /// A Chryssalid victim rose as a zombie.
    ZombieRisen {
        /// Newly created zombie.
        zombie: UnitId,
        /// Slain unit the zombie replaced.
        victim: UnitId,
    },
    /// A zombie hatched into a Chryssalid.
    ZombieHatched {
        /// Zombie removed.
        zombie: UnitId,
        /// Chryssalid created.
        alien: UnitId,
    },
    /// A new alien joined the battle.
    AlienSpawned {
        /// Alien created.
        unit: UnitId,
        /// Species of the alien.
        species: AlienSpecies,
        /// Tile the alien appeared on.
        at: TilePos,
    },
    /// A command was refused without changing state.
    CommandRejected {
        /// Reason for the refusal.
        reason: Rejection,
    },
}

impl Event {
    /// Short human-readable line describing the event, if it warrants one.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        let line = match self {
            Self::PhaseChanged { phase, turn } => match phase {
                Phase::PlayerTurn => format!("Turn {turn}: squad moves."),
                Phase::AlienTurn => "Alien activity!".to_owned(),
                Phase::Victory => "Mission accomplished!".to_owned(),
                Phase::Defeat => "Mission failed.".to_owned(),
            },
            Self::MoveInterrupted { unit, at } => format!("{unit} stopped at {at}."),
            Self::ReactionFire { shooter, target } => {
                format!("{shooter} reacts to {target}!")
            }
            Self::ShotFired { hits, rounds, .. } if *hits == 0 => {
                format!("Missed! (0/{rounds})")
            }
            Self::ShotFired { hits, rounds, .. } => format!("Hit! ({hits}/{rounds})"),
            Self::UnitKilled { unit } => format!("{unit} KIA!"),
            Self::UnitCaptured { unit } => format!("{unit} captured!"),
            Self::Explosion { center, .. } => format!("Explosion at {center}!"),
            Self::MineTriggered { at, .. } => format!("Mine triggered at {at}!"),
            Self::FireStarted { at } => format!("Fire at {at}!"),
            Self::PsionicAttack { target, outcome, .. } => match outcome {
                PsionicOutcome::Resisted => format!("{target} resists the psionic attack."),
                PsionicOutcome::Panic => format!("{target} panics!"),
                PsionicOutcome::Demoralize => format!("{target} is demoralized!"),
                PsionicOutcome::MindControl => format!("{target} is mind controlled!"),
            },
            Self::UnitSpotted { unit } => format!("Alien {unit} spotted!"),
            Self::ZombieRisen { victim, .. } => format!("{victim} rises as a zombie!"),
            Self::ZombieHatched { .. } => "A Chryssalid bursts out!".to_owned(),
            Self::AlienSpawned { species, at, .. } => format!("{species} appears at {at}!"),
            Self::CommandRejected { reason } => reason.to_string(),
            _ => return None,
        };
        Some(line)
    }
}

/// Reasons a command may be refused by the world.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The unit cannot pay the action's TU cost.
    #[error("Not enough TU!")]
    NotEnoughTu,
    /// The equipped weapon is empty.
    #[error("Out of ammo!")]
    NoAmmo,
    /// The target cannot be seen from the attacker's tile.
    #[error("No line of sight!")]
    NoLineOfSight,
    /// No path leads to the destination.
    #[error("Destination unreachable!")]
    Unreachable,
    /// The target lies beyond the weapon or throwing range.
    #[error("Out of range!")]
    OutOfRange,
    /// No unit carries the provided identifier.
    #[error("No such unit!")]
    UnknownUnit,
    /// The unit is dead or captured.
    #[error("Unit is down!")]
    UnitDown,
    /// The unit does not belong to the acting team.
    #[error("Not your turn!")]
    NotYourTurn,
    /// The unit is panicking and cannot act.
    #[error("Unit is panicking!")]
    Panicked,
    /// The unit carries no weapon.
    #[error("No weapon equipped!")]
    NoWeapon,
    /// The weapon has no such fire mode.
    #[error("Weapon cannot fire that way!")]
    ShotUnavailable,
    /// The item is not in the unit's inventory.
    #[error("Item not in inventory!")]
    ItemMissing,
    /// The item cannot be used with this command.
    #[error("Cannot use that item here!")]
    WrongItem,
    /// The target must stand next to the actor.
    #[error("Target must be adjacent!")]
    NotAdjacent,
    /// The unit has no psionic ability.
    #[error("No psionic ability!")]
    NoPsionics,
    /// The target is not a valid recipient of the action.
    #[error("Invalid target!")]
    InvalidTarget,
    /// The tile lies outside the map.
    #[error("Tile out of bounds!")]
    OutOfBounds,
    /// The tile is occupied or impassable.
    #[error("Tile is blocked!")]
    Blocked,
    /// The unit's species cannot perform the ability.
    #[error("Ability unavailable!")]
    AbilityUnavailable,
    /// The mission has already ended.
    #[error("The mission is over!")]
    GameOver,
}

/// Kill and capture tallies for the mission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MissionStats {
    /// Aliens and zombies killed.
    pub kills: u32,
    /// Aliens captured alive.
    pub captures: u32,
    /// Soldiers killed or captured.
    pub losses: u32,
    /// Civilians killed.
    pub civilians_lost: u32,
}

/// Read-only view into the dense terrain grid.
#[derive(Clone, Copy, Debug)]
pub struct TerrainView<'a> {
    tiles: &'a [Tile],
    width: u32,
    height: u32,
}

impl<'a> TerrainView<'a> {
    /// Captures a new terrain view backed by the provided tile slice.
    #[must_use]
    pub fn new(tiles: &'a [Tile], width: u32, height: u32) -> Self {
        Self {
            tiles,
            width,
            height,
        }
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Reports whether the tile lies on the map.
    #[must_use]
    pub const fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x() < self.width && pos.y() < self.height
    }

    /// Row-major index of the tile, if it lies on the map.
    #[must_use]
    pub fn index(&self, pos: TilePos) -> Option<usize> {
        grid_index(pos, self.width, self.height)
    }

    /// Position of the tile stored at the provided row-major index.
    #[must_use]
    pub fn position(&self, index: usize) -> Option<TilePos> {
        let width = usize::try_from(self.width).ok()?;
        if width == 0 || index >= self.tiles.len() {
            return None;
        }
        let x = u32::try_from(index % width).ok()?;
        let y = u32::try_from(index / width).ok()?;
        Some(TilePos::new(x, y))
    }

    /// Tile stored at the provided position.
    #[must_use]
    pub fn tile(&self, pos: TilePos) -> Option<&'a Tile> {
        self.index(pos).and_then(|index| self.tiles.get(index))
    }

    /// Reports whether the tile exists and is passable.
    #[must_use]
    pub fn is_passable(&self, pos: TilePos) -> bool {
        self.tile(pos).is_some_and(|tile| tile.passable)
    }

    /// Entry cost of the tile, if it exists and is passable.
    #[must_use]
    pub fn tu_cost(&self, pos: TilePos) -> Option<u32> {
        self.tile(pos)
            .filter(|tile| tile.passable)
            .map(|tile| tile.tu_cost)
    }

    /// Cover value of the tile, zero off the map.
    #[must_use]
    pub fn cover(&self, pos: TilePos) -> f32 {
        self.tile(pos).map_or(0.0, |tile| tile.cover)
    }

    /// Orthogonal neighbours of the tile that lie on the map.
    pub fn neighbors(&self, pos: TilePos) -> impl Iterator<Item = TilePos> + 'a {
        let (width, height) = (self.width, self.height);
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| pos.step(direction))
            .filter(move |next| next.x() < width && next.y() < height)
    }
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<UnitId>],
    width: u32,
    height: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<UnitId>], width: u32, height: u32) -> Self {
        Self {
            cells,
            width,
            height,
        }
    }

    /// Returns the unit occupying the provided tile, if any.
    #[must_use]
    pub fn occupant(&self, pos: TilePos) -> Option<UnitId> {
        grid_index(pos, self.width, self.height)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether no unit stands on the tile.
    #[must_use]
    pub fn is_free(&self, pos: TilePos) -> bool {
        self.occupant(pos).is_none()
    }
}

/// Read-only view into the per-tile smoke timers.
#[derive(Clone, Copy, Debug)]
pub struct SmokeView<'a> {
    turns: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> SmokeView<'a> {
    /// Captures a new smoke view backed by the provided timer slice.
    #[must_use]
    pub fn new(turns: &'a [u8], width: u32, height: u32) -> Self {
        Self {
            turns,
            width,
            height,
        }
    }

    /// Remaining smoke turns on the tile.
    #[must_use]
    pub fn turns_left(&self, pos: TilePos) -> u8 {
        grid_index(pos, self.width, self.height)
            .and_then(|index| self.turns.get(index).copied())
            .unwrap_or(0)
    }

    /// Reports whether the tile is currently smoked.
    #[must_use]
    pub fn has_smoke(&self, pos: TilePos) -> bool {
        self.turns_left(pos) > 0
    }
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Role-specific data.
    pub role: UnitRole,
    /// Team the unit was fielded by.
    pub team: Team,
    /// Team currently issuing the unit's orders.
    pub controller: Team,
    /// Tile currently occupied by the unit.
    pub pos: TilePos,
    /// Tile the unit entered the mission on.
    pub spawn: TilePos,
    /// Reports whether the unit is still in the fight.
    pub alive: bool,
    /// Reports whether the unit was stunned into captivity.
    pub captured: bool,
    /// Current health.
    pub health: i32,
    /// Maximum health.
    pub health_max: i32,
    /// Flat damage reduction.
    pub armor: u32,
    /// Combat statistics.
    pub stats: UnitStats,
    /// Morale, 0 to 100.
    pub morale: u32,
    /// Action budget, absent for civilians and zombies.
    pub time_units: Option<TimeUnits>,
    /// Current posture.
    pub stance: Stance,
    /// Reports whether the unit will take reaction shots.
    pub overwatching: bool,
    /// Turns of panic remaining.
    pub panicked_turns: u32,
    /// Active psionic domination, if any.
    pub mind_control: Option<MindControl>,
    /// Accumulated stun damage.
    pub stun_damage: u32,
    /// Active status effects.
    pub status: Vec<StatusEffect>,
    /// Equipped weapon.
    pub weapon: Option<Weapon>,
    /// Carried consumables.
    pub inventory: Vec<ItemKind>,
    /// Reports whether the squad currently sees the unit.
    pub spotted: bool,
    /// Reports whether the unit can launch psionic attacks.
    pub psionic: bool,
}

impl UnitSnapshot {
    /// Remaining time units, zero for units without a budget.
    #[must_use]
    pub fn tu(&self) -> u32 {
        self.time_units.map_or(0, |tu| tu.current())
    }

    /// Maximum time units, zero for units without a budget.
    #[must_use]
    pub fn tu_max(&self) -> u32 {
        self.time_units.map_or(0, |tu| tu.max())
    }

    /// Share of maximum health remaining.
    #[must_use]
    pub fn health_ratio(&self) -> f32 {
        if self.health_max <= 0 {
            return 0.0;
        }
        self.health.max(0) as f32 / self.health_max as f32
    }
}

/// Read-only snapshot describing every unit fielded on the mission.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over units still in the fight.
    pub fn living(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.alive)
    }

    /// Snapshot of the provided unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Burning tile and its remaining duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FireSnapshot {
    /// Burning tile.
    pub at: TilePos,
    /// Alien-turn ticks before the fire burns out.
    pub turns_left: u32,
}

/// Armed proximity mine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MineSnapshot {
    /// Tile holding the mine.
    pub at: TilePos,
    /// Explosion produced on detonation.
    pub blast: Blast,
    /// Unit that armed the mine.
    pub owner: UnitId,
}

fn grid_index(pos: TilePos, width: u32, height: u32) -> Option<usize> {
    if pos.x() < width && pos.y() < height {
        let row = usize::try_from(pos.y()).ok()?;
        let column = usize::try_from(pos.x()).ok()?;
        let width = usize::try_from(width).ok()?;
        Some(row * width + column)
    } else {
        None
    }
}
