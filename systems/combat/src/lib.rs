#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure attack-resolution formulas: hit chance, cover, armor mitigation,
//! explosion falloff, grenade scatter and knockback.
//!
//! Nothing here touches world state. Randomness is drawn from the generator
//! handed in by the caller so the world can replay a mission from its seed.

use rand::Rng;
use terror_site_core::{AmmoEffect, SmokeView, Stance, TerrainView, TilePos};

/// Lowest hit probability any shot can have.
pub const MIN_HIT_CHANCE: f32 = 0.05;

/// Highest hit probability any shot can have.
pub const MAX_HIT_CHANCE: f32 = 0.95;

/// Accuracy multiplier applied on night missions.
pub const NIGHT_ACCURACY: f32 = 0.8;

/// Cover granted by smoke on the target's own tile.
pub const SMOKE_COVER: f32 = 0.3;

/// Inputs of the hit-chance formula for a single shot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShotContext {
    /// Shooter accuracy on the 0 to 100 scale.
    pub accuracy: u32,
    /// Shooter posture.
    pub stance: Stance,
    /// Shooter's current health.
    pub health: i32,
    /// Shooter's maximum health.
    pub health_max: i32,
    /// Reports whether the mission takes place at night.
    pub night: bool,
    /// Accuracy multiplier of the fire mode.
    pub shot_accuracy: f32,
    /// Cover protecting the target.
    pub cover: f32,
}

/// Accuracy multiplier for a wounded shooter.
#[must_use]
pub fn wound_penalty(health: i32, health_max: i32) -> f32 {
    if health_max <= 0 {
        return 0.5;
    }
    let ratio = health.max(0) as f32 / health_max as f32;
    if ratio >= 0.75 {
        1.0
    } else if ratio >= 0.5 {
        0.9
    } else if ratio >= 0.25 {
        0.75
    } else {
        0.5
    }
}

/// Probability that a single round hits, clamped to
/// [`MIN_HIT_CHANCE`]..=[`MAX_HIT_CHANCE`].
#[must_use]
pub fn hit_chance(context: &ShotContext) -> f32 {
    let night = if context.night { NIGHT_ACCURACY } else { 1.0 };
    let raw = context.accuracy as f32 / 100.0
        * context.stance.accuracy_modifier()
        * wound_penalty(context.health, context.health_max)
        * night
        * context.shot_accuracy
        * (1.0 - context.cover.clamp(0.0, 1.0));
    raw.clamp(MIN_HIT_CHANCE, MAX_HIT_CHANCE)
}

/// Cover protecting a target at `target` against fire from `attacker`.
///
/// The tile adjacent to the target in the attacker's direction provides its
/// cover value when positive. Otherwise smoke on the target's own tile grants
/// [`SMOKE_COVER`].
#[must_use]
pub fn cover_bonus(
    terrain: &TerrainView<'_>,
    smoke: &SmokeView<'_>,
    attacker: TilePos,
    target: TilePos,
) -> f32 {
    let dx = signum(attacker.x(), target.x());
    let dy = signum(attacker.y(), target.y());
    let shield = if (dx, dy) == (0, 0) {
        0.0
    } else {
        target.offset(dx, dy).map_or(0.0, |pos| terrain.cover(pos))
    };
    if shield > 0.0 {
        shield
    } else if smoke.has_smoke(target) {
        SMOKE_COVER
    } else {
        0.0
    }
}

/// Armor left after the ammunition's special effect.
#[must_use]
pub fn effective_armor(armor: u32, effect: AmmoEffect) -> u32 {
    match effect {
        AmmoEffect::BypassArmor => 0,
        AmmoEffect::Penetration { percent } => armor - armor * percent.min(100) / 100,
        AmmoEffect::Plain
        | AmmoEffect::Knockback { .. }
        | AmmoEffect::Stun
        | AmmoEffect::Incendiary
        | AmmoEffect::Irradiate => armor,
    }
}

/// Damage left after armor. Armor alone never reduces a hit below 1.
#[must_use]
pub fn mitigate(raw: u32, armor: u32) -> u32 {
    raw.saturating_sub(armor).max(1)
}

/// Rolls the pre-armor damage of a single hit, `base` scaled by `[0.5, 2.0)`.
pub fn roll_damage<R: Rng + ?Sized>(rng: &mut R, base: u32) -> u32 {
    let factor: f32 = rng.gen_range(0.5..2.0);
    (base as f32 * factor).round() as u32
}

/// Rolls a success with the provided probability.
pub fn roll<R: Rng + ?Sized>(rng: &mut R, probability: f32) -> bool {
    rng.gen::<f32>() < probability
}

/// Linear explosion damage at `distance` from the centre.
///
/// Equals `damage` at the centre, reaches exactly 0 at `radius` and never
/// goes negative beyond it.
#[must_use]
pub fn explosion_falloff(damage: u32, radius: u32, distance: f32) -> f32 {
    if radius == 0 {
        return if distance <= 0.0 { damage as f32 } else { 0.0 };
    }
    (damage as f32 * (1.0 - distance / radius as f32)).max(0.0)
}

/// Tile touched by an explosion and the falloff damage it receives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlastTile {
    /// Affected tile.
    pub pos: TilePos,
    /// Euclidean distance from the centre.
    pub distance: f32,
    /// Unrounded falloff damage.
    pub falloff: f32,
}

/// Every on-map tile within Euclidean `radius` of `center`, row-major.
#[must_use]
pub fn explosion_footprint(
    terrain: &TerrainView<'_>,
    center: TilePos,
    damage: u32,
    radius: u32,
) -> Vec<BlastTile> {
    let reach = i64::from(radius);
    let mut tiles = Vec::new();
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let Some(pos) = center.offset(dx, dy) else {
                continue;
            };
            if !terrain.in_bounds(pos) {
                continue;
            }
            let distance = center.euclidean_distance(pos);
            if distance > radius as f32 {
                continue;
            }
            tiles.push(BlastTile {
                pos,
                distance,
                falloff: explosion_falloff(damage, radius, distance),
            });
        }
    }
    tiles
}

/// Maximum scatter, in tiles, of a throw over `distance` tiles.
#[must_use]
pub fn scatter_radius(throwing_accuracy: u32, distance: f32) -> u32 {
    let inaccuracy = 100_u32.saturating_sub(throwing_accuracy) as f32;
    (inaccuracy / 20.0 * distance / 5.0).floor().max(0.0) as u32
}

/// Applies a uniform `±radius` offset on both axes, clamped to the map.
pub fn scatter<R: Rng + ?Sized>(
    rng: &mut R,
    terrain: &TerrainView<'_>,
    target: TilePos,
    radius: u32,
) -> TilePos {
    if radius == 0 {
        return target;
    }
    let reach = i64::from(radius);
    let dx = rng.gen_range(-reach..=reach);
    let dy = rng.gen_range(-reach..=reach);
    let (width, height) = terrain.dimensions();
    let clamp = |value: i64, size: u32| -> u32 {
        let limit = i64::from(size.saturating_sub(1));
        u32::try_from(value.clamp(0, limit)).unwrap_or(0)
    };
    TilePos::new(
        clamp(i64::from(target.x()) + dx, width),
        clamp(i64::from(target.y()) + dy, height),
    )
}

/// Tiles a knocked-back target would cross, nearest first.
///
/// The push follows the sign of the attack vector on each axis. Callers stop
/// at the first tile that is blocked.
#[must_use]
pub fn knockback_path(attacker: TilePos, target: TilePos, distance: u32) -> Vec<TilePos> {
    let dx = signum(target.x(), attacker.x());
    let dy = signum(target.y(), attacker.y());
    if (dx, dy) == (0, 0) {
        return Vec::new();
    }
    let mut path = Vec::new();
    let mut cursor = target;
    for _ in 0..distance {
        let Some(next) = cursor.offset(dx, dy) else {
            break;
        };
        path.push(next);
        cursor = next;
    }
    path
}

fn signum(to: u32, from: u32) -> i64 {
    (i64::from(to) - i64::from(from)).signum()
}
