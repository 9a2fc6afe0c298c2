//! Mission descriptions supplied by map generation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use terror_site_core::{
    AlienSpecies, ItemKind, Team, TerrainKind, Tile, TilePos, UnitRole, UnitStats, Weapon,
    WeaponKind,
};
use thiserror::Error;

use crate::{grid::Grid, unit::UnitTemplate};

const SOLDIER_HEALTH: i32 = 40;
const SOLDIER_TIME_UNITS: u32 = 50;
const SOLDIER_STATS: UnitStats = UnitStats {
    accuracy: 60,
    reactions: 50,
    bravery: 40,
    throwing_accuracy: 60,
};
const SOLDIER_WEAPON: WeaponKind = WeaponKind::Rifle;
const CIVILIAN_HEALTH: i32 = 20;
const CIVILIAN_STATS: UnitStats = UnitStats {
    accuracy: 0,
    reactions: 0,
    bravery: 10,
    throwing_accuracy: 0,
};

/// Complete description of a mission: terrain, lighting, units and seed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionSpec {
    /// Seed for every random roll made by the world.
    #[serde(default)]
    pub seed: u64,
    /// Reports whether the mission takes place at night.
    #[serde(default)]
    pub night: bool,
    /// Rows of terrain legend characters, top row first.
    pub layout: Vec<String>,
    /// Units fielded at mission start, in identifier order.
    #[serde(default)]
    pub units: Vec<UnitSpec>,
}

impl MissionSpec {
    /// Creates a mission with the provided layout and no units.
    #[must_use]
    pub fn new<I, S>(layout: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seed: 0,
            night: false,
            layout: layout.into_iter().map(Into::into).collect(),
            units: Vec::new(),
        }
    }

    /// Replaces the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Marks the mission as taking place at night.
    #[must_use]
    pub fn at_night(mut self, night: bool) -> Self {
        self.night = night;
        self
    }

    /// Appends a unit to the roster.
    #[must_use]
    pub fn with_unit(mut self, unit: UnitSpec) -> Self {
        self.units.push(unit);
        self
    }
}

/// Broad category of a unit in a mission description.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Player-controlled soldier.
    Soldier,
    /// Neutral civilian.
    Civilian,
    /// Alien; requires a species.
    Alien,
}

/// Optional per-unit statistic overrides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatOverrides {
    /// Starting and maximum health.
    pub health: Option<i32>,
    /// Flat damage reduction.
    pub armor: Option<u32>,
    /// Firing accuracy.
    pub accuracy: Option<u32>,
    /// Reaction-fire probability.
    pub reactions: Option<u32>,
    /// Psionic defence.
    pub bravery: Option<u32>,
    /// Grenade throwing accuracy.
    pub throwing_accuracy: Option<u32>,
    /// Maximum time units.
    pub time_units: Option<u32>,
    /// Grants or removes psionic ability.
    pub psionic: Option<bool>,
}

/// Description of a single unit placed at mission start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Category of the unit.
    pub kind: UnitKind,
    /// Starting column.
    pub x: u32,
    /// Starting row.
    pub y: u32,
    /// Species of an alien.
    #[serde(default)]
    pub species: Option<AlienSpecies>,
    /// Weapon replacing the default loadout.
    #[serde(default)]
    pub weapon: Option<WeaponKind>,
    /// Carried consumables.
    #[serde(default)]
    pub inventory: Vec<ItemKind>,
    /// Statistic overrides.
    #[serde(default)]
    pub stats: StatOverrides,
}

impl UnitSpec {
    /// Soldier with the default loadout.
    #[must_use]
    pub fn soldier(x: u32, y: u32) -> Self {
        Self::of_kind(UnitKind::Soldier, x, y)
    }

    /// Civilian.
    #[must_use]
    pub fn civilian(x: u32, y: u32) -> Self {
        Self::of_kind(UnitKind::Civilian, x, y)
    }

    /// Alien of the provided species.
    #[must_use]
    pub fn alien(species: AlienSpecies, x: u32, y: u32) -> Self {
        Self {
            species: Some(species),
            ..Self::of_kind(UnitKind::Alien, x, y)
        }
    }

    fn of_kind(kind: UnitKind, x: u32, y: u32) -> Self {
        Self {
            kind,
            x,
            y,
            species: None,
            weapon: None,
            inventory: Vec::new(),
            stats: StatOverrides::default(),
        }
    }

    /// Replaces the equipped weapon.
    #[must_use]
    pub fn with_weapon(mut self, weapon: WeaponKind) -> Self {
        self.weapon = Some(weapon);
        self
    }

    /// Replaces the carried consumables.
    #[must_use]
    pub fn with_inventory<I>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = ItemKind>,
    {
        self.inventory = items.into_iter().collect();
        self
    }

    /// Replaces the statistic overrides.
    #[must_use]
    pub fn with_stats(mut self, stats: StatOverrides) -> Self {
        self.stats = stats;
        self
    }

    fn position(&self) -> TilePos {
        TilePos::new(self.x, self.y)
    }

    fn template(&self, index: usize) -> Result<UnitTemplate, MissionError> {
        let mut template = match self.kind {
            UnitKind::Soldier => UnitTemplate {
                role: UnitRole::Soldier,
                team: Team::Player,
                health: SOLDIER_HEALTH,
                armor: 0,
                stats: SOLDIER_STATS,
                time_units: Some(SOLDIER_TIME_UNITS),
                weapon: Some(Weapon::loaded(SOLDIER_WEAPON)),
                inventory: Vec::new(),
                psionic: false,
                melee_damage: 0,
            },
            UnitKind::Civilian => UnitTemplate {
                role: UnitRole::Civilian,
                team: Team::Neutral,
                health: CIVILIAN_HEALTH,
                armor: 0,
                stats: CIVILIAN_STATS,
                time_units: None,
                weapon: None,
                inventory: Vec::new(),
                psionic: false,
                melee_damage: 0,
            },
            UnitKind::Alien => {
                let species = self
                    .species
                    .ok_or(MissionError::MissingSpecies { index })?;
                UnitTemplate::alien(species)
            }
        };

        if let Some(weapon) = self.weapon {
            template.weapon = Some(Weapon::loaded(weapon));
        }
        template.inventory.extend(self.inventory.iter().copied());

        let overrides = self.stats;
        if let Some(health) = overrides.health {
            template.health = health.max(1);
        }
        if let Some(armor) = overrides.armor {
            template.armor = armor;
        }
        if let Some(accuracy) = overrides.accuracy {
            template.stats.accuracy = accuracy;
        }
        if let Some(reactions) = overrides.reactions {
            template.stats.reactions = reactions;
        }
        if let Some(bravery) = overrides.bravery {
            template.stats.bravery = bravery;
        }
        if let Some(throwing) = overrides.throwing_accuracy {
            template.stats.throwing_accuracy = throwing;
        }
        if let Some(time_units) = overrides.time_units {
            if template.time_units.is_some() {
                template.time_units = Some(time_units);
            }
        }
        if let Some(psionic) = overrides.psionic {
            template.psionic = psionic;
        }
        Ok(template)
    }
}

/// Errors raised while turning a [`MissionSpec`] into a world.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MissionError {
    /// The layout has no rows or no columns.
    #[error("mission layout is empty")]
    EmptyLayout,
    /// The layout does not fit the coordinate space.
    #[error("mission layout is too large")]
    LayoutTooLarge,
    /// A row's length differs from the first row's.
    #[error("layout row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A layout character has no terrain meaning.
    #[error("unknown terrain symbol {symbol:?} at ({x}, {y})")]
    UnknownTerrain {
        /// Offending character.
        symbol: char,
        /// Column of the character.
        x: usize,
        /// Row of the character.
        y: usize,
    },
    /// An alien was described without a species.
    #[error("unit {index} is an alien without a species")]
    MissingSpecies {
        /// Position of the unit in the roster.
        index: usize,
    },
    /// A unit starts outside the map.
    #[error("unit {index} starts outside the map at ({x}, {y})")]
    UnitOutOfBounds {
        /// Position of the unit in the roster.
        index: usize,
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
    },
    /// A unit starts on impassable terrain.
    #[error("unit {index} starts on impassable terrain at ({x}, {y})")]
    UnitOnImpassable {
        /// Position of the unit in the roster.
        index: usize,
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
    },
    /// Two units start on the same tile.
    #[error("unit {index} shares tile ({x}, {y}) with another unit")]
    SharedTile {
        /// Position of the later unit in the roster.
        index: usize,
        /// Shared column.
        x: u32,
        /// Shared row.
        y: u32,
    },
}

/// Validated terrain grid and unit placements of a mission.
pub(crate) struct Deployment {
    pub(crate) grid: Grid,
    pub(crate) units: Vec<(TilePos, UnitTemplate)>,
}

pub(crate) fn deploy(spec: &MissionSpec) -> Result<Deployment, MissionError> {
    let expected = spec.layout.first().map_or(0, |row| row.chars().count());
    if expected == 0 {
        return Err(MissionError::EmptyLayout);
    }

    let mut tiles = Vec::with_capacity(expected * spec.layout.len());
    for (y, row) in spec.layout.iter().enumerate() {
        let found = row.chars().count();
        if found != expected {
            return Err(MissionError::RaggedRow {
                row: y,
                expected,
                found,
            });
        }
        for (x, symbol) in row.chars().enumerate() {
            let kind = TerrainKind::from_legend(symbol)
                .ok_or(MissionError::UnknownTerrain { symbol, x, y })?;
            tiles.push(Tile::of(kind));
        }
    }

    let width = u32::try_from(expected).map_err(|_| MissionError::LayoutTooLarge)?;
    let height = u32::try_from(spec.layout.len()).map_err(|_| MissionError::LayoutTooLarge)?;
    let grid = Grid::new(width, height, tiles);

    let mut claimed = BTreeSet::new();
    let mut units = Vec::with_capacity(spec.units.len());
    for (index, unit) in spec.units.iter().enumerate() {
        let template = unit.template(index)?;
        let pos = unit.position();
        let (x, y) = (unit.x, unit.y);
        let Some(tile) = grid.tile(pos) else {
            return Err(MissionError::UnitOutOfBounds { index, x, y });
        };
        if !tile.passable {
            return Err(MissionError::UnitOnImpassable { index, x, y });
        }
        if !claimed.insert(pos) {
            return Err(MissionError::SharedTile { index, x, y });
        }
        units.push((pos, template));
    }

    Ok(Deployment { grid, units })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_rows() {
        let spec = MissionSpec::new(["...", ".."]);
        assert_eq!(
            deploy(&spec).err(),
            Some(MissionError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn rejects_unknown_symbols() {
        let spec = MissionSpec::new(["..?"]);
        assert_eq!(
            deploy(&spec).err(),
            Some(MissionError::UnknownTerrain {
                symbol: '?',
                x: 2,
                y: 0
            })
        );
    }

    #[test]
    fn rejects_bad_unit_placement() {
        let base = MissionSpec::new([".#", ".."]);
        let outside = base.clone().with_unit(UnitSpec::soldier(4, 0));
        assert!(matches!(
            deploy(&outside).err(),
            Some(MissionError::UnitOutOfBounds { index: 0, .. })
        ));
        let wall = base.clone().with_unit(UnitSpec::soldier(1, 0));
        assert!(matches!(
            deploy(&wall).err(),
            Some(MissionError::UnitOnImpassable { index: 0, .. })
        ));
        let shared = base
            .clone()
            .with_unit(UnitSpec::soldier(0, 0))
            .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 0, 0));
        assert!(matches!(
            deploy(&shared).err(),
            Some(MissionError::SharedTile { index: 1, .. })
        ));
        let nameless = base.with_unit(UnitSpec {
            species: None,
            ..UnitSpec::alien(AlienSpecies::Muton, 0, 1)
        });
        assert_eq!(
            deploy(&nameless).err(),
            Some(MissionError::MissingSpecies { index: 0 })
        );
    }

    #[test]
    fn overrides_replace_defaults() {
        let spec = MissionSpec::new([".."]).with_unit(
            UnitSpec::soldier(1, 0)
                .with_weapon(WeaponKind::Pistol)
                .with_stats(StatOverrides {
                    time_units: Some(70),
                    reactions: Some(90),
                    ..StatOverrides::default()
                }),
        );
        let deployment = deploy(&spec).expect("valid mission");
        let (pos, template) = &deployment.units[0];
        assert_eq!(*pos, TilePos::new(1, 0));
        assert_eq!(template.time_units, Some(70));
        assert_eq!(template.stats.reactions, 90);
        assert_eq!(template.weapon.map(|weapon| weapon.kind), Some(WeaponKind::Pistol));
    }
}
