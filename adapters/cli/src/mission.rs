use std::{fs, path::Path};

use anyhow::{Context, Result};
use terror_site_core::{AlienSpecies, ItemKind, WeaponKind};
use terror_site_world::{MissionSpec, UnitSpec};

/// Reads a TOML mission description from disk.
pub(crate) fn load(path: &Path) -> Result<MissionSpec> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read mission file at {}", path.display()))?;
    parse(&contents).with_context(|| format!("failed to load mission from {}", path.display()))
}

fn parse(contents: &str) -> Result<MissionSpec> {
    toml::from_str(contents).context("failed to parse mission toml contents")
}

/// Small terror site used when no mission file is supplied.
pub(crate) fn demo() -> MissionSpec {
    let kit = [ItemKind::FragGrenade, ItemKind::Medikit, ItemKind::Clip];
    MissionSpec::new([
        "................",
        "..*....++...##..",
        "..*.........#...",
        "......~~....#...",
        "..++..~~........",
        "................",
        "...#....*.......",
        "...#....*...++..",
        "................",
        "........,,,,....",
    ])
    .with_seed(1)
    .with_unit(UnitSpec::soldier(0, 0).with_inventory(kit))
    .with_unit(UnitSpec::soldier(0, 2).with_inventory(kit))
    .with_unit(
        UnitSpec::soldier(0, 5)
            .with_weapon(WeaponKind::HeavyCannon)
            .with_inventory([ItemKind::SmokeGrenade, ItemKind::Clip]),
    )
    .with_unit(
        UnitSpec::soldier(0, 8)
            .with_weapon(WeaponKind::StunRod)
            .with_inventory([ItemKind::ProximityMine]),
    )
    .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 14, 0))
    .with_unit(UnitSpec::alien(AlienSpecies::Sectoid, 15, 5))
    .with_unit(UnitSpec::alien(AlienSpecies::Floater, 11, 8))
    .with_unit(UnitSpec::alien(AlienSpecies::Muton, 14, 3))
    .with_unit(UnitSpec::alien(AlienSpecies::Chryssalid, 10, 6))
    .with_unit(UnitSpec::civilian(6, 5))
    .with_unit(UnitSpec::civilian(9, 0))
}
