//! Authoritative unit state and the registry that allocates unit identifiers.

use std::collections::BTreeMap;

use terror_site_core::{
    AlienSpecies, ItemKind, MindControl, Stance, StatusEffect, StatusKind, Team, TilePos,
    TimeUnits, UnitId, UnitRole, UnitSnapshot, UnitStats, Weapon,
};

pub(crate) const ZOMBIE_HEALTH: i32 = 60;
pub(crate) const ZOMBIE_MELEE_DAMAGE: u32 = 20;
pub(crate) const ZOMBIE_TURNS_TO_HATCH: u32 = 3;
pub(crate) const FULL_MORALE: u32 = 100;

/// Complete state of a unit stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Unit {
    pub(crate) id: UnitId,
    pub(crate) role: UnitRole,
    pub(crate) team: Team,
    pub(crate) pos: TilePos,
    pub(crate) spawn: TilePos,
    pub(crate) alive: bool,
    pub(crate) captured: bool,
    pub(crate) health: i32,
    pub(crate) health_max: i32,
    pub(crate) armor: u32,
    pub(crate) stats: UnitStats,
    pub(crate) morale: u32,
    pub(crate) time_units: Option<TimeUnits>,
    pub(crate) stance: Stance,
    pub(crate) overwatching: bool,
    pub(crate) panicked_turns: u32,
    pub(crate) mind_control: Option<MindControl>,
    pub(crate) stun_damage: u32,
    pub(crate) status: Vec<StatusEffect>,
    pub(crate) weapon: Option<Weapon>,
    pub(crate) inventory: Vec<ItemKind>,
    pub(crate) spotted: bool,
    pub(crate) psionic: bool,
    pub(crate) melee_damage: u32,
}

/// Everything needed to field a new unit apart from its identifier.
#[derive(Clone, Debug)]
pub(crate) struct UnitTemplate {
    pub(crate) role: UnitRole,
    pub(crate) team: Team,
    pub(crate) health: i32,
    pub(crate) armor: u32,
    pub(crate) stats: UnitStats,
    pub(crate) time_units: Option<u32>,
    pub(crate) weapon: Option<Weapon>,
    pub(crate) inventory: Vec<ItemKind>,
    pub(crate) psionic: bool,
    pub(crate) melee_damage: u32,
}

impl UnitTemplate {
    /// Baseline alien of the provided species.
    pub(crate) fn alien(species: AlienSpecies) -> Self {
        let stats = species.stats();
        Self {
            role: UnitRole::Alien { species },
            team: Team::Alien,
            health: stats.health,
            armor: stats.armor,
            stats: UnitStats {
                accuracy: stats.accuracy,
                reactions: stats.reactions,
                bravery: stats.bravery,
                throwing_accuracy: stats.accuracy,
            },
            time_units: Some(stats.time_units),
            weapon: stats.weapon.map(Weapon::loaded),
            inventory: Vec::new(),
            psionic: stats.psionic,
            melee_damage: stats.melee_damage,
        }
    }

    /// Freshly risen zombie.
    pub(crate) fn zombie() -> Self {
        Self {
            role: UnitRole::Zombie {
                turns_to_hatch: ZOMBIE_TURNS_TO_HATCH,
            },
            team: Team::Alien,
            health: ZOMBIE_HEALTH,
            armor: 0,
            stats: UnitStats {
                accuracy: 0,
                reactions: 0,
                bravery: 0,
                throwing_accuracy: 0,
            },
            time_units: None,
            weapon: None,
            inventory: Vec::new(),
            psionic: false,
            melee_damage: ZOMBIE_MELEE_DAMAGE,
        }
    }
}

impl Unit {
    fn from_template(id: UnitId, pos: TilePos, template: UnitTemplate) -> Self {
        Self {
            id,
            role: template.role,
            team: template.team,
            pos,
            spawn: pos,
            alive: true,
            captured: false,
            health: template.health,
            health_max: template.health,
            armor: template.armor,
            stats: template.stats,
            morale: FULL_MORALE,
            time_units: template.time_units.map(TimeUnits::full),
            stance: Stance::Standing,
            overwatching: false,
            panicked_turns: 0,
            mind_control: None,
            stun_damage: 0,
            status: Vec::new(),
            weapon: template.weapon,
            inventory: template.inventory,
            spotted: false,
            psionic: template.psionic,
            melee_damage: template.melee_damage,
        }
    }

    /// Team currently issuing the unit's orders.
    pub(crate) fn controller(&self) -> Team {
        self.mind_control
            .map_or(self.team, |control| control.controller)
    }

    /// TU currently available, zero for units without a budget.
    pub(crate) fn tu(&self) -> u32 {
        self.time_units.map_or(0, |tu| tu.current())
    }

    /// Maximum TU, zero for units without a budget.
    pub(crate) fn tu_max(&self) -> u32 {
        self.time_units.map_or(0, |tu| tu.max())
    }

    /// Reports whether the unit fights as a soldier.
    pub(crate) fn is_soldier(&self) -> bool {
        matches!(self.role, UnitRole::Soldier)
    }

    /// Reports whether the unit carries a status of the provided kind.
    pub(crate) fn has_status(&self, kind: StatusKind) -> bool {
        self.status.iter().any(|effect| effect.kind == kind)
    }

    /// Applies or intensifies a status effect.
    pub(crate) fn add_status(&mut self, kind: StatusKind, duration: u32) {
        if let Some(effect) = self.status.iter_mut().find(|effect| effect.kind == kind) {
            effect.stacks = (effect.stacks + 1).min(kind.max_stacks());
            effect.duration = effect.duration.max(duration);
            return;
        }
        self.status.push(StatusEffect {
            kind,
            duration,
            stacks: 1,
        });
        self.status.sort_by_key(|effect| effect.kind);
    }

    /// Removes the status effect of the provided kind, reporting whether it
    /// was present.
    pub(crate) fn clear_status(&mut self, kind: StatusKind) -> bool {
        let before = self.status.len();
        self.status.retain(|effect| effect.kind != kind);
        before != self.status.len()
    }

    /// Removes one item of the provided kind from the inventory.
    pub(crate) fn take_item(&mut self, item: ItemKind) -> bool {
        match self.inventory.iter().position(|carried| *carried == item) {
            Some(index) => {
                let _ = self.inventory.remove(index);
                true
            }
            None => false,
        }
    }

    /// Reports whether the unit carries an item of the provided kind.
    pub(crate) fn carries(&self, item: ItemKind) -> bool {
        self.inventory.contains(&item)
    }

    /// Captures an immutable snapshot of the unit.
    pub(crate) fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            role: self.role,
            team: self.team,
            controller: self.controller(),
            pos: self.pos,
            spawn: self.spawn,
            alive: self.alive,
            captured: self.captured,
            health: self.health,
            health_max: self.health_max,
            armor: self.armor,
            stats: self.stats,
            morale: self.morale,
            time_units: self.time_units,
            stance: self.stance,
            overwatching: self.overwatching,
            panicked_turns: self.panicked_turns,
            mind_control: self.mind_control,
            stun_damage: self.stun_damage,
            status: self.status.clone(),
            weapon: self.weapon,
            inventory: self.inventory.clone(),
            spotted: self.spotted,
            psionic: self.psionic,
        }
    }
}

/// Registry that stores units and manages identifier allocation.
#[derive(Clone, Debug)]
pub(crate) struct UnitRegistry {
    entries: BTreeMap<UnitId, Unit>,
    next_unit_id: UnitId,
}

impl UnitRegistry {
    /// Creates an empty registry whose first identifier is 1.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_unit_id: UnitId::new(1),
        }
    }

    /// Fields a new unit at the provided tile and returns its identifier.
    pub(crate) fn insert(&mut self, pos: TilePos, template: UnitTemplate) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id = UnitId::new(id.get().saturating_add(1));
        let _ = self
            .entries
            .insert(id, Unit::from_template(id, pos, template));
        id
    }

    pub(crate) fn get(&self, id: UnitId) -> Option<&Unit> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.entries.get_mut(&id)
    }

    /// Units in ascending identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.entries.values_mut()
    }

    /// Living units in ascending identifier order.
    pub(crate) fn living(&self) -> impl Iterator<Item = &Unit> {
        self.entries.values().filter(|unit| unit.alive)
    }

    /// Identifiers of living units matching the predicate, ascending.
    pub(crate) fn ids_where<F>(&self, mut predicate: F) -> Vec<UnitId>
    where
        F: FnMut(&Unit) -> bool,
    {
        self.living()
            .filter(|unit| predicate(unit))
            .map(|unit| unit.id)
            .collect()
    }
}
