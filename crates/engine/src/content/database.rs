use std::collections::HashMap;

use crate::combat::Weapon;
use crate::damage::Damageable;
use crate::powers::Power;
use crate::world::{creature_spec, Alignment, Creature, CreatureStats, EntitySpec, IdleBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct WeaponDef {
    pub id: DefId,
    pub def_name: String,
    pub label: String,
    pub weapon: Weapon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatureDef {
    pub id: DefId,
    pub def_name: String,
    pub label: String,
    /// `defName` of a weapon in the same database.
    pub weapon: String,
    pub damageable: Damageable,
    pub stats: CreatureStats,
    pub idle_behavior: IdleBehavior,
    pub conductive: bool,
    pub powers: Vec<Power>,
}

/// Compiled species and weapon definitions. Ids follow `defName` order.
#[derive(Debug, Default, Clone)]
pub struct DefDatabase {
    weapon_defs: Vec<WeaponDef>,
    creature_defs: Vec<CreatureDef>,
    weapon_ids_by_name: HashMap<String, DefId>,
    creature_ids_by_name: HashMap<String, DefId>,
}

impl DefDatabase {
    pub(crate) fn from_defs(
        mut weapon_defs: Vec<WeaponDef>,
        mut creature_defs: Vec<CreatureDef>,
    ) -> Self {
        let mut weapon_ids_by_name = HashMap::with_capacity(weapon_defs.len());
        for (idx, def) in weapon_defs.iter_mut().enumerate() {
            def.id = DefId(idx as u32);
            weapon_ids_by_name.insert(def.def_name.clone(), def.id);
        }
        let mut creature_ids_by_name = HashMap::with_capacity(creature_defs.len());
        for (idx, def) in creature_defs.iter_mut().enumerate() {
            def.id = DefId(idx as u32);
            creature_ids_by_name.insert(def.def_name.clone(), def.id);
        }
        Self {
            weapon_defs,
            creature_defs,
            weapon_ids_by_name,
            creature_ids_by_name,
        }
    }

    pub fn weapon_id_by_name(&self, name: &str) -> Option<DefId> {
        self.weapon_ids_by_name.get(name).copied()
    }

    pub fn weapon_def(&self, id: DefId) -> Option<&WeaponDef> {
        self.weapon_defs.get(id.0 as usize)
    }

    pub fn weapon_defs(&self) -> &[WeaponDef] {
        &self.weapon_defs
    }

    pub fn creature_id_by_name(&self, name: &str) -> Option<DefId> {
        self.creature_ids_by_name.get(name).copied()
    }

    pub fn creature_def(&self, id: DefId) -> Option<&CreatureDef> {
        self.creature_defs.get(id.0 as usize)
    }

    pub fn creature_defs(&self) -> &[CreatureDef] {
        &self.creature_defs
    }

    /// Fresh weapon instance with a full clip.
    pub fn weapon(&self, name: &str) -> Option<Weapon> {
        let id = self.weapon_id_by_name(name)?;
        self.weapon_def(id).map(|def| def.weapon.clone())
    }

    /// Spawnable creature of species `name` on the given side.
    pub fn creature_spec(&self, name: &str, alignment: Alignment) -> Option<EntitySpec> {
        let def = self.creature_def(self.creature_id_by_name(name)?)?;
        let weapon = self.weapon(&def.weapon)?;
        let mut creature = Creature::new(def.def_name.clone(), alignment, weapon)
            .with_stats(def.stats.clone())
            .with_idle_behavior(def.idle_behavior);
        for power in &def.powers {
            creature = creature.with_power(power.clone());
        }
        Some(creature_spec(creature, def.damageable.clone(), def.conductive))
    }
}
