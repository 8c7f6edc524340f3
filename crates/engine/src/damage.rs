use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DamageType {
    Physical,
    Heat,
    Cold,
    Electric,
    Poison,
    Radiation,
}

impl DamageType {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Physical => "Physical",
            Self::Heat => "Heat",
            Self::Cold => "Cold",
            Self::Electric => "Electric",
            Self::Poison => "Poison",
            Self::Radiation => "Radiation",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Physical" => Some(Self::Physical),
            "Heat" => Some(Self::Heat),
            "Cold" => Some(Self::Cold),
            "Electric" => Some(Self::Electric),
            "Poison" => Some(Self::Poison),
            "Radiation" => Some(Self::Radiation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resistance {
    Immune,
    Resistant,
    #[default]
    None,
    Vulnerable,
    VeryVulnerable,
}

impl Resistance {
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Immune => 0.0,
            Self::Resistant => 0.5,
            Self::None => 1.0,
            Self::Vulnerable => 1.5,
            Self::VeryVulnerable => 2.0,
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Immune" => Some(Self::Immune),
            "Resistant" => Some(Self::Resistant),
            "None" => Some(Self::None),
            "Vulnerable" => Some(Self::Vulnerable),
            "VeryVulnerable" => Some(Self::VeryVulnerable),
            _ => None,
        }
    }
}

/// Per-damage-type resistances; missing entries mean `Resistance::None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resistances {
    by_type: BTreeMap<DamageType, Resistance>,
}

impl Resistances {
    #[must_use]
    pub fn with(mut self, damage_type: DamageType, resistance: Resistance) -> Self {
        self.set(damage_type, resistance);
        self
    }

    pub fn set(&mut self, damage_type: DamageType, resistance: Resistance) {
        if resistance == Resistance::None {
            self.by_type.remove(&damage_type);
        } else {
            self.by_type.insert(damage_type, resistance);
        }
    }

    pub fn get(&self, damage_type: DamageType) -> Resistance {
        self.by_type
            .get(&damage_type)
            .copied()
            .unwrap_or_default()
    }
}

/// Capability of anything that can take damage. Creatures, walls, crates, and barrels carry one.
#[derive(Debug, Clone, PartialEq)]
pub struct Damageable {
    pub health: i32,
    pub max_health: i32,
    pub is_currently_damageable: bool,
    /// Hit-chance factor in `(0, 1]`; `None` means every targeted attack hits.
    pub evasion: Option<f64>,
    /// Penetration budget a hit through this entity consumes; zero lets bullets pass freely.
    pub penetration_block: i32,
    /// Flat reduction applied to physical damage after resistance.
    pub armor: i32,
    pub resistances: Resistances,
}

impl Damageable {
    pub fn new(max_health: i32) -> Self {
        let max_health = max_health.max(1);
        Self {
            health: max_health,
            max_health,
            is_currently_damageable: true,
            evasion: None,
            penetration_block: 1,
            armor: 0,
            resistances: Resistances::default(),
        }
    }

    #[must_use]
    pub fn with_evasion(mut self, evasion: f64) -> Self {
        self.evasion = Some(evasion.clamp(0.0, 1.0));
        self
    }

    #[must_use]
    pub fn with_penetration_block(mut self, penetration_block: i32) -> Self {
        self.penetration_block = penetration_block.max(0);
        self
    }

    #[must_use]
    pub fn with_armor(mut self, armor: i32) -> Self {
        self.armor = armor.max(0);
        self
    }

    #[must_use]
    pub fn with_resistances(mut self, resistances: Resistances) -> Self {
        self.resistances = resistances;
        self
    }

    /// Damage left after the resistance multiplier and, for physical damage, flat armor.
    pub fn mitigated_amount(&self, amount: i32, damage_type: DamageType) -> i32 {
        let multiplier = self.resistances.get(damage_type).multiplier();
        let scaled = (amount as f64 * multiplier).floor() as i32;
        if damage_type == DamageType::Physical {
            scaled - self.armor
        } else {
            scaled
        }
    }

    /// Subtracts already-mitigated damage and reports whether health just reached zero.
    pub(crate) fn subtract_health(&mut self, amount: i32) -> HealthChange {
        let before = self.health;
        self.health = (self.health - amount).clamp(0, self.max_health);
        HealthChange {
            applied: before - self.health,
            reached_zero: before > 0 && self.health == 0,
        }
    }

    pub(crate) fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0 || self.health == 0 {
            return 0;
        }
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health);
        self.health - before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HealthChange {
    pub(crate) applied: i32,
    pub(crate) reached_zero: bool,
}
