use serde::{Deserialize, Serialize};

use crate::damage::DamageType;
use crate::status::StatusKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    Melee,
    /// Single line of fire with a penetration budget.
    Gun,
    /// Cone of fire that hits everything in the window, ignoring penetration.
    Spread,
}

impl WeaponKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "melee" => Some(Self::Melee),
            "gun" => Some(Self::Gun),
            "spread" => Some(Self::Spread),
            _ => None,
        }
    }
}

/// Status a weapon attaches to every creature it hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnHitStatus {
    pub kind: StatusKind,
    pub duration: u32,
    pub magnitude: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    pub name: String,
    pub kind: WeaponKind,
    pub damage: i32,
    pub damage_type: DamageType,
    pub accuracy: f64,
    pub range: f64,
    pub penetration: i32,
    /// Full cone width for spread weapons.
    pub spread_degrees: f64,
    pub flanking_bonus: i32,
    /// Tiles a hit creature is pushed.
    pub knockback: u32,
    pub attack_time_multiplier: f64,
    /// Zero for weapons that never reload.
    pub clip_size: u32,
    pub ammo: u32,
    pub on_hit: Option<OnHitStatus>,
}

impl Weapon {
    pub fn new(name: impl Into<String>, kind: WeaponKind, damage: i32) -> Self {
        Self {
            name: name.into(),
            kind,
            damage,
            damage_type: DamageType::Physical,
            accuracy: 1.0,
            range: if kind == WeaponKind::Melee { 1.5 } else { 8.0 },
            penetration: 0,
            spread_degrees: 0.0,
            flanking_bonus: 0,
            knockback: 0,
            attack_time_multiplier: 1.0,
            clip_size: 0,
            ammo: 0,
            on_hit: None,
        }
    }

    pub fn fists() -> Self {
        Self::new("fists", WeaponKind::Melee, 3).with_flanking_bonus(2)
    }

    #[must_use]
    pub fn with_damage_type(mut self, damage_type: DamageType) -> Self {
        self.damage_type = damage_type;
        self
    }

    #[must_use]
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    #[must_use]
    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }

    #[must_use]
    pub fn with_penetration(mut self, penetration: i32) -> Self {
        self.penetration = penetration;
        self
    }

    #[must_use]
    pub fn with_spread(mut self, spread_degrees: f64) -> Self {
        self.spread_degrees = spread_degrees;
        self
    }

    #[must_use]
    pub fn with_flanking_bonus(mut self, flanking_bonus: i32) -> Self {
        self.flanking_bonus = flanking_bonus;
        self
    }

    #[must_use]
    pub fn with_knockback(mut self, knockback: u32) -> Self {
        self.knockback = knockback;
        self
    }

    #[must_use]
    pub fn with_attack_time_multiplier(mut self, multiplier: f64) -> Self {
        self.attack_time_multiplier = multiplier;
        self
    }

    /// Gives the weapon a clip and fills it.
    #[must_use]
    pub fn with_clip(mut self, clip_size: u32) -> Self {
        self.clip_size = clip_size;
        self.ammo = clip_size;
        self
    }

    #[must_use]
    pub fn with_on_hit(mut self, on_hit: OnHitStatus) -> Self {
        self.on_hit = Some(on_hit);
        self
    }

    pub fn is_ranged(&self) -> bool {
        self.kind != WeaponKind::Melee
    }

    pub fn uses_ammo(&self) -> bool {
        self.clip_size > 0
    }

    pub fn needs_reload(&self) -> bool {
        self.uses_ammo() && self.ammo == 0
    }

    pub fn can_reload(&self) -> bool {
        self.uses_ammo() && self.ammo < self.clip_size
    }

    /// Action-point cost of one attack for a creature with the given base attack time.
    pub fn attack_cost(&self, attack_time: u32) -> u32 {
        (f64::from(attack_time) * self.attack_time_multiplier)
            .round()
            .max(0.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_cost_rounds_scaled_time() {
        let shotgun =
            Weapon::new("shotgun", WeaponKind::Spread, 6).with_attack_time_multiplier(1.5);
        assert_eq!(shotgun.attack_cost(3), 5);
        assert_eq!(Weapon::fists().attack_cost(2), 2);
    }

    #[test]
    fn empty_clip_needs_reload_but_fists_never_do() {
        let mut pistol = Weapon::new("pistol", WeaponKind::Gun, 5).with_clip(6);
        assert!(!pistol.needs_reload());
        assert!(!pistol.can_reload());
        pistol.ammo = 0;
        assert!(pistol.needs_reload());
        assert!(!Weapon::fists().needs_reload());
        assert!(!Weapon::fists().can_reload());
    }
}
