//! Attack resolution shared by melee, guns, and spread weapons: hit roll, cover, penetration,
//! resistance, flanking, and knockback, in that order.

mod hit;
mod knockback;
mod resolve;
mod weapon;

pub use hit::{flank_of, hit_chance, roll_hit, Flank};
pub use resolve::AttackReport;
pub use weapon::{OnHitStatus, Weapon, WeaponKind};
