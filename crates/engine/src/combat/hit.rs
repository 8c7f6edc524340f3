use crate::geometry::{angle_between, cover_sides, Coord, Direction};
use crate::rng::SimRng;
use crate::world::World;

/// Where an attack lands relative to the target's facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flank {
    Front,
    Side,
    Back,
}

impl Flank {
    pub fn bonus_multiplier(self) -> i32 {
        match self {
            Self::Front => 0,
            Self::Side => 1,
            Self::Back => 2,
        }
    }
}

pub fn flank_of(target: Coord, target_facing: Direction, attacker: Coord) -> Flank {
    if target == attacker {
        return Flank::Front;
    }
    let from_target = Direction::from_angle_degrees(angle_between(target, attacker));
    if from_target == target_facing.opposite() {
        Flank::Back
    } else if from_target == target_facing.rotated(2) || from_target == target_facing.rotated(-2) {
        Flank::Side
    } else {
        Flank::Front
    }
}

/// Probability of a hit outside the fumble branch.
pub fn hit_chance(
    accuracy_multiplier: f64,
    weapon_accuracy: f64,
    evasion: Option<f64>,
    cover_multiplier: f64,
) -> f64 {
    match evasion {
        None => 1.0,
        Some(evasion) => {
            (accuracy_multiplier * weapon_accuracy * evasion * cover_multiplier).clamp(0.0, 1.0)
        }
    }
}

/// Full hit roll. Evasion-less targets are always hit and full cover always protects; in
/// between, a fumble degrades the roll to a coin flip.
pub fn roll_hit(rng: &mut SimRng, fumble_chance: f64, chance: f64, evasion: Option<f64>) -> bool {
    if evasion.is_none() {
        return true;
    }
    if chance <= 0.0 {
        return false;
    }
    if rng.chance(fumble_chance) {
        return rng.coin_flip();
    }
    rng.unit() < chance
}

impl World {
    /// Most protective cover between `target` and a shot coming from `attacker`. Exact
    /// diagonals consult both sides and keep the smaller multiplier.
    pub fn cover_multiplier(&self, attacker: Coord, target: Coord) -> f64 {
        if attacker == target {
            return 1.0;
        }
        cover_sides(angle_between(target, attacker))
            .into_iter()
            .map(|side| {
                let beside = target.step(side.direction());
                if beside == attacker {
                    return 1.0;
                }
                self.tile(beside)
                    .map(|tile| tile.cover().multiplier())
                    .unwrap_or(1.0)
            })
            .fold(1.0, f64::min)
    }
}
