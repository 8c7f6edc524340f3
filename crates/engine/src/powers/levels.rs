//! Per-level tuning for every power. These are hand-tuned tables, not formulas.

use super::PowerKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLevel {
    /// Maximum distance to the resolved target; unused by self-directed powers.
    pub range: f64,
    pub cooldown: u32,
    /// Damage, heal per tick, pressure, or impact, depending on the power.
    pub magnitude: i32,
    /// Radius, knockback distance, wire half-length, or duration, depending on the power.
    pub area: u32,
}

const fn level(range: f64, cooldown: u32, magnitude: i32, area: u32) -> PowerLevel {
    PowerLevel {
        range,
        cooldown,
        magnitude,
        area,
    }
}

const FIREBALL: [PowerLevel; 3] = [
    level(6.0, 8, 12, 1),
    level(7.0, 7, 16, 1),
    level(8.0, 6, 20, 2),
];

const LIGHTNING: [PowerLevel; 3] = [
    level(5.0, 6, 10, 0),
    level(6.0, 5, 14, 0),
    level(8.0, 5, 18, 0),
];

const BLINK: [PowerLevel; 3] = [
    level(4.0, 10, 0, 0),
    level(6.0, 8, 0, 0),
    level(8.0, 6, 0, 0),
];

const FORCE_PUSH: [PowerLevel; 3] = [
    level(3.0, 5, 8, 2),
    level(4.0, 5, 12, 3),
    level(5.0, 4, 16, 4),
];

const FLOOD: [PowerLevel; 2] = [level(5.0, 12, 4, 0), level(7.0, 10, 7, 0)];

const TRIP_WIRE: [PowerLevel; 3] = [
    level(3.0, 10, 6, 1),
    level(4.0, 9, 8, 2),
    level(5.0, 8, 10, 3),
];

const REGENERATE: [PowerLevel; 3] = [
    level(0.0, 20, 2, 5),
    level(0.0, 18, 3, 6),
    level(0.0, 15, 4, 8),
];

const SMOKE_SCREEN: [PowerLevel; 2] = [level(0.0, 12, 3, 1), level(0.0, 10, 5, 2)];

pub fn level_table(kind: PowerKind) -> &'static [PowerLevel] {
    match kind {
        PowerKind::Fireball => &FIREBALL,
        PowerKind::Lightning => &LIGHTNING,
        PowerKind::Blink => &BLINK,
        PowerKind::ForcePush => &FORCE_PUSH,
        PowerKind::Flood => &FLOOD,
        PowerKind::TripWire => &TRIP_WIRE,
        PowerKind::Regenerate => &REGENERATE,
        PowerKind::SmokeScreen => &SMOKE_SCREEN,
    }
}
