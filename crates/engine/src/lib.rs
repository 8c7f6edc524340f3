//! Turn-based tactical simulation core: a tile grid of entities with combat, perception-driven
//! AI, pathfinding, fluid and gas automata, status effects, powers, and electrical conduction.
//!
//! Everything runs on one thread. A [`World`] owns all state and advances one tick at a time
//! through [`World::tick`]; outside layers drive creatures with [`World::execute`] and read the
//! [`SimEvent`] stream for presentation.

mod ai;
pub mod combat;
mod commands;
pub mod config;
pub mod content;
pub mod damage;
mod electricity;
pub mod events;
mod fire;
pub mod fluid;
pub mod geometry;
mod hazards;
pub mod pathfinding;
pub mod powers;
pub mod rng;
pub mod status;
mod systems;
pub mod traps;
pub mod world;

pub use combat::{AttackReport, Flank, OnHitStatus, Weapon, WeaponKind};
pub use commands::{Command, CommandOutcome, CommandRejection};
pub use config::{ConfigError, SimConfig};
pub use content::{
    compile_base_defs, compile_def_dirs, compile_defs_str, ContentCompileError, ContentErrorCode,
    CreatureDef, DefDatabase, DefId, SourceLocation, WeaponDef,
};
pub use damage::{DamageType, Damageable, Resistance, Resistances};
pub use events::{SimEvent, SimEventBus, SimEventCounts, SimEventKind};
pub use fluid::{FluidKind, GasKind};
pub use geometry::{Coord, Direction};
pub use hazards::{BARREL_EXPLOSION_DAMAGE, BARREL_EXPLOSION_RADIUS, BARREL_SPILL_PRESSURE};
pub use pathfinding::CostGrid;
pub use powers::{Power, PowerKind, PowerLevel};
pub use rng::SimRng;
pub use status::{StatusEffect, StatusKind, StatusSource};
pub use systems::{SimSystemId, SimSystemsHost, SIM_SYSTEM_ORDER};
pub use traps::{Trap, TrapKind, TripWireSpan, WireOrientation};
pub use world::{
    AiState, Alignment, BarrelContents, Controller, Creature, CreatureStats, Entity, EntityId,
    EntitySpec, IdleBehavior, ItemKind, SpawnError, World, WorldError,
};
