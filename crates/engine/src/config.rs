use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SEED: u64 = 0x5eed_7ac7_1c5;

/// Tuning constants for one simulation. Every field has a default, so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub seed: u64,
    /// Allows eight-way movement and the diagonal A* heuristic.
    pub diagonal_movement: bool,
    /// Probability that a hit roll degrades to a coin flip.
    pub fumble_chance: f64,
    /// Share of the original damage dealt when a knockback is stopped.
    pub knockback_impact_fraction: f64,
    /// Ticks a creature keeps searching an empty last-known position before going idle.
    pub search_memory_ticks: u32,
    pub gas_depletion_per_tick: u32,
    /// Pressure at which expansion becomes certain.
    pub expansion_pressure_scale: u32,
    pub toxic_irradiate_chance: f64,
    pub toxic_rads_per_exposure: u32,
    pub rads_decay_per_tick: u32,
    pub radiation_sickness_threshold: u32,
    pub radiation_damage_per_tick: i32,
    pub burn_damage_per_tick: i32,
    pub burn_smoke_chance: f64,
    pub smoke_pressure: u32,
    pub steam_pressure: u32,
    pub lava_heat_damage: i32,
    pub steam_scald_damage: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            diagonal_movement: true,
            fumble_chance: 0.1,
            knockback_impact_fraction: 0.25,
            search_memory_ticks: 12,
            gas_depletion_per_tick: 1,
            expansion_pressure_scale: 10,
            toxic_irradiate_chance: 0.3,
            toxic_rads_per_exposure: 5,
            rads_decay_per_tick: 1,
            radiation_sickness_threshold: 50,
            radiation_damage_per_tick: 1,
            burn_damage_per_tick: 3,
            burn_smoke_chance: 0.2,
            smoke_pressure: 4,
            steam_pressure: 5,
            lava_heat_damage: 20,
            steam_scald_damage: 2,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse simulation config: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("invalid simulation config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl SimConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("fumble_chance", self.fumble_chance),
            ("knockback_impact_fraction", self.knockback_impact_fraction),
            ("toxic_irradiate_chance", self.toxic_irradiate_chance),
            ("burn_smoke_chance", self.burn_smoke_chance),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be within [0, 1]",
                });
            }
        }
        if self.expansion_pressure_scale == 0 {
            return Err(ConfigError::Invalid {
                field: "expansion_pressure_scale",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}
