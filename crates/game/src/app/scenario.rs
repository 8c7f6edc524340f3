use std::path::PathBuf;

use serde::Deserialize;
use tactics_engine::{
    Alignment, BarrelContents, ConfigError, Coord, DefDatabase, Direction, EntityId, EntitySpec,
    FluidKind, ItemKind, SimConfig, SpawnError, World, WorldError, WireOrientation,
};
use tactics_engine::traps::{trap_spec, Trap};
use thiserror::Error;
use tracing::debug;

pub(crate) const DEFAULT_SCENARIO_NAME: &str = "skirmish (embedded)";
pub(crate) const DEFAULT_SCENARIO_JSON: &str = include_str!("../../scenarios/skirmish.json");

const FLUID_PRESSURE: u32 = 3;
const SPIKE_DAMAGE: i32 = 6;

#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid scenario config: {0}")]
    Config(#[from] ConfigError),
    #[error("scenario map must have at least one non-empty row")]
    EmptyMap,
    #[error("map row {row} has {found} tiles, expected {expected}")]
    RaggedMap {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown map glyph '{glyph}' at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: i32, y: i32 },
    #[error("unknown creature def '{def}' at creatures[{index}]")]
    UnknownCreature { def: String, index: usize },
    #[error("invalid seed override '{value}'")]
    InvalidSeed { value: String },
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("failed to place {what}: {source}")]
    Spawn {
        what: String,
        #[source]
        source: SpawnError,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    pub name: String,
    pub ticks: u32,
    #[serde(default)]
    pub config: SimConfig,
    /// One string per row; see [`glyph_spec`] for the legend.
    pub map: Vec<String>,
    #[serde(default)]
    pub creatures: Vec<CreaturePlacement>,
    #[serde(default)]
    pub trip_wires: Vec<TripWirePlacement>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CreaturePlacement {
    pub def: String,
    pub alignment: Alignment,
    pub at: Coord,
    #[serde(default = "default_facing")]
    pub facing: Direction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TripWirePlacement {
    pub center: Coord,
    pub orientation: WireOrientation,
    pub half_length: u32,
    pub damage: i32,
    #[serde(default)]
    pub stun_ticks: u32,
    #[serde(default)]
    pub owner: Option<Alignment>,
}

fn default_facing() -> Direction {
    Direction::S
}

impl Scenario {
    pub(crate) fn from_json_str(raw: &str) -> Result<Self, ScenarioError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let scenario = serde_path_to_error::deserialize::<_, Scenario>(&mut deserializer)
            .map_err(|error| {
                let path = error.path().to_string();
                ScenarioError::Parse {
                    path,
                    source: error.into_inner(),
                }
            })?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Replaces the configured seed with a decimal override.
    pub(crate) fn override_seed(&mut self, raw: &str) -> Result<(), ScenarioError> {
        self.config.seed = raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ScenarioError::InvalidSeed {
                value: raw.to_string(),
            })?;
        Ok(())
    }

    fn dimensions(&self) -> Result<(u32, u32), ScenarioError> {
        let width = self.map.first().map_or(0, |row| row.chars().count());
        if width == 0 {
            return Err(ScenarioError::EmptyMap);
        }
        for (row, line) in self.map.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(ScenarioError::RaggedMap {
                    row,
                    expected: width,
                    found,
                });
            }
        }
        Ok((width as u32, self.map.len() as u32))
    }

    /// Builds the populated world. Returned ids are the creatures in placement order.
    pub(crate) fn build_world(
        &self,
        defs: &DefDatabase,
    ) -> Result<(World, Vec<EntityId>), ScenarioError> {
        let (width, height) = self.dimensions()?;
        let mut world = World::new(width, height, self.config.clone())?;

        for (y, line) in self.map.iter().enumerate() {
            for (x, glyph) in line.chars().enumerate() {
                let at = Coord::new(x as i32, y as i32);
                match glyph_spec(glyph) {
                    Some(Glyph::Floor) => {}
                    Some(Glyph::Entity(spec)) => {
                        spawn(&mut world, *spec, at, &glyph.to_string())?;
                    }
                    Some(Glyph::Fluid(kind)) => {
                        world.spawn_fluid(kind, FLUID_PRESSURE, at);
                    }
                    None => {
                        return Err(ScenarioError::UnknownGlyph {
                            glyph,
                            x: at.x,
                            y: at.y,
                        })
                    }
                }
            }
        }

        for wire in &self.trip_wires {
            let span = world.deploy_trip_wire(
                wire.center,
                wire.orientation,
                wire.half_length,
                wire.owner,
                wire.damage,
                wire.stun_ticks,
            );
            debug!(
                x = wire.center.x,
                y = wire.center.y,
                tiles = span.map_or(0, |span| span.tile_count()),
                "trip_wire_placed"
            );
        }

        let mut creatures = Vec::with_capacity(self.creatures.len());
        for (index, placement) in self.creatures.iter().enumerate() {
            let spec = defs
                .creature_spec(&placement.def, placement.alignment)
                .ok_or_else(|| ScenarioError::UnknownCreature {
                    def: placement.def.clone(),
                    index,
                })?;
            let id = spawn(&mut world, spec, placement.at, &placement.def)?;
            if let Some(creature) = world.creature_mut(id) {
                creature.facing = placement.facing;
            }
            creatures.push(id);
        }
        Ok((world, creatures))
    }
}

fn spawn(
    world: &mut World,
    spec: EntitySpec,
    at: Coord,
    what: &str,
) -> Result<EntityId, ScenarioError> {
    world.spawn(spec, at).map_err(|source| ScenarioError::Spawn {
        what: what.to_string(),
        source,
    })
}

enum Glyph {
    Floor,
    Entity(Box<EntitySpec>),
    Fluid(FluidKind),
}

/// Map legend.
fn glyph_spec(glyph: char) -> Option<Glyph> {
    let spec = match glyph {
        '.' => return Some(Glyph::Floor),
        '~' => return Some(Glyph::Fluid(FluidKind::Water)),
        'L' => return Some(Glyph::Fluid(FluidKind::Lava)),
        '%' => return Some(Glyph::Fluid(FluidKind::Oil)),
        '!' => return Some(Glyph::Fluid(FluidKind::ToxicWaste)),
        '#' => EntitySpec::wall(),
        'O' => EntitySpec::pillar(),
        'C' => EntitySpec::crate_prop(),
        '+' => EntitySpec::door(false),
        '/' => EntitySpec::door(true),
        'x' => EntitySpec::barrel(BarrelContents::Explosive),
        'o' => EntitySpec::barrel(BarrelContents::Oil),
        'w' => EntitySpec::barrel(BarrelContents::Water),
        't' => EntitySpec::barrel(BarrelContents::ToxicWaste),
        '^' => trap_spec(Trap::spikes(SPIKE_DAMAGE)),
        'm' => EntitySpec::item(ItemKind::Medkit),
        'a' => EntitySpec::item(ItemKind::AmmoPack),
        _ => return None,
    };
    Some(Glyph::Entity(Box::new(spec)))
}
