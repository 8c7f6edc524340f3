use std::process::ExitCode;

use tactics_engine::{Alignment, Coord, DefDatabase, EntityId, SimEvent, World};
use tracing::{debug, error, info};

use super::bootstrap::AppWiring;
use super::scenario::{Scenario, ScenarioError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    PlayerSideWon,
    PlayerSideLost,
    /// Both sides were wiped out in the same tick.
    Annihilation,
    TickLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CreatureSummary {
    pub id: EntityId,
    pub species: String,
    pub position: Coord,
    pub health: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScenarioReport {
    pub outcome: Outcome,
    pub ticks_run: u32,
    pub events_seen: usize,
    pub survivors: Vec<CreatureSummary>,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_scenario(&app.scenario, &app.defs) {
        Ok(report) => {
            info!(
                scenario = %app.scenario_name,
                outcome = ?report.outcome,
                ticks = report.ticks_run,
                events = report.events_seen,
                survivors = report.survivors.len(),
                "scenario_finished"
            );
            for survivor in &report.survivors {
                info!(
                    id = survivor.id.0,
                    species = %survivor.species,
                    x = survivor.position.x,
                    y = survivor.position.y,
                    health = survivor.health,
                    "survivor"
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "scenario_failed");
            ExitCode::FAILURE
        }
    }
}

/// Builds the world and ticks it until one side is gone or `scenario.ticks` have run.
pub(crate) fn run_scenario(
    scenario: &Scenario,
    defs: &DefDatabase,
) -> Result<ScenarioReport, ScenarioError> {
    let (mut world, _) = scenario.build_world(defs)?;
    info!(
        name = %scenario.name,
        width = world.width(),
        height = world.height(),
        entities = world.entity_count(),
        "scenario_started"
    );

    let mut events_seen = 0usize;
    let mut outcome = side_outcome(&world);
    let mut ticks_run = 0u32;
    while outcome.is_none() && ticks_run < scenario.ticks {
        world.tick();
        ticks_run += 1;
        let events = world.drain_events();
        events_seen += events.len();
        for event in &events {
            log_event(world.tick_count(), event);
        }
        outcome = side_outcome(&world);
    }

    Ok(ScenarioReport {
        outcome: outcome.unwrap_or(Outcome::TickLimit),
        ticks_run,
        events_seen,
        survivors: survivors(&world),
    })
}

fn side_outcome(world: &World) -> Option<Outcome> {
    let allies = world.creatures_with_alignment(Alignment::WithPlayer).len();
    let enemies = world.creatures_with_alignment(Alignment::AgainstPlayer).len();
    match (allies, enemies) {
        (0, 0) => Some(Outcome::Annihilation),
        (0, _) => Some(Outcome::PlayerSideLost),
        (_, 0) => Some(Outcome::PlayerSideWon),
        _ => None,
    }
}

fn survivors(world: &World) -> Vec<CreatureSummary> {
    world
        .entity_ids()
        .into_iter()
        .filter(|id| world.is_active(*id))
        .filter_map(|id| {
            let entity = world.entity(id)?;
            let creature = entity.creature()?;
            Some(CreatureSummary {
                id,
                species: creature.species.clone(),
                position: entity.position(),
                health: entity.damageable.as_ref().map_or(0, |damageable| damageable.health),
            })
        })
        .collect()
}

fn log_event(tick: u64, event: &SimEvent) {
    match *event {
        SimEvent::DamageFlash {
            entity,
            amount,
            damage_type,
        } => debug!(
            tick,
            entity = entity.0,
            amount,
            damage_type = damage_type.as_token(),
            "damaged"
        ),
        SimEvent::Died { entity } => debug!(tick, entity = entity.0, "died"),
        SimEvent::Destroyed { entity } => debug!(tick, entity = entity.0, "destroyed"),
        SimEvent::Explosion { center, radius } => {
            debug!(tick, x = center.x, y = center.y, radius, "explosion")
        }
        SimEvent::PowerActivated {
            owner,
            power,
            target,
        } => debug!(
            tick,
            owner = owner.0,
            power = power.as_token(),
            power_target = ?target,
            "power_used"
        ),
        other => debug!(tick, event = ?other, "sim_event"),
    }
}
