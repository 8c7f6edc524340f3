use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::damage::DamageType;
use crate::events::SimEvent;
use crate::geometry::{Coord, Direction};
use crate::status::{StatusEffect, StatusKind, StatusSource};
use crate::world::{Alignment, EntityBody, EntityId, EntitySpec, Layer, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireOrientation {
    Horizontal,
    Vertical,
}

impl WireOrientation {
    /// The two directions a wire extends from its center.
    pub fn directions(self) -> [Direction; 2] {
        match self {
            Self::Horizontal => [Direction::E, Direction::W],
            Self::Vertical => [Direction::S, Direction::N],
        }
    }

    /// Orientation that crosses a creature's line of travel when it faces `facing`.
    pub fn across(facing: Direction) -> Self {
        match facing {
            Direction::N | Direction::S => Self::Horizontal,
            Direction::E | Direction::W => Self::Vertical,
            Direction::NE | Direction::SE | Direction::SW | Direction::NW => Self::Horizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapKind {
    /// One segment of a wire; every segment shares the id of the center segment.
    TripWire { wire: EntityId },
    Spikes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trap {
    pub kind: TrapKind,
    /// Creatures of this alignment never set the trap off.
    pub owner_alignment: Option<Alignment>,
    pub damage: i32,
    pub stun_ticks: u32,
}

impl Trap {
    pub fn spikes(damage: i32) -> Self {
        Self {
            kind: TrapKind::Spikes,
            owner_alignment: None,
            damage,
            stun_ticks: 0,
        }
    }
}

pub fn trap_spec(trap: Trap) -> EntitySpec {
    let name = match trap.kind {
        TrapKind::TripWire { .. } => "trip wire",
        TrapKind::Spikes => "spike plate",
    };
    EntitySpec::new(name, Layer::Object, EntityBody::Trap(trap))
}

/// Where a wire ended up. Each side lists its tiles outward from the center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripWireSpan {
    pub wire: EntityId,
    pub center: Coord,
    pub sides: [Vec<Coord>; 2],
}

impl TripWireSpan {
    pub fn tile_count(&self) -> usize {
        1 + self.sides[0].len() + self.sides[1].len()
    }
}

impl World {
    /// Lays a wire through `center`, up to `half_length` tiles each way. A side stops
    /// extending before the first tile holding a solid non-creature.
    pub fn deploy_trip_wire(
        &mut self,
        center: Coord,
        orientation: WireOrientation,
        half_length: u32,
        owner_alignment: Option<Alignment>,
        damage: i32,
        stun_ticks: u32,
    ) -> Option<TripWireSpan> {
        if self.tile(center)?.has_non_creature_blocker() {
            return None;
        }
        let mut sides: [Vec<Coord>; 2] = [Vec::new(), Vec::new()];
        for (side, direction) in sides.iter_mut().zip(orientation.directions()) {
            let mut cursor = center;
            for _ in 0..half_length {
                cursor = cursor.step(direction);
                let open = self
                    .tile(cursor)
                    .is_some_and(|tile| !tile.has_non_creature_blocker());
                if !open {
                    break;
                }
                side.push(cursor);
            }
        }

        let placeholder = Trap {
            kind: TrapKind::Spikes,
            owner_alignment,
            damage,
            stun_ticks,
        };
        let wire = self.spawn(trap_spec(placeholder), center).ok()?;
        let segment = Trap {
            kind: TrapKind::TripWire { wire },
            ..placeholder
        };
        if let Some(EntityBody::Trap(trap)) = self.entity_mut(wire).map(|entity| &mut entity.body) {
            *trap = segment;
        }
        for coord in sides.iter().flatten() {
            let _ = self.spawn(trap_spec(segment), *coord);
        }
        debug!(
            wire = wire.0,
            x = center.x,
            y = center.y,
            length = 1 + sides[0].len() + sides[1].len(),
            "trip_wire_deployed"
        );
        Some(TripWireSpan {
            wire,
            center,
            sides,
        })
    }

    /// Entry hook for anything that moved onto `at`, by walking or by being pushed.
    pub(crate) fn on_entered_tile(&mut self, mover: EntityId, at: Coord) {
        if self.creature(mover).is_none() {
            return;
        }
        let traps = self
            .tile(at)
            .map(|tile| tile.traps().to_vec())
            .unwrap_or_default();
        for trap in traps {
            if !self.is_active(mover) {
                break;
            }
            self.trigger_trap(trap, mover);
        }
    }

    fn trigger_trap(&mut self, trap_id: EntityId, victim: EntityId) {
        if !self.is_active(trap_id) {
            return;
        }
        let Some(EntityBody::Trap(trap)) = self.entity(trap_id).map(|entity| entity.body.clone())
        else {
            return;
        };
        let Some(alignment) = self.creature(victim).map(|creature| creature.alignment) else {
            return;
        };
        if trap.owner_alignment == Some(alignment) {
            return;
        }

        debug!(trap = trap_id.0, victim = victim.0, "trap_triggered");
        self.emit(SimEvent::TrapTriggered {
            trap: trap_id,
            victim,
        });
        self.damage_entity(victim, trap.damage, DamageType::Physical);
        if trap.stun_ticks > 0 {
            self.add_status(
                victim,
                StatusEffect::new(
                    StatusKind::Stunned,
                    StatusSource::Entity(trap_id),
                    trap.stun_ticks,
                ),
            );
        }
        if let TrapKind::TripWire { wire } = trap.kind {
            self.remove_wire(wire);
        }
    }

    fn remove_wire(&mut self, wire: EntityId) {
        let segments: Vec<EntityId> = self
            .entity_ids()
            .into_iter()
            .filter(|id| {
                matches!(
                    self.entity(*id).map(|entity| &entity.body),
                    Some(EntityBody::Trap(Trap {
                        kind: TrapKind::TripWire { wire: group },
                        ..
                    })) if *group == wire
                )
            })
            .collect();
        for segment in segments {
            self.mark_for_removal(segment);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::combat::Weapon;
    use crate::config::SimConfig;
    use crate::damage::Damageable;
    use crate::world::{creature_spec, Creature};

    use super::*;

    #[test]
    fn spikes_spare_the_owners_allies() {
        let mut world = World::new(3, 1, SimConfig::default()).expect("world");
        let mut spikes = Trap::spikes(4);
        spikes.owner_alignment = Some(Alignment::WithPlayer);
        world
            .spawn(trap_spec(spikes), Coord::new(1, 0))
            .expect("spikes");
        let ally = world
            .spawn(
                creature_spec(
                    Creature::new("ally", Alignment::WithPlayer, Weapon::fists()),
                    Damageable::new(10),
                    false,
                ),
                Coord::new(0, 0),
            )
            .expect("ally");
        world.update_position(ally, Coord::new(1, 0));
        world.on_entered_tile(ally, Coord::new(1, 0));
        let health = world
            .entity(ally)
            .and_then(|entity| entity.damageable.as_ref())
            .map(|damageable| damageable.health);
        assert_eq!(health, Some(10));
    }

    #[test]
    fn wire_across_facing_is_perpendicular() {
        assert_eq!(WireOrientation::across(Direction::N), WireOrientation::Horizontal);
        assert_eq!(WireOrientation::across(Direction::W), WireOrientation::Vertical);
    }
}
