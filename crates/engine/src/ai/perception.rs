use tracing::trace;

use crate::geometry::{angle_between, angle_difference, distance, line_between, Coord};
use crate::world::{AiState, EntityId, World};

impl World {
    /// Range, facing cone, and line of sight from `viewer` to `target`.
    pub fn can_see(&self, viewer: EntityId, target: Coord) -> bool {
        let Some(entity) = self.entity(viewer) else {
            return false;
        };
        let Some(creature) = entity.creature() else {
            return false;
        };
        let origin = entity.position();
        if origin == target {
            return true;
        }
        if distance(origin, target) > creature.stats.view_range {
            return false;
        }
        if creature.stats.view_angle_degrees < 360.0 {
            let offset = angle_difference(
                creature.facing.angle_degrees(),
                angle_between(origin, target),
            );
            if offset > creature.stats.view_angle_degrees / 2.0 {
                return false;
            }
        }
        self.has_line_of_sight(origin, target)
    }

    /// True when nothing solid stands strictly between the endpoints.
    pub fn has_clear_shot(&self, from: Coord, to: Coord) -> bool {
        if !self.has_line_of_sight(from, to) {
            return false;
        }
        let line = line_between(from, to);
        let inner = line.len().saturating_sub(1);
        line.iter()
            .take(inner)
            .skip(1)
            .all(|coord| self.tile(*coord).is_some_and(|tile| !tile.has_non_creature_blocker()))
    }

    fn compute_visible_enemies(&self, viewer: EntityId) -> Vec<EntityId> {
        let Some(alignment) = self.creature(viewer).map(|creature| creature.alignment) else {
            return Vec::new();
        };
        self.entity_ids()
            .into_iter()
            .filter(|id| *id != viewer && self.is_active(*id))
            .filter(|id| {
                self.creature(*id)
                    .is_some_and(|other| other.alignment.opposes(alignment))
            })
            .filter(|id| {
                self.entity(*id)
                    .is_some_and(|other| self.can_see(viewer, other.position()))
            })
            .collect()
    }

    /// Opposing creatures the viewer can see. Memoized until the viewer next ticks, moves, or
    /// turns.
    pub fn visible_enemies(&mut self, viewer: EntityId) -> Vec<EntityId> {
        if let Some(cached) = self
            .creature(viewer)
            .and_then(|creature| creature.perception.visible_enemies.clone())
        {
            return cached;
        }
        let visible = self.compute_visible_enemies(viewer);
        trace!(viewer = viewer.0, count = visible.len(), "visible_enemies_computed");
        if let Some(creature) = self.creature_mut(viewer) {
            creature.perception.visible_enemies = Some(visible.clone());
        }
        visible
    }

    /// Visible enemies within weapon range with a clear shot. Memoized until the viewer acts.
    pub fn attackable_enemies(&mut self, viewer: EntityId) -> Vec<EntityId> {
        if let Some(cached) = self
            .creature(viewer)
            .and_then(|creature| creature.perception.attackable_enemies.clone())
        {
            return cached;
        }
        let visible = self.visible_enemies(viewer);
        let Some(entity) = self.entity(viewer) else {
            return Vec::new();
        };
        let origin = entity.position();
        let range = entity
            .creature()
            .map_or(0.0, |creature| creature.weapon.range);
        let attackable: Vec<EntityId> = visible
            .into_iter()
            .filter(|id| {
                self.entity(*id).is_some_and(|target| {
                    let at = target.position();
                    distance(origin, at) <= range && self.has_clear_shot(origin, at)
                })
            })
            .collect();
        if let Some(creature) = self.creature_mut(viewer) {
            creature.perception.attackable_enemies = Some(attackable.clone());
        }
        attackable
    }

    /// Closest of `candidates` to `from`; ties go to the lower id.
    pub(crate) fn nearest_of(
        &self,
        from: Coord,
        candidates: &[EntityId],
    ) -> Option<(EntityId, Coord)> {
        candidates
            .iter()
            .filter_map(|id| self.entity(*id).map(|entity| (*id, entity.position())))
            .min_by(|(a_id, a_at), (b_id, b_at)| {
                distance(from, *a_at)
                    .total_cmp(&distance(from, *b_at))
                    .then(a_id.cmp(b_id))
            })
    }

    /// Re-reads perception after a move or turn and remembers where the nearest enemy stands.
    pub(crate) fn refresh_enemy_memory(&mut self, viewer: EntityId) {
        let visible = self.visible_enemies(viewer);
        let Some(origin) = self.entity(viewer).map(|entity| entity.position()) else {
            return;
        };
        if let Some((_, at)) = self.nearest_of(origin, &visible) {
            if let Some(creature) = self.creature_mut(viewer) {
                creature.ai.last_known_enemy = Some(at);
            }
        }
    }

    /// Called when `target` is attacked from `origin`. A creature not already engaging goes
    /// to look for the shooter.
    pub(crate) fn alert_to_attacker(&mut self, target: EntityId, origin: Coord) {
        let Some(creature) = self.creature_mut(target) else {
            return;
        };
        if creature.ai.state == AiState::Engaging {
            return;
        }
        creature.ai.last_known_enemy = Some(origin);
        if creature.ai.state == AiState::Idle {
            creature.ai.state = AiState::Searching;
            creature.ai.searching_ticks = 0;
        }
    }
}
