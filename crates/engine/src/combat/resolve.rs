use std::cmp::Ordering;

use tracing::debug;

use crate::events::SimEvent;
use crate::geometry::{
    angle_between, angle_difference, cartesian_to_polar, distance, polar_to_cartesian, Coord,
    Direction, PolarCoord,
};
use crate::status::{StatusEffect, StatusSource};
use crate::world::{EntityId, World};

use super::hit::{flank_of, hit_chance, roll_hit};
use super::weapon::{Weapon, WeaponKind};

/// Outcome of one attack action, in resolution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttackReport {
    pub hits: Vec<EntityId>,
    pub misses: Vec<EntityId>,
    /// Sum of `penetration_block` over every target hit by a penetrating shot.
    pub penetration_spent: i32,
}

impl AttackReport {
    pub fn had_targets(&self) -> bool {
        !self.hits.is_empty() || !self.misses.is_empty()
    }
}

/// Attacker state captured once so resolution does not hold a borrow on the world.
#[derive(Debug, Clone)]
struct Shooter {
    id: EntityId,
    origin: Coord,
    accuracy_multiplier: f64,
    weapon: Weapon,
}

impl Shooter {
    /// Where an attack with no targets visibly ends. A spread volley carries to the edge of
    /// its reach along the heading.
    fn miss_endpoint(&self, aim: Coord) -> Coord {
        if self.weapon.kind != WeaponKind::Spread || aim == self.origin {
            return aim;
        }
        polar_to_cartesian(
            self.origin,
            PolarCoord {
                angle_degrees: angle_between(self.origin, aim),
                radius: self.weapon.range,
            },
        )
    }
}

impl World {
    /// Runs the attack pipeline from `attacker` toward `aim`, then charges ammunition and the
    /// action cost. Feasibility (range, ammunition, action points) is checked by the caller.
    pub(crate) fn resolve_attack(&mut self, attacker: EntityId, aim: Coord) -> AttackReport {
        let mut report = AttackReport::default();
        let Some(entity) = self.entity(attacker) else {
            return report;
        };
        let Some(creature) = entity.creature() else {
            return report;
        };
        let shooter = Shooter {
            id: attacker,
            origin: entity.position(),
            accuracy_multiplier: creature.stats.accuracy_multiplier,
            weapon: creature.weapon.clone(),
        };
        let attack_time = creature.stats.attack_time;

        match shooter.weapon.kind {
            WeaponKind::Melee => {
                for target in self.damageables_at(aim) {
                    if target != attacker {
                        self.strike(&shooter, target, &mut report);
                    }
                }
            }
            WeaponKind::Gun => self.fire_penetrating(&shooter, aim, &mut report),
            WeaponKind::Spread => self.fire_spread(&shooter, aim, &mut report),
        }

        if !report.had_targets() {
            self.emit(SimEvent::Miss {
                from: shooter.origin,
                to: shooter.miss_endpoint(aim),
            });
        }
        debug!(
            attacker = attacker.0,
            weapon = %shooter.weapon.name,
            hits = report.hits.len(),
            misses = report.misses.len(),
            "attack_resolved"
        );

        let cost = shooter.weapon.attack_cost(attack_time);
        if let Some(creature) = self.creature_mut(attacker) {
            if creature.weapon.uses_ammo() {
                creature.weapon.ammo = creature.weapon.ammo.saturating_sub(1);
            }
            if aim != shooter.origin {
                creature.face(Direction::from_angle_degrees(angle_between(
                    shooter.origin,
                    aim,
                )));
            }
            creature.spend_action(cost);
        }
        self.refresh_enemy_memory(attacker);
        report
    }

    /// Walks the line of fire, hitting damageables in distance order until the penetration
    /// budget goes negative or a solid non-damageable stops the round.
    fn fire_penetrating(&mut self, shooter: &Shooter, aim: Coord, report: &mut AttackReport) {
        let mut budget = shooter.weapon.penetration;
        let mut last_reached = shooter.origin;
        let line = self.line_between(shooter.origin, aim);

        'line: for coord in line.into_iter().skip(1) {
            if distance(shooter.origin, coord) > shooter.weapon.range {
                break;
            }
            last_reached = coord;
            let targets: Vec<EntityId> = self
                .damageables_at(coord)
                .into_iter()
                .filter(|target| *target != shooter.id)
                .collect();
            let solid = self
                .tile(coord)
                .is_some_and(|tile| tile.has_non_creature_blocker());
            if targets.is_empty() && solid {
                break;
            }
            for target in targets {
                let block = self
                    .entity(target)
                    .and_then(|entity| entity.damageable.as_ref())
                    .map_or(0, |damageable| damageable.penetration_block);
                if !self.strike(shooter, target, report) {
                    continue;
                }
                report.penetration_spent += block;
                budget -= block;
                if budget < 0 {
                    break 'line;
                }
            }
        }

        if last_reached != shooter.origin {
            self.emit(SimEvent::Projectile {
                from: shooter.origin,
                to: last_reached,
            });
        }
    }

    /// Hits every visible damageable inside the cone, nearest first.
    fn fire_spread(&mut self, shooter: &Shooter, aim: Coord, report: &mut AttackReport) {
        let heading = angle_between(shooter.origin, aim);
        let half_window = shooter.weapon.spread_degrees / 2.0;
        let mut targets: Vec<(f64, EntityId)> = self
            .damageables_within(shooter.origin, shooter.weapon.range)
            .into_iter()
            .filter(|target| *target != shooter.id)
            .filter_map(|target| {
                let at = self.entity(target)?.position();
                if at == shooter.origin {
                    return None;
                }
                let polar = cartesian_to_polar(shooter.origin, at);
                let inside = angle_difference(polar.angle_degrees, heading) <= half_window + 1e-9;
                (inside && self.has_line_of_sight(shooter.origin, at))
                    .then_some((polar.radius, target))
            })
            .collect();
        targets.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        for (_, target) in targets {
            if let Some(at) = self.entity(target).map(|entity| entity.position()) {
                self.emit(SimEvent::Projectile {
                    from: shooter.origin,
                    to: at,
                });
            }
            self.strike(shooter, target, report);
        }
    }

    /// Hit roll, damage with flanking, and knockback against one target. True on a hit.
    fn strike(&mut self, shooter: &Shooter, target: EntityId, report: &mut AttackReport) -> bool {
        let Some(entity) = self.entity(target) else {
            return false;
        };
        let target_at = entity.position();
        let evasion = entity
            .damageable
            .as_ref()
            .and_then(|damageable| damageable.evasion);
        let target_facing = entity.creature().map(|creature| creature.facing);

        let cover = self.cover_multiplier(shooter.origin, target_at);
        let chance = hit_chance(
            shooter.accuracy_multiplier,
            shooter.weapon.accuracy,
            evasion,
            cover,
        );
        let fumble_chance = self.config().fumble_chance;
        let hit = roll_hit(self.rng_mut(), fumble_chance, chance, evasion);
        self.alert_to_attacker(target, shooter.origin);
        if !hit {
            self.emit(SimEvent::Miss {
                from: shooter.origin,
                to: target_at,
            });
            report.misses.push(target);
            return false;
        }

        let mut amount = shooter.weapon.damage;
        if let Some(facing) = target_facing {
            if shooter.weapon.flanking_bonus > 0 {
                let flank = flank_of(target_at, facing, shooter.origin);
                amount += shooter.weapon.flanking_bonus * flank.bonus_multiplier();
            }
        }
        self.damage_entity(target, amount, shooter.weapon.damage_type);
        report.hits.push(target);
        if let Some(on_hit) = shooter.weapon.on_hit {
            self.add_status(
                target,
                StatusEffect::new(on_hit.kind, StatusSource::Entity(shooter.id), on_hit.duration)
                    .with_magnitude(on_hit.magnitude),
            );
        }

        if target_facing.is_some() && shooter.weapon.knockback > 0 && self.is_active(target) {
            self.knockback(target, shooter.origin, shooter.weapon.knockback, amount);
        }
        true
    }

    /// Refills the clip. Rejected for weapons without a clip or with a full one.
    pub(crate) fn reload_weapon(&mut self, id: EntityId) -> bool {
        let Some(creature) = self.creature_mut(id) else {
            return false;
        };
        if !creature.weapon.can_reload() {
            return false;
        }
        creature.weapon.ammo = creature.weapon.clip_size;
        let cost = creature.stats.reload_time;
        creature.spend_action(cost);
        debug!(entity = id.0, "weapon_reloaded");
        self.emit(SimEvent::Reloaded { entity: id });
        true
    }
}
