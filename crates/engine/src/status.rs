use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::damage::DamageType;
use crate::events::SimEvent;
use crate::world::{EntityId, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Burning,
    Stunned,
    Slowed,
    Poisoned,
    Regenerating,
    Shielded,
}

impl StatusKind {
    pub const ALL: [StatusKind; 6] = [
        StatusKind::Burning,
        StatusKind::Stunned,
        StatusKind::Slowed,
        StatusKind::Poisoned,
        StatusKind::Regenerating,
        StatusKind::Shielded,
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == token)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Burning => "burning",
            Self::Stunned => "stunned",
            Self::Slowed => "slowed",
            Self::Poisoned => "poisoned",
            Self::Regenerating => "regenerating",
            Self::Shielded => "shielded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusSource {
    Entity(EntityId),
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub source: StatusSource,
    pub current_duration: u32,
    pub max_duration: u32,
    /// Per-tick amount for damage and healing effects.
    pub magnitude: i32,
}

impl StatusEffect {
    pub fn new(kind: StatusKind, source: StatusSource, max_duration: u32) -> Self {
        Self {
            kind,
            source,
            current_duration: 0,
            max_duration,
            magnitude: 0,
        }
    }

    #[must_use]
    pub fn with_magnitude(mut self, magnitude: i32) -> Self {
        self.magnitude = magnitude;
        self
    }

    fn same_instance(&self, other: &StatusEffect) -> bool {
        self.kind == other.kind && self.source == other.source
    }

    fn has_expired(&self) -> bool {
        self.current_duration >= self.max_duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusInsert {
    Added,
    Refreshed,
}

/// Active effects on one creature. Order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSet {
    active: Vec<StatusEffect>,
}

impl StatusSet {
    pub fn has(&self, kind: StatusKind) -> bool {
        self.active.iter().any(|effect| effect.kind == kind)
    }

    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.active.iter().find(|effect| effect.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Same kind from the same source resets the existing instance instead of stacking.
    pub(crate) fn insert(&mut self, effect: StatusEffect) -> StatusInsert {
        if let Some(existing) = self
            .active
            .iter_mut()
            .find(|existing| existing.same_instance(&effect))
        {
            existing.current_duration = 0;
            existing.max_duration = effect.max_duration;
            existing.magnitude = effect.magnitude;
            return StatusInsert::Refreshed;
        }
        self.active.push(effect);
        StatusInsert::Added
    }

    fn take_kind(&mut self, kind: StatusKind) -> Vec<StatusEffect> {
        let (taken, kept): (Vec<_>, Vec<_>) = self
            .active
            .drain(..)
            .partition(|effect| effect.kind == kind);
        self.active = kept;
        taken
    }

    /// Splits off expired effects and advances the rest by one tick.
    fn advance(&mut self) -> (Vec<StatusEffect>, Vec<StatusEffect>) {
        let (expired, mut kept): (Vec<_>, Vec<_>) =
            self.active.drain(..).partition(StatusEffect::has_expired);
        for effect in &mut kept {
            effect.current_duration = effect.current_duration.saturating_add(1);
        }
        self.active = kept.clone();
        (expired, kept)
    }
}

impl World {
    /// Attaches an effect to a creature. Returns false for anything that is not an active creature.
    pub fn add_status(&mut self, target: EntityId, effect: StatusEffect) -> bool {
        if !self.is_active(target) {
            return false;
        }
        let Some(creature) = self.creature_mut(target) else {
            return false;
        };
        let outcome = creature.statuses.insert(effect);
        if outcome == StatusInsert::Added {
            debug!(entity = target.0, status = effect.kind.name(), "status_applied");
        }
        self.emit(SimEvent::StatusApplied {
            entity: target,
            status: effect.kind,
        });
        true
    }

    /// Detaches every instance of `kind`, running each finalizer.
    pub fn remove_status(&mut self, target: EntityId, kind: StatusKind) -> bool {
        let Some(creature) = self.creature_mut(target) else {
            return false;
        };
        let removed = creature.statuses.take_kind(kind);
        if removed.is_empty() {
            return false;
        }
        for effect in removed {
            self.finalize_status(target, effect);
        }
        true
    }

    /// One status tick: expired effects finalize and detach, the rest advance and run their hook.
    pub(crate) fn tick_statuses(&mut self, target: EntityId) {
        let Some(creature) = self.creature_mut(target) else {
            return;
        };
        if creature.statuses.is_empty() {
            return;
        }
        let (expired, advanced) = creature.statuses.advance();
        for effect in expired {
            self.finalize_status(target, effect);
        }
        for effect in advanced {
            if !self.is_active(target) {
                break;
            }
            self.run_status_hook(target, effect);
        }
    }

    fn run_status_hook(&mut self, target: EntityId, effect: StatusEffect) {
        match effect.kind {
            StatusKind::Burning => {
                self.damage_entity(target, effect.magnitude, DamageType::Heat);
            }
            StatusKind::Poisoned => {
                self.damage_entity(target, effect.magnitude, DamageType::Poison);
            }
            StatusKind::Regenerating => {
                self.heal_entity(target, effect.magnitude);
            }
            StatusKind::Stunned | StatusKind::Slowed | StatusKind::Shielded => {}
        }
    }

    fn finalize_status(&mut self, target: EntityId, effect: StatusEffect) {
        if effect.kind == StatusKind::Burning {
            self.clear_burning_flag(target);
        }
        debug!(entity = target.0, status = effect.kind.name(), "status_expired");
        self.emit(SimEvent::StatusExpired {
            entity: target,
            status: effect.kind,
        });
    }
}
