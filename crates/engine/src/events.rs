use std::collections::BTreeMap;

use crate::damage::DamageType;
use crate::fluid::GasKind;
use crate::geometry::Coord;
use crate::powers::PowerKind;
use crate::status::StatusKind;
use crate::world::EntityId;

/// Presentation requests describing what just happened. The core never waits on them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    DamageFlash {
        entity: EntityId,
        amount: i32,
        damage_type: DamageType,
    },
    Healed {
        entity: EntityId,
        amount: i32,
    },
    Projectile {
        from: Coord,
        to: Coord,
    },
    Miss {
        from: Coord,
        to: Coord,
    },
    Explosion {
        center: Coord,
        radius: u32,
    },
    Knockback {
        entity: EntityId,
        from: Coord,
        to: Coord,
    },
    Died {
        entity: EntityId,
    },
    Destroyed {
        entity: EntityId,
    },
    StatusApplied {
        entity: EntityId,
        status: StatusKind,
    },
    StatusExpired {
        entity: EntityId,
        status: StatusKind,
    },
    Ignited {
        entity: EntityId,
    },
    Extinguished {
        entity: EntityId,
    },
    FluidReaction {
        at: Coord,
        product: GasKind,
    },
    DoorToggled {
        door: EntityId,
        open: bool,
    },
    TrapTriggered {
        trap: EntityId,
        victim: EntityId,
    },
    PowerActivated {
        owner: EntityId,
        power: PowerKind,
        target: Option<Coord>,
    },
    Reloaded {
        entity: EntityId,
    },
    Shocked {
        at: Coord,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SimEventKind {
    DamageFlash,
    Healed,
    Projectile,
    Miss,
    Explosion,
    Knockback,
    Died,
    Destroyed,
    StatusApplied,
    StatusExpired,
    Ignited,
    Extinguished,
    FluidReaction,
    DoorToggled,
    TrapTriggered,
    PowerActivated,
    Reloaded,
    Shocked,
}

impl SimEvent {
    pub fn kind(self) -> SimEventKind {
        match self {
            Self::DamageFlash { .. } => SimEventKind::DamageFlash,
            Self::Healed { .. } => SimEventKind::Healed,
            Self::Projectile { .. } => SimEventKind::Projectile,
            Self::Miss { .. } => SimEventKind::Miss,
            Self::Explosion { .. } => SimEventKind::Explosion,
            Self::Knockback { .. } => SimEventKind::Knockback,
            Self::Died { .. } => SimEventKind::Died,
            Self::Destroyed { .. } => SimEventKind::Destroyed,
            Self::StatusApplied { .. } => SimEventKind::StatusApplied,
            Self::StatusExpired { .. } => SimEventKind::StatusExpired,
            Self::Ignited { .. } => SimEventKind::Ignited,
            Self::Extinguished { .. } => SimEventKind::Extinguished,
            Self::FluidReaction { .. } => SimEventKind::FluidReaction,
            Self::DoorToggled { .. } => SimEventKind::DoorToggled,
            Self::TrapTriggered { .. } => SimEventKind::TrapTriggered,
            Self::PowerActivated { .. } => SimEventKind::PowerActivated,
            Self::Reloaded { .. } => SimEventKind::Reloaded,
            Self::Shocked { .. } => SimEventKind::Shocked,
        }
    }

    /// Hint for the input layer: these play out over time and input may wait for them.
    pub fn is_blocking(self) -> bool {
        matches!(
            self.kind(),
            SimEventKind::Projectile | SimEventKind::Explosion | SimEventKind::Knockback
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimEventCounts {
    total: u32,
    by_kind: BTreeMap<SimEventKind, u32>,
}

impl SimEventCounts {
    fn record(&mut self, kind: SimEventKind) {
        self.total = self.total.saturating_add(1);
        let count = self.by_kind.entry(kind).or_insert(0);
        *count = count.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn get(&self, kind: SimEventKind) -> u32 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// Events of the tick in progress plus per-kind counts of the last finished tick.
#[derive(Debug, Default)]
pub struct SimEventBus {
    current_tick_events: Vec<SimEvent>,
    undrained: Vec<SimEvent>,
    current_tick_counts: SimEventCounts,
    last_tick_counts: SimEventCounts,
}

impl SimEventBus {
    pub(crate) fn emit(&mut self, event: SimEvent) {
        self.current_tick_counts.record(event.kind());
        self.current_tick_events.push(event);
        self.undrained.push(event);
    }

    pub fn iter_emitted_this_tick(&self) -> impl Iterator<Item = &SimEvent> {
        self.current_tick_events.iter()
    }

    pub fn pending(&self) -> &[SimEvent] {
        &self.undrained
    }

    pub(crate) fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.undrained)
    }

    pub(crate) fn finish_tick_rollover(&mut self) {
        self.last_tick_counts = std::mem::take(&mut self.current_tick_counts);
        self.current_tick_events.clear();
    }

    pub fn last_tick_counts(&self) -> &SimEventCounts {
        &self.last_tick_counts
    }
}
