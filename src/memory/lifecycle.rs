//! Timed provider-side state machine for in-memory instances.

use std::time::Duration;

use tokio::time::Instant;

/// Observable stage of an in-memory instance.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Stage {
    /// Creation acknowledged; nothing else is visible yet.
    New,
    /// Name and tags are visible.
    Labelled,
    /// A network address has been assigned.
    Networked,
    /// The instance reports itself active.
    Active,
}

/// Delays between consecutive stages.
///
/// Each delay starts when its predecessor completes, so a stage is never
/// observable before the one it follows.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LifecycleSchedule {
    /// Delay from creation until labels are visible.
    pub labelling: Duration,
    /// Delay from labelling until an address is assigned.
    pub networking: Duration,
    /// Delay from networking until activation; `None` stalls forever.
    pub activation: Option<Duration>,
}

impl Default for LifecycleSchedule {
    fn default() -> Self {
        Self {
            labelling: Duration::from_millis(2),
            networking: Duration::from_millis(5),
            activation: Some(Duration::from_millis(5)),
        }
    }
}

impl LifecycleSchedule {
    /// Schedule whose instances become active as soon as they are created.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            labelling: Duration::ZERO,
            networking: Duration::ZERO,
            activation: Some(Duration::ZERO),
        }
    }

    /// Schedule whose instances receive an address but never activate.
    #[must_use]
    pub const fn never_active() -> Self {
        Self {
            labelling: Duration::from_millis(1),
            networking: Duration::from_millis(1),
            activation: None,
        }
    }

    /// Schedule whose instances never expose their name or tags.
    #[must_use]
    pub const fn never_labelled() -> Self {
        Self {
            labelling: Duration::MAX,
            networking: Duration::ZERO,
            activation: Some(Duration::ZERO),
        }
    }

    /// Stage reached `elapsed` after creation.
    #[must_use]
    pub fn stage_at(&self, elapsed: Duration) -> Stage {
        let labelled_at = self.labelling;
        if elapsed < labelled_at {
            return Stage::New;
        }
        let networked_at = labelled_at + self.networking;
        if elapsed < networked_at {
            return Stage::Labelled;
        }
        match self.activation {
            Some(delay) if elapsed >= networked_at + delay => Stage::Active,
            _ => Stage::Networked,
        }
    }
}

/// Per-instance timer started at creation.
#[derive(Clone, Copy, Debug)]
pub(super) struct Lifecycle {
    started: Instant,
    schedule: LifecycleSchedule,
}

impl Lifecycle {
    pub(super) fn start(schedule: LifecycleSchedule) -> Self {
        Self {
            started: Instant::now(),
            schedule,
        }
    }

    pub(super) fn stage(&self) -> Stage {
        self.schedule.stage_at(self.started.elapsed())
    }
}
