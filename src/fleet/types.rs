//! Values returned by the fleet engine.

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::backend::{InstanceId, InstanceOverrides, InstanceRecord};
use crate::naming::BatchId;

/// Default wall-clock budget for one `acquire` call.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Default delay between convergence polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Caller options for [`Fleet::acquire`](super::Fleet::acquire).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AcquireOptions {
    /// Total budget shared by both convergence phases.
    pub timeout: Duration,
    /// Delay before each provider query.
    pub poll_interval: Duration,
    /// Base name for the batch; falls back to the backend default.
    pub name: Option<String>,
    /// Overrides merged over the backend's default spec.
    pub overrides: InstanceOverrides,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_ACQUIRE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            name: None,
            overrides: InstanceOverrides::default(),
        }
    }
}

impl AcquireOptions {
    /// Overrides the convergence budget.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the polling interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the base name used for every member of the batch.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the instance overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: InstanceOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// One converged member of an acquired batch.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AcquiredServer {
    /// Provider identifier.
    pub id: InstanceId,
    /// First public IPv4 address.
    pub ip: Ipv4Addr,
}

/// Outcome of a successful `acquire`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BatchResult {
    /// Identifier shared by every member.
    pub batch_id: BatchId,
    /// Members in submission order.
    pub servers: Vec<AcquiredServer>,
    /// Raw provider records, in the same order as `servers`.
    #[serde(skip)]
    pub raw: Vec<InstanceRecord>,
}

/// Minimal projection of a managed instance.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ServerSummary {
    /// Provider identifier.
    pub id: InstanceId,
    /// First IPv4 address, absent while the provider is still assigning one.
    pub ip: Option<Ipv4Addr>,
    /// Batch the instance belongs to.
    pub batch_id: BatchId,
}

/// Why one instance could not be released.
#[derive(Clone, Debug, Error, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReleaseFailure {
    /// The provider rejected the delete request.
    #[error("delete failed: {message}")]
    Delete {
        /// Provider error message.
        message: String,
    },
    /// The instance no longer carries the expected batch marker.
    #[error("instance does not carry the expected batch marker")]
    MissingMarker,
    /// The provider creation timestamp could not be parsed.
    #[error("unparsable creation timestamp '{raw}'")]
    UnparsableTimestamp {
        /// Timestamp as reported by the provider.
        raw: String,
    },
}

/// Per-instance result of a release call.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ReleaseOutcome {
    /// Provider identifier.
    pub id: InstanceId,
    /// Whether the instance was deleted.
    pub success: bool,
    /// Failure, when the instance was not released.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ReleaseFailure>,
}

impl ReleaseOutcome {
    /// Records a successful deletion.
    #[must_use]
    pub const fn deleted(id: InstanceId) -> Self {
        Self {
            id,
            success: true,
            error: None,
        }
    }

    /// Records a failed release.
    #[must_use]
    pub const fn failed(id: InstanceId, failure: ReleaseFailure) -> Self {
        Self {
            id,
            success: false,
            error: Some(failure),
        }
    }

    /// Returns `true` when the instance was deleted.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.success
    }
}

/// Report returned by `release` and `release_older_than`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ReleaseReport {
    /// Released batch; absent for age-based release.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<BatchId>,
    /// One entry per instance that was considered.
    pub servers: Vec<ReleaseOutcome>,
    /// Number of entries in `servers` that failed.
    pub errors: usize,
}

impl ReleaseReport {
    pub(super) const fn new(batch_id: Option<BatchId>) -> Self {
        Self {
            batch_id,
            servers: Vec::new(),
            errors: 0,
        }
    }

    pub(super) fn push(&mut self, outcome: ReleaseOutcome) {
        if !outcome.succeeded() {
            self.errors += 1;
        }
        self.servers.push(outcome);
    }

    /// Number of instances actually deleted.
    #[must_use]
    pub fn deleted(&self) -> usize {
        self.servers.len() - self.errors
    }
}
