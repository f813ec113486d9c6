//! Core library for the flotilla batch provisioning tool.
//!
//! The crate creates batches of short-lived virtual servers through a
//! provider [`Backend`], waits until every member of a batch is active, and
//! releases servers by batch or by age. Batch membership is encoded into the
//! provider-visible server name or tag set (see [`naming`]), so inventory can
//! be rebuilt from the provider alone.

pub mod backend;
pub mod config;
pub mod fleet;
pub mod memory;
pub mod naming;
pub mod provider;
pub mod scaleway;
pub mod telemetry;

pub use backend::{
    Backend, BackendError, InstanceId, InstanceOverrides, InstanceRecord, InstanceSpec,
    InstanceSpecBuilder, InstanceStatus, ListFilter,
};
pub use config::{ConfigError, FleetConfig, ScalewayConfig, Settings};
pub use fleet::{
    AcquireOptions, AcquiredServer, BatchResult, ConvergencePhase, Fleet, FleetError,
    ReleaseFailure, ReleaseOutcome, ReleaseReport, ServerSummary,
};
pub use memory::{LifecycleSchedule, MemoryBackend, MemoryBackendError};
pub use naming::{BatchId, MembershipEncoding, NamingError};
pub use provider::{Provider, ProviderBackendError, ProviderError, ProviderKind};
pub use scaleway::{ScalewayBackend, ScalewayBackendError};
