//! Batch lifecycle engine.
//!
//! [`Fleet`] drives a [`Backend`] through the batch protocol: submit one
//! creation request per batch, poll until every member reports membership
//! and becomes active, roll back on failure, and release batches either by
//! identifier or by age while accounting for per-instance failures.

mod acquire;
mod error;
mod inventory;
mod release;
mod types;

use crate::backend::{Backend, InstanceRecord, InstanceSpec, ListFilter};
use crate::naming::{
    AUTO_CREATED_TAG, BatchId, MembershipEncoding, batch_tags, decode_name, decode_tags,
    encode_name,
};

pub use error::{ConvergencePhase, FleetError};
pub use types::{
    AcquireOptions, AcquiredServer, BatchResult, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_POLL_INTERVAL,
    ReleaseFailure, ReleaseOutcome, ReleaseReport, ServerSummary,
};

/// Provisions, enumerates, and releases batches on one backend.
#[derive(Clone, Debug)]
pub struct Fleet<B> {
    backend: B,
}

impl<B> Fleet<B>
where
    B: Backend,
{
    /// Wraps a backend.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Borrows the underlying backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Membership encoding advertised by the backend.
    #[must_use]
    pub fn membership(&self) -> MembershipEncoding {
        self.backend.membership()
    }

    /// Filter selecting every instance managed by this crate.
    fn managed_filter(&self) -> ListFilter {
        match self.membership() {
            MembershipEncoding::Name => ListFilter::All,
            MembershipEncoding::Tags => ListFilter::Tagged(AUTO_CREATED_TAG.to_owned()),
        }
    }

    /// Narrowest server-side filter for one batch.
    fn batch_filter(&self, batch_id: &BatchId) -> ListFilter {
        match self.membership() {
            MembershipEncoding::Name => ListFilter::All,
            MembershipEncoding::Tags => ListFilter::Tagged(batch_id.as_str().to_owned()),
        }
    }

    fn decode_membership(&self, record: &InstanceRecord) -> Option<BatchId> {
        match self.membership() {
            MembershipEncoding::Name => decode_name(&record.name).batch_id,
            MembershipEncoding::Tags => decode_tags(&record.tags),
        }
    }

    fn stamp_membership(&self, spec: &mut InstanceSpec, batch_id: &BatchId) {
        match self.membership() {
            MembershipEncoding::Name => spec.name = encode_name(&spec.name, batch_id),
            MembershipEncoding::Tags => spec.tags.extend(batch_tags(batch_id)),
        }
    }
}
