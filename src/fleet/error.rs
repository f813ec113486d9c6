//! Error types for the fleet engine.

use std::fmt;

use thiserror::Error;

use crate::naming::BatchId;

/// Convergence loop that exhausted its budget.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConvergencePhase {
    /// Waiting for every member to report batch membership.
    Membership,
    /// Waiting for every member to become active with an address.
    Activation,
}

impl fmt::Display for ConvergencePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Membership => f.write_str("membership"),
            Self::Activation => f.write_str("activation"),
        }
    }
}

/// Errors surfaced by fleet operations.
#[derive(Debug, Error)]
pub enum FleetError<BackendError>
where
    BackendError: std::error::Error + 'static,
{
    /// Raised when the request or the resulting instance spec is invalid.
    /// Nothing was submitted.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Raised when the provider rejects the creation request. Nothing was
    /// created, so no rollback is attempted.
    #[error("failed to submit creation request: {0}")]
    Submission(#[source] BackendError),
    /// Raised when convergence does not complete within the budget. Created
    /// instances have been rolled back on a best-effort basis.
    #[error("Time out waiting for batch {batch_id} ({phase})")]
    Timeout {
        /// Batch that failed to converge.
        batch_id: BatchId,
        /// Loop that was running when the budget ran out.
        phase: ConvergencePhase,
    },
    /// Raised when listing instances fails.
    #[error("failed to query instances: {0}")]
    Query(#[source] BackendError),
}

impl<BackendError> FleetError<BackendError>
where
    BackendError: std::error::Error + 'static,
{
    /// Converts the wrapped backend error, keeping the variant.
    pub fn map_backend<Other, F>(self, convert: F) -> FleetError<Other>
    where
        Other: std::error::Error + 'static,
        F: FnOnce(BackendError) -> Other,
    {
        match self {
            Self::Configuration(message) => FleetError::Configuration(message),
            Self::Submission(err) => FleetError::Submission(convert(err)),
            Self::Timeout { batch_id, phase } => FleetError::Timeout { batch_id, phase },
            Self::Query(err) => FleetError::Query(convert(err)),
        }
    }
}
