//! Batch and age based release.
//!
//! Release never stops at the first failure: every candidate is attempted
//! and failures are recorded in the [`ReleaseReport`].

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, warn};

use crate::backend::{Backend, InstanceId, InstanceRecord};
use crate::naming::{BatchId, MembershipEncoding};

use super::{Fleet, FleetError, ReleaseFailure, ReleaseOutcome, ReleaseReport};

impl<B> Fleet<B>
where
    B: Backend,
{
    /// Deletes every instance of `batch_id`.
    ///
    /// On tag-encoded backends each candidate returned by the tag filter is
    /// re-checked before deletion; an instance that no longer decodes to the
    /// batch is reported as [`ReleaseFailure::MissingMarker`] and left alone.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::Query`] when the batch cannot be listed.
    /// Per-instance failures are reported, not returned.
    pub async fn release(&self, batch_id: &BatchId) -> Result<ReleaseReport, FleetError<B::Error>> {
        let records = self
            .backend
            .list(&self.batch_filter(batch_id))
            .await
            .map_err(FleetError::Query)?;

        let mut report = ReleaseReport::new(Some(batch_id.clone()));
        for record in records {
            let member = self.decode_membership(&record);
            if member.as_ref() == Some(batch_id) {
                report.push(self.delete_one(record.id).await);
            } else if self.membership() == MembershipEncoding::Tags {
                report.push(ReleaseOutcome::failed(
                    record.id,
                    ReleaseFailure::MissingMarker,
                ));
            }
        }

        info!(
            batch = %batch_id,
            considered = report.servers.len(),
            errors = report.errors,
            "batch released"
        );
        Ok(report)
    }

    /// Deletes every managed instance created more than `max_age` ago.
    ///
    /// Instances with an unparsable creation timestamp, and tag-marked
    /// instances without a decodable batch tag, are reported as failures.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::Configuration`] when `max_age` is zero or out
    /// of range, and [`FleetError::Query`] when the inventory cannot be
    /// listed.
    pub async fn release_older_than(
        &self,
        max_age: Duration,
    ) -> Result<ReleaseReport, FleetError<B::Error>> {
        if max_age.is_zero() {
            return Err(FleetError::Configuration(String::from(
                "age threshold must be positive",
            )));
        }
        let threshold = TimeDelta::from_std(max_age)
            .map_err(|err| FleetError::Configuration(err.to_string()))?;

        let records = self
            .backend
            .list(&self.managed_filter())
            .await
            .map_err(FleetError::Query)?;

        let now = Utc::now();
        let mut report = ReleaseReport::new(None);
        for record in records {
            if self.decode_membership(&record).is_none() {
                if self.membership() == MembershipEncoding::Tags {
                    report.push(ReleaseOutcome::failed(
                        record.id,
                        ReleaseFailure::MissingMarker,
                    ));
                }
                continue;
            }
            match creation_age(&record, now) {
                Ok(age) if age > threshold => report.push(self.delete_one(record.id).await),
                Ok(_) => {}
                Err(failure) => report.push(ReleaseOutcome::failed(record.id, failure)),
            }
        }

        info!(
            max_age_secs = max_age.as_secs(),
            considered = report.servers.len(),
            errors = report.errors,
            "aged instances released"
        );
        Ok(report)
    }

    async fn delete_one(&self, id: InstanceId) -> ReleaseOutcome {
        match self.backend.delete(&id).await {
            Ok(()) => ReleaseOutcome::deleted(id),
            Err(err) => {
                warn!(instance = %id, error = %err, "delete failed");
                ReleaseOutcome::failed(
                    id,
                    ReleaseFailure::Delete {
                        message: err.to_string(),
                    },
                )
            }
        }
    }
}

fn creation_age(record: &InstanceRecord, now: DateTime<Utc>) -> Result<TimeDelta, ReleaseFailure> {
    DateTime::parse_from_rfc3339(&record.created_at)
        .map(|created| now - created.with_timezone(&Utc))
        .map_err(|_| ReleaseFailure::UnparsableTimestamp {
            raw: record.created_at.clone(),
        })
}
