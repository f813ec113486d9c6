//! Batch creation and convergence.
//!
//! A batch is submitted with a single creation request. Convergence then
//! runs under one wall-clock budget: tag-encoded backends first wait until
//! every member reports the batch tag, and all backends wait until every
//! member is active with an IPv4 address. Any failure after submission
//! deletes whatever was created before the error is returned.

use std::time::Duration;

use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, info, warn};

use crate::backend::{Backend, InstanceRecord, InstanceSpec};
use crate::naming::BatchId;

use super::{
    AcquireOptions, AcquiredServer, BatchResult, ConvergencePhase, Fleet, FleetError,
};

impl<B> Fleet<B>
where
    B: Backend,
{
    /// Creates `count` instances under one new batch identifier and waits
    /// until all of them are active.
    ///
    /// Either every requested instance is returned active, or an error is
    /// returned after a best-effort deletion of anything this call created.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::Configuration`] when `count` is zero, the
    /// timeout cannot be scheduled, or the merged spec is invalid, [`FleetError::Submission`] when the provider
    /// rejects the creation request, and [`FleetError::Timeout`] or
    /// [`FleetError::Query`] when convergence fails.
    pub async fn acquire(
        &self,
        count: usize,
        options: &AcquireOptions,
    ) -> Result<BatchResult, FleetError<B::Error>> {
        if count == 0 {
            return Err(FleetError::Configuration(String::from(
                "instance count must be at least 1",
            )));
        }

        convergence_deadline::<B::Error>(options.timeout)?;

        let batch_id = BatchId::generate(self.membership());
        let specs = self.batch_specs(count, options, &batch_id)?;

        info!(batch = %batch_id, count, "submitting batch");
        let created = self
            .backend
            .create(&specs)
            .await
            .map_err(FleetError::Submission)?;

        match self.converge(&batch_id, count, options).await {
            Ok(records) => {
                info!(batch = %batch_id, count, "batch is active");
                Ok(Self::batch_result(batch_id, &created, records))
            }
            Err(err) => {
                warn!(batch = %batch_id, error = %err, "batch failed to converge; rolling back");
                self.rollback(&created).await;
                Err(err)
            }
        }
    }

    pub(super) fn batch_specs(
        &self,
        count: usize,
        options: &AcquireOptions,
        batch_id: &BatchId,
    ) -> Result<Vec<InstanceSpec>, FleetError<B::Error>> {
        let base = self.backend.default_spec().merged(&options.overrides);
        let name = options.name.clone().unwrap_or_else(|| base.name.clone());

        (1..=count)
            .map(|index| {
                let member_name = if count > 1 {
                    format!("{name}-{index}")
                } else {
                    name.clone()
                };
                let mut spec = InstanceSpec {
                    name: member_name,
                    ..base.clone()
                };
                self.stamp_membership(&mut spec, batch_id);
                spec.validate()
                    .map_err(|err| FleetError::Configuration(err.to_string()))?;
                Ok(spec)
            })
            .collect()
    }

    async fn converge(
        &self,
        batch_id: &BatchId,
        count: usize,
        options: &AcquireOptions,
    ) -> Result<Vec<InstanceRecord>, FleetError<B::Error>> {
        let deadline = convergence_deadline(options.timeout)?;

        if self.membership().is_applied_asynchronously() {
            timeout_at(
                deadline,
                self.wait_for_membership(batch_id, count, options.poll_interval),
            )
            .await
            .map_err(|_elapsed| FleetError::Timeout {
                batch_id: batch_id.clone(),
                phase: ConvergencePhase::Membership,
            })??;
        }

        timeout_at(
            deadline,
            self.wait_for_activation(batch_id, count, options.poll_interval),
        )
        .await
        .map_err(|_elapsed| FleetError::Timeout {
            batch_id: batch_id.clone(),
            phase: ConvergencePhase::Activation,
        })?
    }

    async fn wait_for_membership(
        &self,
        batch_id: &BatchId,
        count: usize,
        poll_interval: Duration,
    ) -> Result<(), FleetError<B::Error>> {
        loop {
            sleep(poll_interval).await;
            let members = self.batch_members(batch_id).await?;
            debug!(batch = %batch_id, observed = members.len(), expected = count, "membership poll");
            if members.len() >= count {
                return Ok(());
            }
        }
    }

    async fn wait_for_activation(
        &self,
        batch_id: &BatchId,
        count: usize,
        poll_interval: Duration,
    ) -> Result<Vec<InstanceRecord>, FleetError<B::Error>> {
        loop {
            sleep(poll_interval).await;
            let members = self.batch_members(batch_id).await?;
            let ready = members
                .iter()
                .filter(|record| record.status.is_active() && record.first_ipv4().is_some())
                .count();
            debug!(batch = %batch_id, members = members.len(), ready, "activation poll");
            if members.len() == count && ready == count {
                return Ok(members);
            }
        }
    }

    /// Deletes every created instance, ignoring individual failures.
    async fn rollback(&self, created: &[InstanceRecord]) {
        for record in created {
            if let Err(err) = self.backend.delete(&record.id).await {
                warn!(instance = %record.id, error = %err, "rollback delete failed");
            }
        }
    }

    fn batch_result(
        batch_id: BatchId,
        created: &[InstanceRecord],
        mut records: Vec<InstanceRecord>,
    ) -> BatchResult {
        records.sort_by_key(|record| {
            created
                .iter()
                .position(|submitted| submitted.id == record.id)
                .unwrap_or(usize::MAX)
        });
        let servers = records
            .iter()
            .filter_map(|record| {
                record.first_ipv4().map(|ip| AcquiredServer {
                    id: record.id.clone(),
                    ip,
                })
            })
            .collect();
        BatchResult {
            batch_id,
            servers,
            raw: records,
        }
    }
}

/// Instant at which a convergence budget of `timeout` runs out.
fn convergence_deadline<E>(timeout: Duration) -> Result<Instant, FleetError<E>>
where
    E: std::error::Error + 'static,
{
    Instant::now().checked_add(timeout).ok_or_else(|| {
        FleetError::Configuration(format!(
            "timeout of {}s is too large to schedule",
            timeout.as_secs()
        ))
    })
}
