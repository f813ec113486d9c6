//! Enumeration of managed instances.

use crate::backend::{Backend, InstanceRecord};
use crate::naming::BatchId;

use super::{Fleet, FleetError, ServerSummary};

impl<B> Fleet<B>
where
    B: Backend,
{
    /// Lists managed instances, optionally narrowed to one batch.
    ///
    /// Instances whose name or tags do not decode to a batch identifier are
    /// foreign and never appear in the result.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::Query`] when the provider listing fails.
    pub async fn list(
        &self,
        batch_id: Option<&BatchId>,
    ) -> Result<Vec<ServerSummary>, FleetError<B::Error>> {
        let filter = batch_id.map_or_else(|| self.managed_filter(), |id| self.batch_filter(id));
        let records = self
            .backend
            .list(&filter)
            .await
            .map_err(FleetError::Query)?;

        Ok(records
            .iter()
            .filter_map(|record| {
                let member = self.decode_membership(record)?;
                batch_id
                    .is_none_or(|wanted| *wanted == member)
                    .then(|| ServerSummary {
                        id: record.id.clone(),
                        ip: record.first_ipv4(),
                        batch_id: member,
                    })
            })
            .collect())
    }

    /// Current provider records for one batch.
    pub(super) async fn batch_members(
        &self,
        batch_id: &BatchId,
    ) -> Result<Vec<InstanceRecord>, FleetError<B::Error>> {
        let records = self
            .backend
            .list(&self.batch_filter(batch_id))
            .await
            .map_err(FleetError::Query)?;
        Ok(records
            .into_iter()
            .filter(|record| self.decode_membership(record).as_ref() == Some(batch_id))
            .collect())
    }
}
