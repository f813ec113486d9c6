//! Scaleway backend over the Instances API.
//!
//! Batch membership is carried in server tags, which Scaleway accepts at
//! creation time. Every server lives in the configured zone so that list and
//! delete calls, which only receive an instance id, address the same zone.

mod error;
mod lifecycle;
mod types;

use scaleway_rs::ScalewayApi;
use tracing::{debug, warn};

use crate::backend::{
    Backend, BackendFuture, InstanceId, InstanceRecord, InstanceSpec, ListFilter,
};
use crate::config::{FleetConfig, ScalewayConfig};
use crate::naming::MembershipEncoding;

pub use error::ScalewayBackendError;

/// Backend that provisions instances through the Scaleway Instances API.
#[derive(Clone)]
pub struct ScalewayBackend {
    api: ScalewayApi,
    config: ScalewayConfig,
    default_spec: InstanceSpec,
}

impl std::fmt::Debug for ScalewayBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalewayBackend")
            .field("access_key", &self.config.access_key)
            .field("zone", &self.config.default_zone)
            .field("project", &self.config.default_project_id)
            .field("default_spec", &self.default_spec)
            .finish_non_exhaustive()
    }
}

impl ScalewayBackend {
    /// Constructs a new backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScalewayBackendError::Config`] when the provided configuration
    /// fails validation.
    pub fn new(config: ScalewayConfig, fleet: &FleetConfig) -> Result<Self, ScalewayBackendError> {
        let default_spec = config.instance_spec(fleet)?;
        debug!(
            access_key = config.access_key.as_deref().unwrap_or("unset"),
            project = %config.default_project_id,
            zone = %config.default_zone,
            "configured Scaleway backend"
        );
        Ok(Self {
            api: ScalewayApi::new(&config.secret_key),
            config,
            default_spec,
        })
    }

    /// Zone every server of this backend lives in.
    #[must_use]
    pub fn zone(&self) -> &str {
        &self.config.default_zone
    }

    fn check_spec(&self, spec: &InstanceSpec) -> Result<(), ScalewayBackendError> {
        spec.validate()?;
        if spec.region != self.config.default_zone {
            return Err(ScalewayBackendError::Validation(format!(
                "region {} differs from the configured zone {}; set SCW_DEFAULT_ZONE instead",
                spec.region, self.config.default_zone
            )));
        }
        Ok(())
    }

    async fn create_batch(
        &self,
        specs: &[InstanceSpec],
    ) -> Result<Vec<InstanceRecord>, ScalewayBackendError> {
        for spec in specs {
            self.check_spec(spec)?;
        }

        let mut images: Vec<(String, String)> = Vec::new();
        let mut created: Vec<InstanceRecord> = Vec::with_capacity(specs.len());
        for spec in specs {
            match self.create_one(spec, &mut images).await {
                Ok(record) => created.push(record),
                Err(err) => {
                    self.discard(&created).await;
                    return Err(err);
                }
            }
        }
        Ok(created)
    }

    async fn create_one(
        &self,
        spec: &InstanceSpec,
        images: &mut Vec<(String, String)>,
    ) -> Result<InstanceRecord, ScalewayBackendError> {
        let image_id = match images.iter().find(|(label, _)| label == &spec.image) {
            Some((_, id)) => id.clone(),
            None => {
                let id = self.resolve_image_id(&spec.image).await?;
                images.push((spec.image.clone(), id.clone()));
                id
            }
        };

        let record = self.create_server(spec, &image_id).await?;
        debug!(instance = %record.id, name = %record.name, "server created");
        if let Err(err) = self.power_on(&record.id).await {
            self.discard(std::slice::from_ref(&record)).await;
            return Err(err);
        }
        Ok(record)
    }

    /// Terminates servers created by a batch that could not be completed.
    async fn discard(&self, created: &[InstanceRecord]) {
        for record in created {
            if let Err(err) = self.terminate(&record.id).await {
                warn!(instance = %record.id, error = %err, "failed to discard partially created server");
            }
        }
    }
}

impl Backend for ScalewayBackend {
    type Error = ScalewayBackendError;

    fn membership(&self) -> MembershipEncoding {
        MembershipEncoding::Tags
    }

    fn default_spec(&self) -> InstanceSpec {
        self.default_spec.clone()
    }

    fn create<'a>(
        &'a self,
        specs: &'a [InstanceSpec],
    ) -> BackendFuture<'a, Vec<InstanceRecord>, Self::Error> {
        Box::pin(self.create_batch(specs))
    }

    fn list<'a>(
        &'a self,
        filter: &'a ListFilter,
    ) -> BackendFuture<'a, Vec<InstanceRecord>, Self::Error> {
        Box::pin(self.list_servers(filter))
    }

    fn delete<'a>(&'a self, id: &'a InstanceId) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(self.terminate(id))
    }
}
