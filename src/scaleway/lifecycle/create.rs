//! Server creation, power-on, and termination for the Scaleway backend.
//!
//! Scaleway creates servers stopped; each one is powered on right after its
//! creation request succeeds. Deletion uses the `terminate` action, which
//! stops the server and removes it together with its volumes and IP.

use crate::backend::{InstanceId, InstanceRecord, InstanceSpec};
use crate::scaleway::types::{CreateServerRequest, ServerEnvelope};

use super::super::{ScalewayBackend, ScalewayBackendError};
use super::{HTTP_CLIENT, servers_url};

impl ScalewayBackend {
    pub(in crate::scaleway) fn is_instance_type_error(
        api_err: &scaleway_rs::ScalewayApiError,
        instance_type: &str,
    ) -> bool {
        matches!(api_err.resource.as_deref(), Some("commercial_type"))
            || api_err
                .resource_id
                .as_deref()
                .is_some_and(|id| id == instance_type)
            || (api_err.etype == "invalid_arguments"
                && api_err
                    .message
                    .to_ascii_lowercase()
                    .contains("commercial_type"))
    }

    pub(in crate::scaleway) fn create_payload(
        &self,
        spec: &InstanceSpec,
        image_id: &str,
    ) -> CreateServerRequest {
        CreateServerRequest {
            name: spec.name.clone(),
            commercial_type: spec.size.clone(),
            image: image_id.to_owned(),
            project: self.config.default_project_id.clone(),
            organization: self.config.default_organization_id.clone(),
            routed_ip_enabled: true,
            dynamic_ip_required: spec.public_ip,
            enable_ipv6: spec.ipv6,
            tags: spec.tags.clone(),
        }
    }

    /// Submits one server creation request carrying the spec's tags.
    ///
    /// # Errors
    ///
    /// Returns [`ScalewayBackendError`] when the request fails or the
    /// provider rejects the commercial type.
    pub(in crate::scaleway) async fn create_server(
        &self,
        spec: &InstanceSpec,
        image_id: &str,
    ) -> Result<InstanceRecord, ScalewayBackendError> {
        let payload = self.create_payload(spec, image_id);
        let response = HTTP_CLIENT
            .post(servers_url(self.zone()))
            .header("X-Auth-Token", &self.config.secret_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            let parsed: ServerEnvelope =
                serde_json::from_slice(&body).map_err(ScalewayBackendError::provider)?;
            return Ok(InstanceRecord::from(parsed.server));
        }

        if let Ok(api_err) = serde_json::from_slice::<scaleway_rs::ScalewayApiError>(&body)
            && Self::is_instance_type_error(&api_err, &spec.size)
        {
            return Err(ScalewayBackendError::InstanceTypeUnavailable {
                instance_type: spec.size.clone(),
                zone: spec.region.clone(),
            });
        }

        Err(ScalewayBackendError::Provider {
            message: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    pub(in crate::scaleway) async fn power_on(
        &self,
        id: &InstanceId,
    ) -> Result<(), ScalewayBackendError> {
        self.api
            .perform_instance_action_async(self.zone(), id.as_str(), "poweron")
            .await?;
        Ok(())
    }

    pub(in crate::scaleway) async fn terminate(
        &self,
        id: &InstanceId,
    ) -> Result<(), ScalewayBackendError> {
        self.api
            .perform_instance_action_async(self.zone(), id.as_str(), "terminate")
            .await?;
        Ok(())
    }
}
