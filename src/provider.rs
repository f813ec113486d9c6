//! Closed registry of provisioning providers.
//!
//! A provider is chosen by its vendor key when the caller starts up. Each
//! variant of [`Provider`] owns a [`Fleet`] over one concrete backend, and
//! backend errors are unified into [`ProviderBackendError`] so callers
//! handle a single error type.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::backend::{Backend, InstanceSpec};
use crate::config::{ConfigError, Settings};
use crate::fleet::{AcquireOptions, BatchResult, Fleet, FleetError, ReleaseReport, ServerSummary};
use crate::memory::{MemoryBackend, MemoryBackendError};
use crate::naming::{BatchId, MembershipEncoding};
use crate::scaleway::{ScalewayBackend, ScalewayBackendError};

/// Vendor keys understood by [`Provider::from_kind`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProviderKind {
    /// Scaleway Instances API.
    Scaleway,
    /// Process-local fake provider.
    Memory,
}

impl ProviderKind {
    /// Vendor key of the provider.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Scaleway => "scaleway",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scaleway" => Ok(Self::Scaleway),
            "memory" => Ok(Self::Memory),
            _ => Err(ProviderError::UnknownVendor {
                vendor: value.to_owned(),
            }),
        }
    }
}

/// Errors raised while constructing a provider.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ProviderError {
    /// Raised when the vendor key names no known provider.
    #[error("unknown provider '{vendor}' (expected scaleway or memory)")]
    UnknownVendor {
        /// Key supplied by the caller.
        vendor: String,
    },
    /// Raised when provider settings cannot be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Raised when the Scaleway backend rejects its configuration.
    #[error(transparent)]
    Scaleway(#[from] ScalewayBackendError),
}

/// Backend error of whichever provider served the call.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProviderBackendError {
    /// Scaleway failure.
    #[error(transparent)]
    Scaleway(#[from] ScalewayBackendError),
    /// In-memory provider failure.
    #[error(transparent)]
    Memory(#[from] MemoryBackendError),
}

/// Fleet over one of the supported providers.
#[derive(Clone, Debug)]
pub enum Provider {
    /// Fleet over the Scaleway backend.
    Scaleway(Fleet<ScalewayBackend>),
    /// Fleet over the in-memory backend.
    Memory(Fleet<MemoryBackend>),
}

impl Provider {
    /// Builds the provider named by `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the provider's settings are missing or
    /// invalid.
    pub fn from_kind(kind: ProviderKind, settings: &Settings) -> Result<Self, ProviderError> {
        match kind {
            ProviderKind::Scaleway => {
                let backend = ScalewayBackend::new(settings.scaleway()?, &settings.fleet)?;
                Ok(Self::Scaleway(Fleet::new(backend)))
            }
            ProviderKind::Memory => {
                let backend = MemoryBackend::new();
                let spec = InstanceSpec {
                    name: settings.fleet.name.trim().to_owned(),
                    public_ip: settings.fleet.public_ip,
                    ipv6: settings.fleet.ipv6,
                    ..backend.default_spec()
                };
                Ok(Self::Memory(Fleet::new(backend.with_default_spec(spec))))
            }
        }
    }

    /// Parses the configured vendor key and builds that provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::UnknownVendor`] for unrecognised keys and
    /// the errors of [`Provider::from_kind`].
    pub fn from_settings(settings: &Settings) -> Result<Self, ProviderError> {
        let kind = settings.fleet.provider.parse()?;
        Self::from_kind(kind, settings)
    }

    /// Kind of the wrapped provider.
    #[must_use]
    pub const fn kind(&self) -> ProviderKind {
        match self {
            Self::Scaleway(_) => ProviderKind::Scaleway,
            Self::Memory(_) => ProviderKind::Memory,
        }
    }

    /// Membership encoding of the wrapped backend.
    #[must_use]
    pub fn membership(&self) -> MembershipEncoding {
        match self {
            Self::Scaleway(fleet) => fleet.membership(),
            Self::Memory(fleet) => fleet.membership(),
        }
    }

    /// Forwards to [`Fleet::acquire`].
    ///
    /// # Errors
    ///
    /// Returns the fleet error with the backend error unified.
    pub async fn acquire(
        &self,
        count: usize,
        options: &AcquireOptions,
    ) -> Result<BatchResult, FleetError<ProviderBackendError>> {
        match self {
            Self::Scaleway(fleet) => fleet.acquire(count, options).await.map_err(unify),
            Self::Memory(fleet) => fleet.acquire(count, options).await.map_err(unify),
        }
    }

    /// Forwards to [`Fleet::list`].
    ///
    /// # Errors
    ///
    /// Returns the fleet error with the backend error unified.
    pub async fn list(
        &self,
        batch_id: Option<&BatchId>,
    ) -> Result<Vec<ServerSummary>, FleetError<ProviderBackendError>> {
        match self {
            Self::Scaleway(fleet) => fleet.list(batch_id).await.map_err(unify),
            Self::Memory(fleet) => fleet.list(batch_id).await.map_err(unify),
        }
    }

    /// Forwards to [`Fleet::release`].
    ///
    /// # Errors
    ///
    /// Returns the fleet error with the backend error unified.
    pub async fn release(
        &self,
        batch_id: &BatchId,
    ) -> Result<ReleaseReport, FleetError<ProviderBackendError>> {
        match self {
            Self::Scaleway(fleet) => fleet.release(batch_id).await.map_err(unify),
            Self::Memory(fleet) => fleet.release(batch_id).await.map_err(unify),
        }
    }

    /// Forwards to [`Fleet::release_older_than`].
    ///
    /// # Errors
    ///
    /// Returns the fleet error with the backend error unified.
    pub async fn release_older_than(
        &self,
        max_age: Duration,
    ) -> Result<ReleaseReport, FleetError<ProviderBackendError>> {
        match self {
            Self::Scaleway(fleet) => fleet.release_older_than(max_age).await.map_err(unify),
            Self::Memory(fleet) => fleet.release_older_than(max_age).await.map_err(unify),
        }
    }
}

fn unify<E>(err: FleetError<E>) -> FleetError<ProviderBackendError>
where
    E: std::error::Error + 'static,
    ProviderBackendError: From<E>,
{
    err.map_backend(ProviderBackendError::from)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::config::FleetConfig;

    fn settings(provider: &str) -> Settings {
        Settings::new(FleetConfig {
            provider: provider.to_owned(),
            name: String::from("worker"),
            timeout_secs: 900,
            poll_interval_secs: 5,
            public_ip: true,
            ipv6: false,
        })
    }

    #[rstest]
    #[case("scaleway", ProviderKind::Scaleway)]
    #[case("memory", ProviderKind::Memory)]
    #[case(" Memory ", ProviderKind::Memory)]
    fn vendor_keys_parse(#[case] key: &str, #[case] expected: ProviderKind) {
        assert_eq!(key.parse::<ProviderKind>(), Ok(expected));
    }

    #[rstest]
    fn unknown_vendors_are_rejected() {
        assert_eq!(
            "digitalocean".parse::<ProviderKind>(),
            Err(ProviderError::UnknownVendor {
                vendor: String::from("digitalocean"),
            })
        );
    }

    #[rstest]
    fn memory_provider_takes_fleet_defaults() {
        let provider = Provider::from_settings(&settings("memory"))
            .unwrap_or_else(|err| panic!("provider: {err}"));
        assert_eq!(provider.kind(), ProviderKind::Memory);
        assert_eq!(provider.membership(), MembershipEncoding::Name);
        let Provider::Memory(fleet) = provider else {
            panic!("expected the memory provider");
        };
        assert_eq!(fleet.backend().default_spec().name, "worker");
    }

    #[rstest]
    fn scaleway_provider_validates_preloaded_settings() {
        let incomplete = crate::config::ScalewayConfig {
            access_key: None,
            secret_key: String::new(),
            default_organization_id: None,
            default_project_id: String::from("proj"),
            default_zone: String::from("fr-par-1"),
            default_instance_type: String::from("DEV1-S"),
            default_image: String::from("Ubuntu 24.04 Noble Numbat"),
            default_architecture: String::from("x86_64"),
        };
        let result = Provider::from_kind(
            ProviderKind::Scaleway,
            &settings("scaleway").with_scaleway(incomplete),
        );
        assert!(
            matches!(result, Err(ProviderError::Config(ConfigError::MissingField(_)))),
            "unexpected outcome: {result:?}"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn memory_provider_forwards_the_batch_lifecycle() {
        let provider = Provider::from_settings(&settings("memory"))
            .unwrap_or_else(|err| panic!("provider: {err}"));
        let options = AcquireOptions::default()
            .with_timeout(Duration::from_secs(2))
            .with_poll_interval(Duration::from_millis(2));
        let batch = provider
            .acquire(2, &options)
            .await
            .unwrap_or_else(|err| panic!("acquire: {err}"));
        let listed = provider
            .list(Some(&batch.batch_id))
            .await
            .unwrap_or_else(|err| panic!("list: {err}"));
        assert_eq!(listed.len(), 2);
        let report = provider
            .release(&batch.batch_id)
            .await
            .unwrap_or_else(|err| panic!("release: {err}"));
        assert_eq!(report.deleted(), 2);
    }
}
