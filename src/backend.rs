//! Backend abstraction for provisioning batches of disposable instances.

use std::fmt;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::naming::{MembershipEncoding, NamingError, validate_tag};

/// Provider-assigned instance identifier.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Wraps a provider identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for InstanceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle state reported by the provider, normalised across backends.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InstanceStatus {
    /// Created but not yet serving (new, starting, allocating).
    Pending,
    /// Booted and reachable; the target of the provisioning loop.
    Active,
    /// Any other provider state, kept verbatim.
    Other(String),
}

impl InstanceStatus {
    /// Returns `true` for [`InstanceStatus::Active`].
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Provider-reported state of one instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceRecord {
    /// Provider identifier.
    pub id: InstanceId,
    /// Name as stored by the provider (may embed the batch marker).
    pub name: String,
    /// Current lifecycle state.
    pub status: InstanceStatus,
    /// Network addresses; empty until the provider assigns them.
    pub addresses: Vec<IpAddr>,
    /// Creation timestamp exactly as reported by the provider (RFC 3339).
    pub created_at: String,
    /// Tags currently visible on the instance.
    pub tags: Vec<String>,
}

impl InstanceRecord {
    /// Returns the first IPv4 address, if one has been assigned.
    #[must_use]
    pub fn first_ipv4(&self) -> Option<Ipv4Addr> {
        self.addresses.iter().find_map(|address| match address {
            IpAddr::V4(v4) => Some(*v4),
            IpAddr::V6(_) => None,
        })
    }
}

/// Server-side narrowing applied when listing instances.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ListFilter {
    /// Every instance visible to the credentials.
    All,
    /// Only instances carrying the given tag.
    Tagged(String),
}

impl ListFilter {
    /// Returns `true` when `record` passes the filter.
    #[must_use]
    pub fn matches(&self, record: &InstanceRecord) -> bool {
        match self {
            Self::All => true,
            Self::Tagged(tag) => record.tags.iter().any(|candidate| candidate == tag),
        }
    }
}

/// Desired configuration for one instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceSpec {
    /// Provider-visible name.
    pub name: String,
    /// Human readable image label; backends resolve it to an image id.
    pub image: String,
    /// Region or availability zone (for example `fr-par-1`).
    pub region: String,
    /// Commercial type or size (for example `DEV1-S`).
    pub size: String,
    /// Whether a public IPv4 address is requested.
    pub public_ip: bool,
    /// Whether IPv6 is enabled.
    pub ipv6: bool,
    /// Tags applied at creation.
    pub tags: Vec<String>,
}

impl InstanceSpec {
    /// Starts a builder for an [`InstanceSpec`].
    #[must_use]
    pub fn builder() -> InstanceSpecBuilder {
        InstanceSpecBuilder::new()
    }

    /// Validates the spec, returning a descriptive error when a required
    /// field is missing or a tag is malformed.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Validation`] when a string field is empty and
    /// [`BackendError::Tag`] when a tag violates the provider constraints.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.image.is_empty() {
            return Err(BackendError::Validation("image".to_owned()));
        }
        if self.region.is_empty() {
            return Err(BackendError::Validation("region".to_owned()));
        }
        if self.size.is_empty() {
            return Err(BackendError::Validation("size".to_owned()));
        }
        for tag in &self.tags {
            validate_tag(tag)?;
        }
        Ok(())
    }

    /// Returns a copy of this spec with `overrides` applied.
    #[must_use]
    pub fn merged(&self, overrides: &InstanceOverrides) -> Self {
        let mut tags = self.tags.clone();
        tags.extend(overrides.tags.iter().cloned());
        Self {
            name: overrides.name.clone().unwrap_or_else(|| self.name.clone()),
            image: overrides.image.clone().unwrap_or_else(|| self.image.clone()),
            region: overrides.region.clone().unwrap_or_else(|| self.region.clone()),
            size: overrides.size.clone().unwrap_or_else(|| self.size.clone()),
            public_ip: overrides.public_ip.unwrap_or(self.public_ip),
            ipv6: overrides.ipv6.unwrap_or(self.ipv6),
            tags,
        }
    }
}

/// Caller overrides merged over a backend's default [`InstanceSpec`].
///
/// Tags are appended to the defaults rather than replacing them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InstanceOverrides {
    /// Replacement base name.
    pub name: Option<String>,
    /// Replacement image label.
    pub image: Option<String>,
    /// Replacement region.
    pub region: Option<String>,
    /// Replacement size.
    pub size: Option<String>,
    /// Replacement public IPv4 flag.
    pub public_ip: Option<bool>,
    /// Replacement IPv6 flag.
    pub ipv6: Option<bool>,
    /// Additional tags.
    pub tags: Vec<String>,
}

/// Builder for [`InstanceSpec`] that defers trimming and validation to
/// construction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InstanceSpecBuilder {
    name: String,
    image: String,
    region: String,
    size: String,
    public_ip: bool,
    ipv6: bool,
    tags: Vec<String>,
}

impl InstanceSpecBuilder {
    /// Creates an empty builder; fields must be populated before build.
    #[must_use]
    pub fn new() -> Self {
        Self {
            public_ip: true,
            ..Self::default()
        }
    }

    /// Sets the base name.
    #[must_use]
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = value.into();
        self
    }

    /// Sets the image label.
    #[must_use]
    pub fn image(mut self, value: impl Into<String>) -> Self {
        self.image = value.into();
        self
    }

    /// Sets the region.
    #[must_use]
    pub fn region(mut self, value: impl Into<String>) -> Self {
        self.region = value.into();
        self
    }

    /// Sets the size.
    #[must_use]
    pub fn size(mut self, value: impl Into<String>) -> Self {
        self.size = value.into();
        self
    }

    /// Sets whether a public IPv4 address is requested.
    #[must_use]
    pub const fn public_ip(mut self, value: bool) -> Self {
        self.public_ip = value;
        self
    }

    /// Sets whether IPv6 is enabled.
    #[must_use]
    pub const fn ipv6(mut self, value: bool) -> Self {
        self.ipv6 = value;
        self
    }

    /// Appends a tag.
    #[must_use]
    pub fn tag(mut self, value: impl Into<String>) -> Self {
        self.tags.push(value.into());
        self
    }

    /// Builds and validates the [`InstanceSpec`], trimming string inputs.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when a required field is empty or a tag is
    /// malformed.
    pub fn build(self) -> Result<InstanceSpec, BackendError> {
        let spec = InstanceSpec {
            name: self.name.trim().to_owned(),
            image: self.image.trim().to_owned(),
            region: self.region.trim().to_owned(),
            size: self.size.trim().to_owned(),
            public_ip: self.public_ip,
            ipv6: self.ipv6,
            tags: self.tags.iter().map(|tag| tag.trim().to_owned()).collect(),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// Errors raised while validating instance specs.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BackendError {
    /// Raised when a spec is missing a required field.
    #[error("missing or empty field: {0}")]
    Validation(String),
    /// Raised when a tag violates the provider constraints.
    #[error("invalid tag: {0}")]
    Tag(#[from] NamingError),
}

/// Future returned by backend operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface implemented by cloud backends.
pub trait Backend {
    /// Provider specific error type returned by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// How this backend correlates instances with their batch.
    fn membership(&self) -> MembershipEncoding;

    /// Default spec that caller overrides are merged into.
    fn default_spec(&self) -> InstanceSpec;

    /// Submits one creation request for every spec and returns the
    /// acknowledged records. Tags and addresses may still be empty.
    ///
    /// Implementations must not leave instances behind when they return an
    /// error.
    fn create<'a>(
        &'a self,
        specs: &'a [InstanceSpec],
    ) -> BackendFuture<'a, Vec<InstanceRecord>, Self::Error>;

    /// Lists the instances matching `filter`.
    fn list<'a>(
        &'a self,
        filter: &'a ListFilter,
    ) -> BackendFuture<'a, Vec<InstanceRecord>, Self::Error>;

    /// Requests deletion of one instance.
    fn delete<'a>(&'a self, id: &'a InstanceId) -> BackendFuture<'a, (), Self::Error>;
}
