//! Wire types for the Scaleway Instances API and their mapping onto
//! backend records.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::backend::{InstanceId, InstanceRecord, InstanceStatus};

/// Body of `POST /zones/{zone}/servers`.
#[derive(Debug, Serialize)]
pub(crate) struct CreateServerRequest {
    pub(crate) name: String,
    pub(crate) commercial_type: String,
    pub(crate) image: String,
    pub(crate) project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) organization: Option<String>,
    pub(crate) routed_ip_enabled: bool,
    pub(crate) dynamic_ip_required: bool,
    pub(crate) enable_ipv6: bool,
    pub(crate) tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServerEnvelope {
    pub(crate) server: ServerView,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServerPage {
    #[serde(default)]
    pub(crate) servers: Vec<ServerView>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddressView {
    pub(crate) address: String,
}

/// The subset of a Scaleway server the backend reads.
#[derive(Debug, Deserialize)]
pub(crate) struct ServerView {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) state: String,
    #[serde(default)]
    pub(crate) creation_date: String,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
    #[serde(default)]
    pub(crate) public_ip: Option<AddressView>,
    #[serde(default)]
    pub(crate) public_ips: Vec<AddressView>,
    #[serde(default)]
    pub(crate) ipv6: Option<AddressView>,
}

impl ServerView {
    fn addresses(&self) -> Vec<IpAddr> {
        let mut addresses: Vec<IpAddr> = Vec::new();
        let candidates = self
            .public_ips
            .iter()
            .chain(self.public_ip.as_ref())
            .chain(self.ipv6.as_ref());
        for candidate in candidates {
            if let Ok(address) = candidate.address.parse::<IpAddr>()
                && !addresses.contains(&address)
            {
                addresses.push(address);
            }
        }
        addresses
    }
}

impl From<ServerView> for InstanceRecord {
    fn from(server: ServerView) -> Self {
        let addresses = server.addresses();
        Self {
            id: InstanceId::new(server.id),
            name: server.name,
            status: status_of(&server.state),
            addresses,
            created_at: server.creation_date,
            tags: server.tags,
        }
    }
}

/// Maps a Scaleway server state onto the normalised status.
pub(crate) fn status_of(state: &str) -> InstanceStatus {
    match state {
        "running" => InstanceStatus::Active,
        "stopped" | "starting" => InstanceStatus::Pending,
        other => InstanceStatus::Other(other.to_owned()),
    }
}
