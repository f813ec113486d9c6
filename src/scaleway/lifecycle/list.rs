//! Paged server listing for the Scaleway backend.

use crate::backend::{InstanceRecord, ListFilter};
use crate::scaleway::types::ServerPage;

use super::super::{ScalewayBackend, ScalewayBackendError};
use super::{HTTP_CLIENT, servers_url};

/// Servers requested per page; the API caps `per_page` at 100.
pub(in crate::scaleway) const PAGE_SIZE: usize = 100;

/// A page shorter than [`PAGE_SIZE`] is the last one.
pub(in crate::scaleway) const fn is_last_page(received: usize) -> bool {
    received < PAGE_SIZE
}

impl ScalewayBackend {
    pub(in crate::scaleway) fn list_query(
        filter: &ListFilter,
        page: usize,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", PAGE_SIZE.to_string()),
        ];
        if let ListFilter::Tagged(tag) = filter {
            query.push(("tags", tag.clone()));
        }
        query
    }

    async fn fetch_page(
        &self,
        filter: &ListFilter,
        page: usize,
    ) -> Result<ServerPage, ScalewayBackendError> {
        let response = HTTP_CLIENT
            .get(servers_url(self.zone()))
            .header("X-Auth-Token", &self.config.secret_key)
            .query(&Self::list_query(filter, page))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ScalewayBackendError::Provider {
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        serde_json::from_slice(&body).map_err(ScalewayBackendError::provider)
    }

    /// Lists every server in the zone matching `filter`, following pages
    /// until a short page is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ScalewayBackendError::Provider`] when a page request fails.
    pub(in crate::scaleway) async fn list_servers(
        &self,
        filter: &ListFilter,
    ) -> Result<Vec<InstanceRecord>, ScalewayBackendError> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let servers = self.fetch_page(filter, page).await?.servers;
            let received = servers.len();
            records.extend(servers.into_iter().map(InstanceRecord::from));
            if is_last_page(received) {
                return Ok(records);
            }
            page += 1;
        }
    }
}
