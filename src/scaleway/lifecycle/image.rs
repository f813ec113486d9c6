//! Image label resolution for the Scaleway backend.

use std::future::Future;

use scaleway_rs::{ScalewayImage, ScalewayListInstanceImagesBuilder};

use super::super::{ScalewayBackend, ScalewayBackendError};

/// Label, architecture, and zone an image must match.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(in crate::scaleway) struct ImageQuery<'a> {
    pub(in crate::scaleway) label: &'a str,
    pub(in crate::scaleway) arch: &'a str,
    pub(in crate::scaleway) zone: &'a str,
}

impl ScalewayBackend {
    pub(in crate::scaleway) fn image_query<'a>(&'a self, label: &'a str) -> ImageQuery<'a> {
        ImageQuery {
            label,
            arch: &self.config.default_architecture,
            zone: self.zone(),
        }
    }

    /// Resolves `label` to the newest available image id, preferring images
    /// scoped to the configured project over public ones.
    pub(in crate::scaleway) async fn resolve_image_id(
        &self,
        label: &str,
    ) -> Result<String, ScalewayBackendError> {
        let query = self.image_query(label);
        self.resolve_image_id_with(
            &query,
            || self.fetch_project_images(&query),
            || async {
                ScalewayListInstanceImagesBuilder::new(self.api.clone(), query.zone)
                    .public(true)
                    .name(query.label)
                    .arch(query.arch)
                    .run_async()
                    .await
                    .map_err(ScalewayBackendError::from)
            },
        )
        .await
    }

    async fn fetch_project_images(
        &self,
        query: &ImageQuery<'_>,
    ) -> Result<Vec<ScalewayImage>, ScalewayBackendError> {
        if self.config.default_project_id.is_empty() {
            return Ok(Vec::new());
        }
        let mut scoped = ScalewayListInstanceImagesBuilder::new(self.api.clone(), query.zone)
            .public(true)
            .project(&self.config.default_project_id)
            .name(query.label)
            .arch(query.arch);
        if let Some(org) = &self.config.default_organization_id {
            scoped = scoped.organization(org);
        }
        scoped.run_async().await.map_err(ScalewayBackendError::from)
    }

    pub(in crate::scaleway) async fn resolve_image_id_with<FutA, FutB, FetchA, FetchB>(
        &self,
        query: &ImageQuery<'_>,
        project_fetch: FetchA,
        public_fetch: FetchB,
    ) -> Result<String, ScalewayBackendError>
    where
        FetchA: FnOnce() -> FutA,
        FetchB: FnOnce() -> FutB,
        FutA: Future<Output = Result<Vec<ScalewayImage>, ScalewayBackendError>>,
        FutB: Future<Output = Result<Vec<ScalewayImage>, ScalewayBackendError>>,
    {
        let project_images = project_fetch().await?;
        let candidates = if project_images.is_empty() {
            public_fetch().await?
        } else {
            project_images
        };
        Self::select_image_id(Self::filter_images(candidates, query), query)
    }

    pub(in crate::scaleway) fn select_image_id(
        candidates: Vec<ScalewayImage>,
        query: &ImageQuery<'_>,
    ) -> Result<String, ScalewayBackendError> {
        candidates
            .into_iter()
            .max_by(|lhs, rhs| lhs.creation_date.cmp(&rhs.creation_date))
            .map(|image| image.id)
            .ok_or_else(|| ScalewayBackendError::ImageNotFound {
                label: query.label.to_owned(),
                arch: query.arch.to_owned(),
                zone: query.zone.to_owned(),
            })
    }

    pub(in crate::scaleway) fn filter_images(
        images: Vec<ScalewayImage>,
        query: &ImageQuery<'_>,
    ) -> Vec<ScalewayImage> {
        images
            .into_iter()
            .filter(|image| image.arch == query.arch)
            .filter(|image| image.state == "available")
            .collect()
    }
}
