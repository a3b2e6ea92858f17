//! Compute resource operations
//!
//! [`ComputeApi`] is the seam between the image pipeline and ARM: every
//! method submits one create-or-update or delete and returns an operation
//! that can be awaited separately, so callers can tell a rejected request
//! from an operation that later failed.

use crate::client::ArmClient;
use crate::error::Result;
use crate::models::{Disk, Gallery, GalleryImage, GalleryImageVersion, Image};
use crate::poller::Poller;
use crate::resource_id::ResourceId;
use async_trait::async_trait;
use std::sync::Arc;

pub const DISKS_API_VERSION: &str = "2023-04-02";
pub const IMAGES_API_VERSION: &str = "2023-07-01";
pub const GALLERIES_API_VERSION: &str = "2022-08-03";

/// A submitted operation that has not necessarily finished
#[async_trait]
pub trait LongRunningOperation: Send {
    /// Block until the operation reaches a terminal state
    async fn wait(self) -> Result<()>;
}

#[async_trait]
impl LongRunningOperation for Poller {
    async fn wait(self) -> Result<()> {
        self.poll_until_done().await.map(|_| ())
    }
}

/// Compute operations used to promote an image into a gallery
#[async_trait]
pub trait ComputeApi: Send + Sync {
    type Operation: LongRunningOperation;

    async fn begin_create_or_update_disk(
        &self,
        resource_group: &str,
        name: &str,
        disk: &Disk,
    ) -> Result<Self::Operation>;

    async fn begin_create_or_update_image(
        &self,
        resource_group: &str,
        name: &str,
        image: &Image,
    ) -> Result<Self::Operation>;

    async fn begin_create_or_update_gallery(
        &self,
        resource_group: &str,
        gallery: &str,
        body: &Gallery,
    ) -> Result<Self::Operation>;

    async fn begin_create_or_update_gallery_image(
        &self,
        resource_group: &str,
        gallery: &str,
        definition: &str,
        body: &GalleryImage,
    ) -> Result<Self::Operation>;

    async fn begin_create_or_update_gallery_image_version(
        &self,
        resource_group: &str,
        gallery: &str,
        definition: &str,
        version: &str,
        body: &GalleryImageVersion,
    ) -> Result<Self::Operation>;

    async fn begin_delete_image(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Self::Operation>;

    async fn begin_delete_disk(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Self::Operation>;
}

/// ARM-backed [`ComputeApi`] scoped to one subscription
pub struct ComputeClient {
    arm: Arc<ArmClient>,
    subscription_id: String,
}

impl ComputeClient {
    pub fn new(arm: Arc<ArmClient>, subscription_id: impl Into<String>) -> Self {
        Self {
            arm,
            subscription_id: subscription_id.into(),
        }
    }
}

#[async_trait]
impl ComputeApi for ComputeClient {
    type Operation = Poller;

    async fn begin_create_or_update_disk(
        &self,
        resource_group: &str,
        name: &str,
        disk: &Disk,
    ) -> Result<Poller> {
        let id = ResourceId::disk(&self.subscription_id, resource_group, name);
        self.arm.put(id.as_str(), DISKS_API_VERSION, disk).await
    }

    async fn begin_create_or_update_image(
        &self,
        resource_group: &str,
        name: &str,
        image: &Image,
    ) -> Result<Poller> {
        let id = ResourceId::image(&self.subscription_id, resource_group, name);
        self.arm.put(id.as_str(), IMAGES_API_VERSION, image).await
    }

    async fn begin_create_or_update_gallery(
        &self,
        resource_group: &str,
        gallery: &str,
        body: &Gallery,
    ) -> Result<Poller> {
        let id = ResourceId::gallery(&self.subscription_id, resource_group, gallery);
        self.arm.put(id.as_str(), GALLERIES_API_VERSION, body).await
    }

    async fn begin_create_or_update_gallery_image(
        &self,
        resource_group: &str,
        gallery: &str,
        definition: &str,
        body: &GalleryImage,
    ) -> Result<Poller> {
        let id = ResourceId::gallery_image(&self.subscription_id, resource_group, gallery, definition);
        self.arm.put(id.as_str(), GALLERIES_API_VERSION, body).await
    }

    async fn begin_create_or_update_gallery_image_version(
        &self,
        resource_group: &str,
        gallery: &str,
        definition: &str,
        version: &str,
        body: &GalleryImageVersion,
    ) -> Result<Poller> {
        let id = ResourceId::gallery_image_version(
            &self.subscription_id,
            resource_group,
            gallery,
            definition,
            version,
        );
        self.arm.put(id.as_str(), GALLERIES_API_VERSION, body).await
    }

    async fn begin_delete_image(&self, resource_group: &str, name: &str) -> Result<Poller> {
        let id = ResourceId::image(&self.subscription_id, resource_group, name);
        self.arm.delete(id.as_str(), IMAGES_API_VERSION).await
    }

    async fn begin_delete_disk(&self, resource_group: &str, name: &str) -> Result<Poller> {
        let id = ResourceId::disk(&self.subscription_id, resource_group, name);
        self.arm.delete(id.as_str(), DISKS_API_VERSION).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_disk_targets_disks_api() {
        let server = MockServer::start_async().await;
        let disk = Disk::from_community_image("eastus", "/CommunityGalleries/x/Images/y/Versions/1");
        let expected_body = serde_json::to_value(&disk).unwrap();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/disks/tmp-disk")
                .query_param("api-version", DISKS_API_VERSION)
                .json_body(expected_body);
            then.status(200)
                .json_body(json!({"properties": {"provisioningState": "Succeeded"}}));
        });

        let compute = ComputeClient::new(test_client(&server), "sub");
        compute
            .begin_create_or_update_disk("rg", "tmp-disk", &disk)
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_delete_image_targets_images_api() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/images/tmp-image")
                .query_param("api-version", IMAGES_API_VERSION);
            then.status(204);
        });

        let compute = ComputeClient::new(test_client(&server), "sub");
        compute
            .begin_delete_image("rg", "tmp-image")
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_image_version_is_nested_under_definition() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute/galleries/g/images/d/versions/1.0.0")
                .query_param("api-version", GALLERIES_API_VERSION);
            then.status(201)
                .json_body(json!({"properties": {"provisioningState": "Succeeded"}}));
        });

        let compute = ComputeClient::new(test_client(&server), "sub");
        let image = ResourceId::image("sub", "rg", "i");
        let body = GalleryImageVersion::from_managed_image("eastus", &image, &["eastus".to_string()]);
        compute
            .begin_create_or_update_gallery_image_version("rg", "g", "d", "1.0.0", &body)
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();

        mock.assert();
    }
}
