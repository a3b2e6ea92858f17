//! Community image to gallery pipeline
//!
//! Steps run strictly in order, each blocking on its long-running
//! operation before the next is submitted:
//!
//! 1. managed disk from the community image
//! 2. managed image from the disk
//! 3. gallery (create-or-update)
//! 4. image definition (create-or-update)
//! 5. image version from the managed image
//!
//! The transient image and disk are then deleted on a best-effort basis.

use crate::config::CopyConfig;
use crate::error::{Phase, PipelineError, Resource, Result};
use podimage_azure::{
    ComputeApi, Disk, Gallery, GalleryImage, GalleryImageVersion, Image, LongRunningOperation,
};
use std::fmt;
use std::future::Future;

/// The gallery image version produced by a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVersionRef {
    pub gallery: String,
    pub definition: String,
    pub version: String,
}

impl fmt::Display for ImageVersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.gallery, self.definition, self.version)
    }
}

pub struct CopyImagePipeline<'a, C: ComputeApi> {
    compute: &'a C,
    config: &'a CopyConfig,
}

impl<'a, C: ComputeApi> CopyImagePipeline<'a, C> {
    pub fn new(compute: &'a C, config: &'a CopyConfig) -> Self {
        Self { compute, config }
    }

    pub async fn run(&self) -> Result<ImageVersionRef> {
        let cfg = self.config;
        let rg = cfg.resource_group.as_str();

        tracing::info!(
            "Creating managed disk {} from {}",
            cfg.managed_disk_name,
            cfg.community_image_id
        );
        let disk = Disk::from_community_image(&cfg.location, &cfg.community_image_id);
        self.provision(
            Resource::Disk,
            self.compute
                .begin_create_or_update_disk(rg, &cfg.managed_disk_name, &disk),
        )
        .await?;

        tracing::info!("Creating managed image {}", cfg.user_image_name);
        let image = Image::generalized_linux(&cfg.location, &cfg.disk_id());
        self.provision(
            Resource::ManagedImage,
            self.compute
                .begin_create_or_update_image(rg, &cfg.user_image_name, &image),
        )
        .await?;

        tracing::info!("Creating gallery {}", cfg.gallery_name);
        let gallery = Gallery::new(&cfg.location);
        self.provision(
            Resource::Gallery,
            self.compute
                .begin_create_or_update_gallery(rg, &cfg.gallery_name, &gallery),
        )
        .await?;

        tracing::info!(
            "Creating image definition {}/{}",
            cfg.gallery_name,
            cfg.definition_name
        );
        let definition = GalleryImage::confidential_vm(&cfg.location, cfg.image_identifier());
        self.provision(
            Resource::ImageDefinition,
            self.compute.begin_create_or_update_gallery_image(
                rg,
                &cfg.gallery_name,
                &cfg.definition_name,
                &definition,
            ),
        )
        .await?;

        tracing::info!(
            "Creating image version {}/{}/{} in {:?}",
            cfg.gallery_name,
            cfg.definition_name,
            cfg.version_name,
            cfg.target_regions
        );
        let version =
            GalleryImageVersion::from_managed_image(&cfg.location, &cfg.image_id(), &cfg.target_regions);
        self.provision(
            Resource::ImageVersion,
            self.compute.begin_create_or_update_gallery_image_version(
                rg,
                &cfg.gallery_name,
                &cfg.definition_name,
                &cfg.version_name,
                &version,
            ),
        )
        .await?;

        self.cleanup().await;

        let created = ImageVersionRef {
            gallery: cfg.gallery_name.clone(),
            definition: cfg.definition_name.clone(),
            version: cfg.version_name.clone(),
        };
        tracing::info!("image version {} created successfully", created);
        Ok(created)
    }

    /// Submit one operation and wait for it, tagging failures with the
    /// phase they happened in
    async fn provision<F>(&self, resource: Resource, submit: F) -> Result<()>
    where
        F: Future<Output = podimage_azure::Result<C::Operation>>,
    {
        let operation = submit.await.map_err(|source| PipelineError {
            phase: Phase::Create,
            resource,
            source,
        })?;

        operation.wait().await.map_err(|source| PipelineError {
            phase: Phase::Wait,
            resource,
            source,
        })
    }

    async fn cleanup(&self) {
        let cfg = self.config;
        let rg = cfg.resource_group.as_str();

        tracing::info!("Deleting temporary managed image {}", cfg.user_image_name);
        discard(
            "deleting temporary managed image",
            self.compute.begin_delete_image(rg, &cfg.user_image_name),
        )
        .await;

        tracing::info!("Deleting temporary managed disk {}", cfg.managed_disk_name);
        discard(
            "deleting temporary managed disk",
            self.compute.begin_delete_disk(rg, &cfg.managed_disk_name),
        )
        .await;
    }
}

async fn discard<O, F>(step: &str, submit: F)
where
    O: LongRunningOperation,
    F: Future<Output = podimage_azure::Result<O>>,
{
    let result = match submit.await {
        Ok(operation) => operation.wait().await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::debug!("{}: {}", step, e);
    }
}
