//! Azure provider for podimage
//!
//! A small Azure Resource Manager client covering what is needed to promote
//! an image into a shared image gallery.
//!
//! # Features
//!
//! - Bearer tokens from the `azure_identity` default credential chain
//! - Retries on throttling and transient server errors
//! - Long-running operation polling
//! - Managed disk, managed image and gallery operations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            ComputeApi (trait)             │
//! │   begin_create_or_update_* / begin_delete_*│
//! └─────────────────┬────────────────────────┘
//!                   │ ComputeClient
//! ┌─────────────────▼────────────────────────┐
//! │                ArmClient                  │
//! │   PUT / DELETE / GET  ──▶  Poller         │
//! └───────┬──────────────────────────────────┘
//!         │ bearer token
//! ┌───────▼──────────────────────────────────┐
//! │      IdentityCredential (TokenProvider)   │
//! │   azure_identity::DefaultAzureCredential  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use podimage_azure::{ArmClient, ComputeApi, ComputeClient, Gallery, IdentityCredential, LongRunningOperation};
//! use std::sync::Arc;
//!
//! let credential = IdentityCredential::from_default_chain()?;
//! let arm = Arc::new(ArmClient::new(Arc::new(credential)));
//! let compute = ComputeClient::new(arm, "00000000-0000-0000-0000-000000000000");
//!
//! compute
//!     .begin_create_or_update_gallery("my-rg", "my_gallery", &Gallery::new("eastus"))
//!     .await?
//!     .wait()
//!     .await?;
//! ```

pub mod client;
pub mod compute;
pub mod credential;
pub mod error;
pub mod models;
pub mod poller;
pub mod resource_id;

pub use client::{ArmClient, DEFAULT_ENDPOINT, RetryOptions};
pub use compute::{ComputeApi, ComputeClient, LongRunningOperation};
pub use credential::{IdentityCredential, TokenProvider, arm_scope};
pub use error::{ArmError, Result};
pub use models::{
    Disk, Gallery, GalleryImage, GalleryImageIdentifier, GalleryImageVersion, Image,
};
pub use poller::{OperationStatus, Poller, PollerOptions};
pub use resource_id::ResourceId;
