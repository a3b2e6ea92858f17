//! Command-line configuration

use crate::error::ConfigError;
use clap::Parser;
use podimage_azure::{DEFAULT_ENDPOINT, GalleryImageIdentifier, ResourceId};
use std::ffi::OsString;
use std::time::Duration;

pub const DEFAULT_TARGET_REGIONS: &str = "westeurope,koreasouth,eastus";

const IMAGE_PUBLISHER: &str = "cvm-publisher";
const IMAGE_OFFER: &str = "cvm-offer";
const IMAGE_SKU: &str = "cvm-sku";

#[derive(Parser, Debug, Clone)]
#[command(name = "copy-image", version)]
#[command(
    about = "Copy a community gallery image into a private shared image gallery",
    long_about = None
)]
pub struct CopyImageArgs {
    /// Azure subscription ID
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    pub subscription_id: Option<String>,

    /// Resource group name
    #[arg(long, env = "AZURE_RESOURCE_GROUP")]
    pub resource_group: Option<String>,

    /// Azure region
    #[arg(long, env = "AZURE_REGION")]
    pub location: Option<String>,

    /// Community gallery image version resource ID
    #[arg(long)]
    pub community_image_id: Option<String>,

    /// Name of the temporary managed image
    #[arg(long, default_value = "from-community-gallery-user-image")]
    pub user_image_name: String,

    /// Name of the temporary managed disk
    #[arg(long, default_value = "from-community-gallery")]
    pub managed_disk_name: String,

    /// Shared Image Gallery name
    #[arg(long, default_value = "my_gallery")]
    pub gallery_name: String,

    /// Image definition name
    #[arg(long, default_value = "my-def-cvm")]
    pub definition_name: String,

    /// Image version name
    #[arg(long, default_value = "0.0.1")]
    pub version_name: String,

    /// Comma separated target regions
    #[arg(long, default_value = DEFAULT_TARGET_REGIONS)]
    pub target_regions: String,

    /// Azure Resource Manager endpoint
    #[arg(long, env = "AZURE_RESOURCE_MANAGER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub arm_endpoint: String,

    /// Seconds between operation status checks, unless the service asks otherwise
    #[arg(long, default_value_t = 30)]
    pub poll_interval: u64,
}

/// Validated settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyConfig {
    pub subscription_id: String,
    pub resource_group: String,
    pub location: String,
    pub community_image_id: String,
    pub user_image_name: String,
    pub managed_disk_name: String,
    pub gallery_name: String,
    pub definition_name: String,
    pub version_name: String,
    pub target_regions: Vec<String>,
    pub arm_endpoint: String,
    pub poll_interval: Duration,
}

impl CopyImageArgs {
    /// Parse process arguments, accepting Go-style `-flag` spellings
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_flag_style(std::env::args_os()))
    }

    /// Check required fields before anything touches the network
    pub fn validate(self) -> Result<CopyConfig, ConfigError> {
        let subscription_id = non_empty(self.subscription_id);
        let resource_group = non_empty(self.resource_group);
        let location = non_empty(self.location);
        let community_image_id = non_empty(self.community_image_id);

        let (Some(subscription_id), Some(resource_group), Some(location), Some(community_image_id)) =
            (subscription_id.clone(), resource_group.clone(), location.clone(), community_image_id.clone())
        else {
            return Err(ConfigError::MissingRequired(missing_fields(
                &subscription_id,
                &resource_group,
                &location,
                &community_image_id,
            )));
        };

        Ok(CopyConfig {
            subscription_id,
            resource_group,
            location,
            community_image_id,
            user_image_name: self.user_image_name,
            managed_disk_name: self.managed_disk_name,
            gallery_name: self.gallery_name,
            definition_name: self.definition_name,
            version_name: self.version_name,
            target_regions: parse_target_regions(&self.target_regions),
            arm_endpoint: self.arm_endpoint,
            poll_interval: Duration::from_secs(self.poll_interval),
        })
    }
}

impl CopyConfig {
    /// ID of the transient managed disk
    pub fn disk_id(&self) -> ResourceId {
        ResourceId::disk(
            &self.subscription_id,
            &self.resource_group,
            &self.managed_disk_name,
        )
    }

    /// ID of the transient managed image
    pub fn image_id(&self) -> ResourceId {
        ResourceId::image(
            &self.subscription_id,
            &self.resource_group,
            &self.user_image_name,
        )
    }

    pub fn image_identifier(&self) -> GalleryImageIdentifier {
        GalleryImageIdentifier {
            publisher: IMAGE_PUBLISHER.to_string(),
            offer: IMAGE_OFFER.to_string(),
            sku: IMAGE_SKU.to_string(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn missing_fields(
    subscription_id: &Option<String>,
    resource_group: &Option<String>,
    location: &Option<String>,
    community_image_id: &Option<String>,
) -> Vec<&'static str> {
    [
        ("subscription-id", subscription_id.is_none()),
        ("resource-group", resource_group.is_none()),
        ("location", location.is_none()),
        ("community-image-id", community_image_id.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, missing)| missing.then_some(name))
    .collect()
}

/// Split on commas, trim, and drop empty entries
pub fn parse_target_regions(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Rewrite `-flag` to `--flag` so Go-style invocations keep working.
///
/// Single-character flags such as `-h` and everything after a bare `--`
/// are left alone.
pub fn normalize_flag_style<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;

    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            let arg: OsString = arg.into();
            if i == 0 || passthrough {
                return arg;
            }
            if arg == "--" {
                passthrough = true;
                return arg;
            }
            match arg.to_str() {
                Some(s) if s.len() > 2 && s.starts_with('-') && !s.starts_with("--") => {
                    OsString::from(format!("-{}", s))
                }
                _ => arg,
            }
        })
        .collect()
}
