//! `Microsoft.Compute` request bodies
//!
//! Only the fields this tool sends are modelled; everything serializes to
//! the camelCase JSON the REST API expects.

use crate::resource_id::ResourceId;
use serde::{Deserialize, Serialize};

// ============ Shared ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingSystemType {
    Linux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingSystemState {
    Generalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HyperVGeneration {
    V2,
}

/// Reference to another resource by ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResource {
    pub id: String,
}

impl From<&ResourceId> for SubResource {
    fn from(id: &ResourceId) -> Self {
        Self {
            id: id.as_str().to_string(),
        }
    }
}

// ============ Managed disk ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiskCreateOption {
    FromImage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImageReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_gallery_image_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationData {
    pub create_option: DiskCreateOption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery_image_reference: Option<GalleryImageReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskProperties {
    pub creation_data: CreationData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub location: String,
    pub properties: DiskProperties,
}

impl Disk {
    /// Disk whose contents come from a community gallery image version
    pub fn from_community_image(location: &str, community_image_id: &str) -> Self {
        Self {
            location: location.to_string(),
            properties: DiskProperties {
                creation_data: CreationData {
                    create_option: DiskCreateOption::FromImage,
                    gallery_image_reference: Some(GalleryImageReference {
                        community_gallery_image_id: Some(community_image_id.to_string()),
                    }),
                },
            },
        }
    }
}

// ============ Managed image ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOsDisk {
    pub os_type: OperatingSystemType,
    pub os_state: OperatingSystemState,
    pub managed_disk: SubResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStorageProfile {
    pub os_disk: ImageOsDisk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProperties {
    pub storage_profile: ImageStorageProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub location: String,
    pub properties: ImageProperties,
}

impl Image {
    /// Generalized Linux image captured from a managed disk
    pub fn generalized_linux(location: &str, disk: &ResourceId) -> Self {
        Self {
            location: location.to_string(),
            properties: ImageProperties {
                storage_profile: ImageStorageProfile {
                    os_disk: ImageOsDisk {
                        os_type: OperatingSystemType::Linux,
                        os_state: OperatingSystemState::Generalized,
                        managed_disk: disk.into(),
                    },
                },
            },
        }
    }
}

// ============ Shared image gallery ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gallery {
    pub location: String,
}

impl Gallery {
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImageIdentifier {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImageFeature {
    pub name: String,
    pub value: String,
}

impl GalleryImageFeature {
    /// Marks the definition as bootable on confidential VM sizes
    pub fn confidential_vm_supported() -> Self {
        Self {
            name: "SecurityType".to_string(),
            value: "ConfidentialVmSupported".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImageProperties {
    pub os_type: OperatingSystemType,
    pub os_state: OperatingSystemState,
    pub hyper_v_generation: HyperVGeneration,
    pub identifier: GalleryImageIdentifier,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<GalleryImageFeature>,
}

/// Image definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub location: String,
    pub properties: GalleryImageProperties,
}

impl GalleryImage {
    /// Generalized Linux, Gen2 definition tagged for confidential VMs
    pub fn confidential_vm(location: &str, identifier: GalleryImageIdentifier) -> Self {
        Self {
            location: location.to_string(),
            properties: GalleryImageProperties {
                os_type: OperatingSystemType::Linux,
                os_state: OperatingSystemState::Generalized,
                hyper_v_generation: HyperVGeneration::V2,
                identifier,
                features: vec![GalleryImageFeature::confidential_vm_supported()],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRegion {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImageVersionPublishingProfile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_regions: Vec<TargetRegion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImageVersionStorageProfile {
    pub source: SubResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImageVersionProperties {
    pub publishing_profile: GalleryImageVersionPublishingProfile,
    pub storage_profile: GalleryImageVersionStorageProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImageVersion {
    pub location: String,
    pub properties: GalleryImageVersionProperties,
}

impl GalleryImageVersion {
    /// Version sourced from a managed image, replicated to `target_regions`
    pub fn from_managed_image(location: &str, image: &ResourceId, target_regions: &[String]) -> Self {
        Self {
            location: location.to_string(),
            properties: GalleryImageVersionProperties {
                publishing_profile: GalleryImageVersionPublishingProfile {
                    target_regions: target_regions
                        .iter()
                        .map(|name| TargetRegion { name: name.clone() })
                        .collect(),
                },
                storage_profile: GalleryImageVersionStorageProfile {
                    source: image.into(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_disk_from_community_image() {
        let disk = Disk::from_community_image(
            "eastus",
            "/CommunityGalleries/cg-1/Images/podvm/Versions/1.0.0",
        );
        assert_eq!(
            serde_json::to_value(&disk).unwrap(),
            json!({
                "location": "eastus",
                "properties": {
                    "creationData": {
                        "createOption": "FromImage",
                        "galleryImageReference": {
                            "communityGalleryImageId": "/CommunityGalleries/cg-1/Images/podvm/Versions/1.0.0"
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_image_references_disk() {
        let disk = ResourceId::disk("sub", "rg", "d");
        let image = Image::generalized_linux("eastus", &disk);
        let value = serde_json::to_value(&image).unwrap();

        assert_eq!(
            value["properties"]["storageProfile"]["osDisk"],
            json!({
                "osType": "Linux",
                "osState": "Generalized",
                "managedDisk": {"id": disk.as_str()}
            })
        );
    }

    #[test]
    fn test_confidential_definition() {
        let definition = GalleryImage::confidential_vm(
            "eastus",
            GalleryImageIdentifier {
                publisher: "cvm-publisher".to_string(),
                offer: "cvm-offer".to_string(),
                sku: "cvm-sku".to_string(),
            },
        );
        let value = serde_json::to_value(&definition).unwrap();

        assert_eq!(value["properties"]["hyperVGeneration"], "V2");
        assert_eq!(
            value["properties"]["features"],
            json!([{"name": "SecurityType", "value": "ConfidentialVmSupported"}])
        );
        assert_eq!(value["properties"]["identifier"]["sku"], "cvm-sku");
    }

    #[test]
    fn test_version_target_regions() {
        let image = ResourceId::image("sub", "rg", "i");
        let version = GalleryImageVersion::from_managed_image(
            "eastus",
            &image,
            &["westeurope".to_string(), "eastus".to_string()],
        );
        let value = serde_json::to_value(&version).unwrap();

        assert_eq!(
            value["properties"]["publishingProfile"]["targetRegions"],
            json!([{"name": "westeurope"}, {"name": "eastus"}])
        );
        assert_eq!(
            value["properties"]["storageProfile"]["source"]["id"],
            image.as_str()
        );
    }

    #[test]
    fn test_version_without_regions_omits_field() {
        let image = ResourceId::image("sub", "rg", "i");
        let version = GalleryImageVersion::from_managed_image("eastus", &image, &[]);
        let value = serde_json::to_value(&version).unwrap();

        assert_eq!(value["properties"]["publishingProfile"], json!({}));
    }
}
