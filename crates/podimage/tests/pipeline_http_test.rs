use async_trait::async_trait;
use httpmock::prelude::*;
use podimage::{CopyConfig, CopyImagePipeline, Phase, Resource};
use podimage_azure::{ArmClient, ComputeClient, PollerOptions, RetryOptions, TokenProvider};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const PREFIX: &str = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Compute";

struct StaticCredential;

#[async_trait]
impl TokenProvider for StaticCredential {
    async fn bearer_token(&self, _scope: &str) -> podimage_azure::Result<String> {
        Ok("static-token".to_string())
    }
}

fn config(server: &MockServer) -> CopyConfig {
    CopyConfig {
        subscription_id: "sub".to_string(),
        resource_group: "rg".to_string(),
        location: "eastus".to_string(),
        community_image_id: "/CommunityGalleries/cg/Images/podvm/Versions/1.0.0".to_string(),
        user_image_name: "tmp-image".to_string(),
        managed_disk_name: "tmp-disk".to_string(),
        gallery_name: "my_gallery".to_string(),
        definition_name: "my-def-cvm".to_string(),
        version_name: "0.0.1".to_string(),
        target_regions: vec!["westeurope".to_string(), "eastus".to_string()],
        arm_endpoint: server.base_url(),
        poll_interval: Duration::from_millis(10),
    }
}

fn compute(config: &CopyConfig) -> ComputeClient {
    let arm = ArmClient::new(Arc::new(StaticCredential))
        .with_endpoint(config.arm_endpoint.as_str())
        .with_poller_options(PollerOptions {
            frequency: config.poll_interval,
        })
        .with_retry_options(RetryOptions {
            max_retries: 1,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        });
    ComputeClient::new(Arc::new(arm), config.subscription_id.as_str())
}

fn succeeded() -> serde_json::Value {
    json!({"properties": {"provisioningState": "Succeeded"}})
}

#[tokio::test]
async fn test_run_sends_expected_bodies_and_ignores_cleanup_errors() {
    let server = MockServer::start_async().await;
    let config = config(&server);

    let disk = server.mock(|when, then| {
        when.method(PUT)
            .path(format!("{}/disks/tmp-disk", PREFIX))
            .query_param("api-version", "2023-04-02")
            .json_body(json!({
                "location": "eastus",
                "properties": {
                    "creationData": {
                        "createOption": "FromImage",
                        "galleryImageReference": {
                            "communityGalleryImageId": "/CommunityGalleries/cg/Images/podvm/Versions/1.0.0"
                        }
                    }
                }
            }));
        then.status(200).json_body(succeeded());
    });
    let image = server.mock(|when, then| {
        when.method(PUT)
            .path(format!("{}/images/tmp-image", PREFIX))
            .query_param("api-version", "2023-07-01")
            .json_body(json!({
                "location": "eastus",
                "properties": {
                    "storageProfile": {
                        "osDisk": {
                            "osType": "Linux",
                            "osState": "Generalized",
                            "managedDisk": {"id": format!("{}/disks/tmp-disk", PREFIX)}
                        }
                    }
                }
            }));
        then.status(201).json_body(succeeded());
    });
    let gallery = server.mock(|when, then| {
        when.method(PUT)
            .path(format!("{}/galleries/my_gallery", PREFIX))
            .query_param("api-version", "2022-08-03")
            .json_body(json!({"location": "eastus"}));
        then.status(200).json_body(succeeded());
    });
    let definition = server.mock(|when, then| {
        when.method(PUT)
            .path(format!("{}/galleries/my_gallery/images/my-def-cvm", PREFIX))
            .json_body(json!({
                "location": "eastus",
                "properties": {
                    "osType": "Linux",
                    "osState": "Generalized",
                    "hyperVGeneration": "V2",
                    "identifier": {
                        "publisher": "cvm-publisher",
                        "offer": "cvm-offer",
                        "sku": "cvm-sku"
                    },
                    "features": [{"name": "SecurityType", "value": "ConfidentialVmSupported"}]
                }
            }));
        then.status(200).json_body(succeeded());
    });
    let version = server.mock(|when, then| {
        when.method(PUT)
            .path(format!(
                "{}/galleries/my_gallery/images/my-def-cvm/versions/0.0.1",
                PREFIX
            ))
            .json_body(json!({
                "location": "eastus",
                "properties": {
                    "publishingProfile": {
                        "targetRegions": [{"name": "westeurope"}, {"name": "eastus"}]
                    },
                    "storageProfile": {
                        "source": {"id": format!("{}/images/tmp-image", PREFIX)}
                    }
                }
            }));
        then.status(200).json_body(succeeded());
    });
    let delete_image = server.mock(|when, then| {
        when.method(DELETE).path(format!("{}/images/tmp-image", PREFIX));
        then.status(500).json_body(json!({
            "error": {"code": "InternalServerError", "message": "boom"}
        }));
    });
    let delete_disk = server.mock(|when, then| {
        when.method(DELETE).path(format!("{}/disks/tmp-disk", PREFIX));
        then.status(500).json_body(json!({
            "error": {"code": "InternalServerError", "message": "boom"}
        }));
    });

    let compute = compute(&config);
    let created = CopyImagePipeline::new(&compute, &config)
        .run()
        .await
        .unwrap();

    assert_eq!(created.to_string(), "my_gallery/my-def-cvm/0.0.1");
    disk.assert();
    image.assert();
    gallery.assert();
    definition.assert();
    version.assert();
    delete_image.assert_hits(2);
    delete_disk.assert_hits(2);
}

#[tokio::test]
async fn test_failed_disk_operation_stops_pipeline() {
    let server = MockServer::start_async().await;
    let config = config(&server);
    let status_url = server.url("/operations/disk-op");

    let disk = server.mock(|when, then| {
        when.method(PUT).path(format!("{}/disks/tmp-disk", PREFIX));
        then.status(201)
            .header("Azure-AsyncOperation", status_url.as_str())
            .json_body(json!({"properties": {"provisioningState": "Creating"}}));
    });
    let status = server.mock(|when, then| {
        when.method(GET).path("/operations/disk-op");
        then.status(200).json_body(json!({
            "status": "Failed",
            "error": {"code": "ImageNotFound", "message": "community image not found"}
        }));
    });
    let compute = compute(&config);
    let err = CopyImagePipeline::new(&compute, &config)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.phase, Phase::Wait);
    assert_eq!(err.resource, Resource::Disk);
    assert!(err.to_string().contains("community image not found"));
    disk.assert();
    status.assert();
}
