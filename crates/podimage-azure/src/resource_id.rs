//! ARM resource identifiers for `Microsoft.Compute`
//!
//! Identifiers are built from names rather than read back from responses, so
//! a name that does not match the subscription or resource group only shows
//! up when a later request references it.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(String);

impl ResourceId {
    fn compute(subscription_id: &str, resource_group: &str, tail: &str) -> Self {
        Self(format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Compute/{}",
            subscription_id, resource_group, tail
        ))
    }

    pub fn disk(subscription_id: &str, resource_group: &str, name: &str) -> Self {
        Self::compute(subscription_id, resource_group, &format!("disks/{}", name))
    }

    pub fn image(subscription_id: &str, resource_group: &str, name: &str) -> Self {
        Self::compute(subscription_id, resource_group, &format!("images/{}", name))
    }

    pub fn gallery(subscription_id: &str, resource_group: &str, gallery: &str) -> Self {
        Self::compute(
            subscription_id,
            resource_group,
            &format!("galleries/{}", gallery),
        )
    }

    pub fn gallery_image(
        subscription_id: &str,
        resource_group: &str,
        gallery: &str,
        definition: &str,
    ) -> Self {
        Self::compute(
            subscription_id,
            resource_group,
            &format!("galleries/{}/images/{}", gallery, definition),
        )
    }

    pub fn gallery_image_version(
        subscription_id: &str,
        resource_group: &str,
        gallery: &str,
        definition: &str,
        version: &str,
    ) -> Self {
        Self::compute(
            subscription_id,
            resource_group,
            &format!("galleries/{}/images/{}/versions/{}", gallery, definition, version),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
