//! Registry configuration for the images built from the matrix.

use serde::{Deserialize, Serialize};

/// Registry configuration for container images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry namespace including host (e.g., "ghcr.io/unfor19")
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Image name under the namespace (e.g., "release-action")
    #[serde(default = "default_image_name")]
    pub image_name: String,

    /// Username sent with the push credential
    #[serde(default = "default_username")]
    pub username: String,
}

fn default_namespace() -> String {
    "ghcr.io/unfor19".to_string()
}

fn default_image_name() -> String {
    "release-action".to_string()
}

fn default_username() -> String {
    "unfor19".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            image_name: default_image_name(),
            username: default_username(),
        }
    }
}

impl RegistryConfig {
    /// Repository the tags are attached to: `<namespace>/<image_name>`
    pub fn repository(&self) -> String {
        format!(
            "{}/{}",
            self.namespace.trim_end_matches('/'),
            self.image_name
        )
    }
}
