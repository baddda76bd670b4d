//! Build settings shared by every combination of the matrix.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Suffix marking a structure entry (or the Dockerfile) for rendering
pub const TEMPLATE_SUFFIX: &str = ".tpl";

/// Image build configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Alpine release appended to the language base image
    #[serde(default = "default_alpine_version")]
    pub alpine_version: String,

    /// Dockerfile sent as the build context; rendered first when it ends in `.tpl`
    #[serde(default = "default_dockerfile")]
    pub dockerfile: PathBuf,

    /// Root that structure entries are resolved against
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,

    /// Deadline for a single build or push, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_alpine_version() -> String {
    "3.13".to_string()
}

fn default_dockerfile() -> PathBuf {
    PathBuf::from("Dockerfile.base")
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            alpine_version: default_alpine_version(),
            dockerfile: default_dockerfile(),
            template_dir: default_template_dir(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BuildConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
