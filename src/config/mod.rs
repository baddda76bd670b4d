//! # Matrix Configuration
//!
//! The matrix file (`templates/templates.yml` by default) declares every
//! language to generate and build, in order:
//!
//! ```yaml
//! languages:
//!   - name: python
//!     versions: ["3.9", "3.10"]
//!     structure:
//!       - Dockerfile.tpl
//!       - README.md
//!       - scripts/entrypoint.sh.tpl
//! registry:            # optional
//!   namespace: ghcr.io/unfor19
//!   image_name: release-action
//!   username: unfor19
//! build:               # optional
//!   alpine_version: "3.13"
//!   dockerfile: Dockerfile.base
//!   template_dir: templates
//!   timeout_secs: 120
//! ```
//!
//! Declaration order is preserved for languages, versions and structure
//! entries. Duplicate versions are kept as-is.

mod build;
mod registry;

pub use build::{BuildConfig, TEMPLATE_SUFFIX};
pub use registry::RegistryConfig;

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Component, Path};
use tracing::debug;

use crate::error::ConfigError;

/// One language block of the matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSpec {
    pub name: String,

    #[serde(deserialize_with = "deserialize_versions")]
    pub versions: Vec<String>,

    /// Paths relative to the template root; `.tpl` entries are rendered
    #[serde(default)]
    pub structure: Vec<String>,
}

/// Parsed matrix file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixConfig {
    pub languages: Vec<LanguageSpec>,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

/// Load and validate the matrix file at `path`.
pub fn load_matrix(path: &Path) -> Result<MatrixConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_matrix(path, &content)?;
    debug!(
        path = %path.display(),
        languages = config.languages.len(),
        "Loaded matrix"
    );
    Ok(config)
}

/// Parse matrix content; `path` is only used for error reporting.
pub fn parse_matrix(path: &Path, content: &str) -> Result<MatrixConfig, ConfigError> {
    let config: MatrixConfig =
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    validate(path, &config)?;
    Ok(config)
}

fn validate(path: &Path, config: &MatrixConfig) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    };

    for (index, lang) in config.languages.iter().enumerate() {
        if lang.name.trim().is_empty() {
            return Err(invalid(format!("language #{} has an empty name", index + 1)));
        }
        if lang.name.contains('/') || is_dot_segment(&lang.name) {
            return Err(invalid(format!(
                "language name '{}' must be a single path segment",
                lang.name
            )));
        }
        for version in &lang.versions {
            if version.trim().is_empty() || version.contains('/') || is_dot_segment(version) {
                return Err(invalid(format!(
                    "language '{}' has an invalid version '{}'",
                    lang.name, version
                )));
            }
        }
        for entry in &lang.structure {
            check_structure_entry(entry).map_err(|reason| {
                invalid(format!(
                    "language '{}' structure entry '{}' {}",
                    lang.name, entry, reason
                ))
            })?;
        }
    }

    if config.build.timeout_secs == 0 {
        return Err(invalid("build.timeout_secs must be greater than zero".to_string()));
    }

    Ok(())
}

fn check_structure_entry(entry: &str) -> Result<(), &'static str> {
    if entry.trim().is_empty() {
        return Err("is empty");
    }
    let entry_path = Path::new(entry);
    if entry_path.is_absolute() {
        return Err("must be relative to the template root");
    }
    if entry_path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err("must not escape the template root");
    }
    if entry.ends_with('/') {
        return Err("must name a file");
    }
    if entry_path.file_name().and_then(|n| n.to_str()) == Some(TEMPLATE_SUFFIX) {
        return Err("has no file name before the template suffix");
    }
    Ok(())
}

/// Names and versions become directory segments of the output tree
fn is_dot_segment(value: &str) -> bool {
    matches!(value.trim(), "." | "..")
}

/// Accept strings and integers; reject floats, whose text form is lossy
/// (`3.10` would otherwise become `3.1`).
fn deserialize_versions<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let values = Vec::<serde_yaml::Value>::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|value| match value {
            serde_yaml::Value::String(s) => Ok(s),
            serde_yaml::Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
            serde_yaml::Value::Number(n) => Err(D::Error::custom(format!(
                "version {} must be quoted to keep its exact spelling",
                n
            ))),
            other => Err(D::Error::custom(format!(
                "version must be a string, got {:?}",
                other
            ))),
        })
        .collect()
}
