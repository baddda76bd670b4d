//! Matrix domain types
//!
//! Cartesian expansion of languages and versions, plus the naming rules that
//! derive base images, tags, template identities and output paths from a
//! single combination.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{LanguageSpec, RegistryConfig, TEMPLATE_SUFFIX};

/// One (language, version) pair of the matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination<'a> {
    pub language: &'a LanguageSpec,
    pub version: &'a str,
}

impl<'a> Combination<'a> {
    pub fn name(&self) -> &'a str {
        &self.language.name
    }

    /// Tag suffix: `<language>-<version>`
    pub fn tag(&self) -> String {
        format!("{}-{}", self.language.name, self.version)
    }

    /// Fully qualified image reference: `<namespace>/<image>:<language>-<version>`
    pub fn image_reference(&self, registry: &RegistryConfig) -> String {
        format!("{}:{}", registry.repository(), self.tag())
    }

    /// Upstream image the build starts from: `<language>:<version>-alpine<alpine>`
    pub fn base_image(&self, alpine_version: &str) -> String {
        format!(
            "{}:{}-alpine{}",
            self.language.name, self.version, alpine_version
        )
    }

    /// Template identity for structure entries of this combination
    pub fn template_instance(&self) -> String {
        format!("{}-{}", self.language.name, self.version)
    }

    /// Template identity for the Dockerfile of this combination
    pub fn dockerfile_instance(&self) -> String {
        format!("dockerfile-{}-{}", self.language.name, self.version)
    }
}

/// Expand languages into every (language, version) pair, in declaration order.
///
/// Duplicate versions yield duplicate combinations.
pub fn expand(languages: &[LanguageSpec]) -> Vec<Combination<'_>> {
    languages
        .iter()
        .flat_map(|language| {
            language.versions.iter().map(move |version| Combination {
                language,
                version: version.as_str(),
            })
        })
        .collect()
}

/// Variables visible to a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderContext {
    #[serde(rename = "LangName")]
    pub lang_name: String,
    #[serde(rename = "LangVersion")]
    pub lang_version: String,
    #[serde(rename = "AlpineVersion")]
    pub alpine_version: String,
}

impl RenderContext {
    /// Context for structure entries; `AlpineVersion` is present but empty.
    pub fn for_structure(combination: &Combination<'_>) -> Self {
        Self {
            lang_name: combination.name().to_string(),
            lang_version: combination.version.to_string(),
            alpine_version: String::new(),
        }
    }

    /// Context for the Dockerfile template; all fields populated.
    pub fn for_dockerfile(combination: &Combination<'_>, alpine_version: &str) -> Self {
        Self {
            lang_name: combination.name().to_string(),
            lang_version: combination.version.to_string(),
            alpine_version: alpine_version.to_string(),
        }
    }
}

/// Whether a path names a template rather than a static file
pub fn is_template(path: &str) -> bool {
    path.ends_with(TEMPLATE_SUFFIX)
}

/// Strip the render suffix from a file name, if present
pub fn strip_template_suffix(name: &str) -> &str {
    name.strip_suffix(TEMPLATE_SUFFIX).unwrap_or(name)
}

/// Where one structure entry lands in the generated tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// `<language>/<version>[/<dirname of entry>]`, relative to the output root
    pub dir: PathBuf,
    /// Basename of the entry with the render suffix stripped
    pub file_name: String,
}

impl OutputTarget {
    pub fn for_entry(combination: &Combination<'_>, entry: &str) -> Self {
        let mut dir = PathBuf::from(combination.name()).join(combination.version);
        let entry_path = Path::new(entry);

        if entry.contains('/') {
            if let Some(parent) = entry_path.parent() {
                dir.push(parent);
            }
        }

        let base = entry_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(entry);

        Self {
            dir,
            file_name: strip_template_suffix(base).to_string(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}
