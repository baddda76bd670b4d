//! Image builder
//!
//! Packages the Dockerfile as the only entry of an in-memory tar context,
//! sends it to the engine with the language base image as a build argument,
//! and reads the outcome from the final line of the status stream.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use super::template_renderer::render_string;
use crate::config::{BuildConfig, RegistryConfig};
use crate::domain::matrix::strip_template_suffix;
use crate::domain::{is_template, Combination, RenderContext};
use crate::error::{BuildError, TransportError};
use crate::infrastructure::{consume_status_stream, BuildOptions, ImageTransport};

pub struct ImageBuilder<'a, T: ImageTransport + ?Sized> {
    transport: &'a T,
    registry: &'a RegistryConfig,
    settings: &'a BuildConfig,
    timeout: Duration,
}

impl<'a, T: ImageTransport + ?Sized> ImageBuilder<'a, T> {
    pub fn new(transport: &'a T, registry: &'a RegistryConfig, settings: &'a BuildConfig) -> Self {
        Self {
            transport,
            registry,
            settings,
            timeout: settings.timeout(),
        }
    }

    /// Override the per-build deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the image for one combination and return its full tag.
    ///
    /// Status lines are forwarded to `observer` as they arrive.
    pub async fn build(
        &self,
        combination: &Combination<'_>,
        observer: &mut (dyn Write + Send),
    ) -> Result<String, BuildError> {
        let tag = combination.image_reference(self.registry);
        let base_image = combination.base_image(&self.settings.alpine_version);

        let (entry_name, dockerfile) = self.dockerfile(combination, &tag)?;
        let context = build_context(&entry_name, &dockerfile).map_err(|e| BuildError::Context {
            tag: tag.clone(),
            message: e.to_string(),
        })?;

        let mut build_args = BTreeMap::new();
        build_args.insert("LANG_IMAGE".to_string(), base_image.clone());
        build_args.insert(
            "ALPINE_VERSION".to_string(),
            self.settings.alpine_version.clone(),
        );
        let options = BuildOptions {
            tag: tag.clone(),
            dockerfile: entry_name,
            build_args,
            remove: true,
        };

        info!(tag = %tag, base_image = %base_image, "Building image");

        let transport = self.transport;
        let outcome = tokio::time::timeout(self.timeout, async {
            let stream = transport
                .build_image(&options, context)
                .await
                .map_err(|source| BuildError::Transport {
                    tag: tag.clone(),
                    source,
                })?;
            consume_status_stream(stream, observer)
                .await
                .map_err(|e| BuildError::Transport {
                    tag: tag.clone(),
                    source: TransportError::Stream(e),
                })
        })
        .await
        .map_err(|_| BuildError::Timeout {
            tag: tag.clone(),
            timeout: self.timeout,
        })??;

        if let Some(message) = outcome.reported_error() {
            return Err(BuildError::Reported { tag, message });
        }

        info!(tag = %tag, lines = outcome.lines, "Image built");
        Ok(tag)
    }

    /// Archive entry name and Dockerfile bytes, rendered when the file is a template.
    fn dockerfile(
        &self,
        combination: &Combination<'_>,
        tag: &str,
    ) -> Result<(String, Vec<u8>), BuildError> {
        let path = &self.settings.dockerfile;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BuildError::Context {
                tag: tag.to_string(),
                message: format!("invalid Dockerfile path {}", path.display()),
            })?;
        let entry_name = strip_template_suffix(file_name).to_string();

        let bytes = std::fs::read(path).map_err(|e| BuildError::Context {
            tag: tag.to_string(),
            message: format!("unable to read {}: {}", path.display(), e),
        })?;

        if !is_template(file_name) {
            return Ok((entry_name, bytes));
        }

        let content = String::from_utf8(bytes).map_err(|e| BuildError::Context {
            tag: tag.to_string(),
            message: format!("{} is not valid UTF-8: {}", path.display(), e),
        })?;
        let context = RenderContext::for_dockerfile(combination, &self.settings.alpine_version);
        let rendered = render_string(&combination.dockerfile_instance(), &content, &context)
            .map_err(|source| BuildError::Dockerfile {
                tag: tag.to_string(),
                source,
            })?;
        Ok((entry_name, rendered.into_bytes()))
    }
}

/// Uncompressed tar holding `content` as the single entry `name`.
pub fn build_context(name: &str, content: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_entry_type(tar::EntryType::Regular);

    let mut archive = tar::Builder::new(Vec::new());
    archive.append_data(&mut header, Path::new(name), content)?;
    archive.into_inner()
}
