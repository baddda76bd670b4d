//! Matrix orchestrator
//!
//! Walks every (language, version) pair in declaration order and, for each,
//! builds the image, pushes it when credentials were supplied, then writes
//! the pair's output tree. The first failure aborts the run; images and
//! files produced before it are left in place.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use super::image_builder::ImageBuilder;
use super::image_pusher::ImagePusher;
use super::template_renderer::TemplateRenderer;
use crate::config::MatrixConfig;
use crate::domain::{expand, Combination};
use crate::error::{MatrixError, RenderError};
use crate::infrastructure::{ImageTransport, RegistryCredentials};
use crate::observability::{RunTracker, StepTimer};

/// What a finished run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Images built, in order
    pub images: Vec<String>,
    /// Images pushed, in order
    pub pushed: Vec<String>,
    /// Files written, in order
    pub files_written: Vec<PathBuf>,
}

pub struct MatrixRunner<'a, T: ImageTransport + ?Sized> {
    config: &'a MatrixConfig,
    transport: &'a T,
    renderer: TemplateRenderer,
    credentials: Option<RegistryCredentials>,
    timeout: Duration,
    tracker: RunTracker,
}

impl<'a, T: ImageTransport + ?Sized> MatrixRunner<'a, T> {
    pub fn new(config: &'a MatrixConfig, transport: &'a T, output_root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            transport,
            renderer: TemplateRenderer::new(&config.build.template_dir, output_root),
            credentials: None,
            timeout: config.build.timeout(),
            tracker: RunTracker::new(),
        }
    }

    /// Enable pushing every built image with these credentials
    pub fn with_push(mut self, credentials: RegistryCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Override the per-operation deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build, push and render every combination.
    pub async fn run(
        &self,
        observer: &mut (dyn Write + Send),
    ) -> Result<RunReport, MatrixError> {
        let combinations = expand(&self.config.languages);
        self.tracker
            .emit_started("run", combinations.len(), self.credentials.is_some());
        info!(
            run_id = %self.tracker.run_id(),
            combinations = combinations.len(),
            push = self.credentials.is_some(),
            "Starting matrix run"
        );

        let builder = ImageBuilder::new(self.transport, &self.config.registry, &self.config.build)
            .with_timeout(self.timeout);
        let pusher = match &self.credentials {
            Some(credentials) => Some(
                ImagePusher::new(self.transport, credentials, self.timeout).map_err(|e| {
                    let e = MatrixError::from(e);
                    self.tracker.emit_failed(None, None, e.to_string());
                    e
                })?,
            ),
            None => None,
        };

        let mut report = RunReport::default();
        for combination in &combinations {
            let result = self
                .run_combination(combination, &builder, pusher.as_ref(), observer, &mut report)
                .await;
            if let Err(e) = result {
                self.abort(combination, &e);
                return Err(e);
            }
        }

        self.tracker
            .emit_completed(report.images.len(), report.pushed.len(), report.files_written.len());
        info!(
            builds = report.images.len(),
            pushes = report.pushed.len(),
            files = report.files_written.len(),
            "Matrix run complete"
        );
        Ok(report)
    }

    async fn run_combination(
        &self,
        combination: &Combination<'_>,
        builder: &ImageBuilder<'_, T>,
        pusher: Option<&ImagePusher<'_, T>>,
        observer: &mut (dyn Write + Send),
        report: &mut RunReport,
    ) -> Result<(), MatrixError> {
        info!(
            language = combination.name(),
            version = combination.version,
            "Processing combination"
        );

        let timer = StepTimer::start();
        let image = builder.build(combination, observer).await?;
        self.tracker
            .emit_built(combination.name(), combination.version, &image, timer);
        report.images.push(image.clone());

        if let Some(pusher) = pusher {
            let timer = StepTimer::start();
            pusher.push(&image, observer).await?;
            self.tracker
                .emit_pushed(combination.name(), combination.version, &image, timer);
            report.pushed.push(image);
        }

        let files = render_combination(&self.renderer, combination)?;
        self.tracker
            .emit_rendered(combination.name(), combination.version, files.len());
        report.files_written.extend(files);
        Ok(())
    }

    fn abort(&self, combination: &Combination<'_>, e: &MatrixError) {
        error!(
            language = combination.name(),
            version = combination.version,
            error = %e,
            "Matrix run aborted"
        );
        self.tracker.emit_failed(
            Some(combination.name()),
            Some(combination.version),
            e.to_string(),
        );
    }
}

/// Write every combination's output tree without touching the engine.
pub fn render_only(config: &MatrixConfig, output_root: &Path) -> Result<RunReport, MatrixError> {
    let tracker = RunTracker::new();
    let renderer = TemplateRenderer::new(&config.build.template_dir, output_root);
    let combinations = expand(&config.languages);
    tracker.emit_started("render", combinations.len(), false);

    let mut report = RunReport::default();
    for combination in &combinations {
        match render_combination(&renderer, combination) {
            Ok(files) => {
                tracker.emit_rendered(combination.name(), combination.version, files.len());
                report.files_written.extend(files);
            }
            Err(e) => {
                error!(
                    language = combination.name(),
                    version = combination.version,
                    error = %e,
                    "Render aborted"
                );
                tracker.emit_failed(
                    Some(combination.name()),
                    Some(combination.version),
                    e.to_string(),
                );
                return Err(e.into());
            }
        }
    }

    tracker.emit_completed(0, 0, report.files_written.len());
    Ok(report)
}

fn render_combination(
    renderer: &TemplateRenderer,
    combination: &Combination<'_>,
) -> Result<Vec<PathBuf>, RenderError> {
    combination
        .language
        .structure
        .iter()
        .map(|entry| renderer.render_entry(combination, entry))
        .collect()
}
