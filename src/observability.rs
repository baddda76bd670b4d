//! # Run Observability Module
//!
//! Structured lifecycle events for matrix runs.
//!
//! Events are single JSON lines on stdout prefixed with `LANGMATRIX_EVENT:`,
//! so a log shipper can pick them out of the surrounding build output
//! (which goes to stderr).
//!
//! ```text
//! LANGMATRIX_EVENT:{"event_type":"BuildCompleted","run_id":"…","language":"python",…}
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

/// Event prefix for log shippers to identify structured events
const EVENT_PREFIX: &str = "LANGMATRIX_EVENT:";

/// Run event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum MatrixEvent {
    /// Run started
    RunStarted(RunStartedEvent),
    /// Image built for one combination
    BuildCompleted(ImageEvent),
    /// Image pushed for one combination
    PushCompleted(ImageEvent),
    /// Output tree written for one combination
    ArtifactsRendered(ArtifactsRenderedEvent),
    /// Every combination finished
    RunCompleted(RunCompletedEvent),
    /// Run aborted on the first failure
    RunFailed(RunFailedEvent),
}

/// Common fields for all events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Timestamp in RFC3339 format
    pub timestamp: String,
    /// Identifier shared by every event of one run
    pub run_id: String,
    /// Hostname of the machine running the matrix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// CI job ID if running in CI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_job_id: Option<String>,
}

impl EventMetadata {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            run_id: run_id.into(),
            hostname: std::env::var("HOSTNAME").ok(),
            ci_job_id: std::env::var("GITHUB_RUN_ID")
                .ok()
                .or_else(|| std::env::var("CI_JOB_ID").ok()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStartedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    /// `run` or `render`
    pub mode: String,
    /// Number of (language, version) pairs
    pub combinations: usize,
    pub push_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub language: String,
    pub version: String,
    pub image: String,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsRenderedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub language: String,
    pub version: String,
    pub files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCompletedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub duration_secs: f64,
    pub builds: usize,
    pub pushes: usize,
    pub files_written: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFailedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    /// Duration until failure
    pub duration_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Error message
    pub error: String,
}

/// Emits a structured event as JSON to stdout
pub fn emit_event(event: MatrixEvent) {
    match serde_json::to_string(&event) {
        Ok(json) => {
            println!("{}{}", EVENT_PREFIX, json);
        }
        Err(e) => {
            tracing::error!("Failed to serialize event: {}", e);
        }
    }
}

/// Helper to track step timing
pub struct StepTimer {
    start: Instant,
}

impl StepTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Emits the events of one run under a shared run id
pub struct RunTracker {
    run_id: String,
    start: Instant,
}

impl RunTracker {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            start: Instant::now(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn metadata(&self) -> EventMetadata {
        EventMetadata::new(self.run_id.clone())
    }

    pub fn emit_started(&self, mode: &str, combinations: usize, push_enabled: bool) {
        emit_event(MatrixEvent::RunStarted(RunStartedEvent {
            metadata: self.metadata(),
            mode: mode.to_string(),
            combinations,
            push_enabled,
        }));
    }

    pub fn emit_built(&self, language: &str, version: &str, image: &str, timer: StepTimer) {
        emit_event(MatrixEvent::BuildCompleted(self.image_event(
            language, version, image, timer,
        )));
    }

    pub fn emit_pushed(&self, language: &str, version: &str, image: &str, timer: StepTimer) {
        emit_event(MatrixEvent::PushCompleted(self.image_event(
            language, version, image, timer,
        )));
    }

    fn image_event(&self, language: &str, version: &str, image: &str, timer: StepTimer) -> ImageEvent {
        ImageEvent {
            metadata: self.metadata(),
            language: language.to_string(),
            version: version.to_string(),
            image: image.to_string(),
            duration_secs: timer.elapsed_secs(),
        }
    }

    pub fn emit_rendered(&self, language: &str, version: &str, files: usize) {
        emit_event(MatrixEvent::ArtifactsRendered(ArtifactsRenderedEvent {
            metadata: self.metadata(),
            language: language.to_string(),
            version: version.to_string(),
            files,
        }));
    }

    pub fn emit_completed(&self, builds: usize, pushes: usize, files_written: usize) {
        emit_event(MatrixEvent::RunCompleted(RunCompletedEvent {
            metadata: self.metadata(),
            duration_secs: self.start.elapsed().as_secs_f64(),
            builds,
            pushes,
            files_written,
        }));
    }

    pub fn emit_failed(&self, language: Option<&str>, version: Option<&str>, error: String) {
        emit_event(MatrixEvent::RunFailed(RunFailedEvent {
            metadata: self.metadata(),
            duration_secs: self.start.elapsed().as_secs_f64(),
            language: language.map(str::to_string),
            version: version.map(str::to_string),
            error,
        }));
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}
