//! Line-delimited status streams returned by build and push calls
//!
//! The engine reports progress as one JSON object per line and signals the
//! outcome in whichever line arrives last. A failed build still completes the
//! HTTP call successfully; only the final line says `{"error": ...}`. Nothing
//! marks a line as terminal, so the consumer keeps the most recent line and
//! inspects it once the stream closes.

use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::io::Write;
use std::pin::Pin;

/// Raw body chunks as they arrive from the transport
pub type StatusStream = Pin<Box<dyn Stream<Item = std::io::Result<Vec<u8>>> + Send>>;

/// Authoritative outcome line of a build or push
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StreamedStatusLine {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "errorDetail")]
    pub error_detail: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}

impl StreamedStatusLine {
    /// Error reported by the engine, if the line carries a non-empty one
    pub fn failure(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    /// Message for a failed line: `errorDetail.message` when set, else `error`.
    ///
    /// Only a non-empty `error` marks the line as failed.
    pub fn failure_message(&self) -> Option<&str> {
        let error = self.failure()?;
        let detail = self
            .error_detail
            .as_ref()
            .map(|d| d.message.as_str())
            .filter(|m| !m.is_empty());
        Some(detail.unwrap_or(error))
    }
}

/// Progress message fields used only for display
#[derive(Debug, Default, Deserialize)]
struct ProgressMessage {
    stream: Option<String>,
    status: Option<String>,
    id: Option<String>,
    progress: Option<String>,
    error: Option<String>,
}

/// Result of draining a status stream
#[derive(Debug, Clone, Default)]
pub struct StreamOutcome {
    /// Number of non-empty lines received
    pub lines: usize,
    /// The line received last when the stream closed
    pub last_line: Option<String>,
}

impl StreamOutcome {
    /// Parse the retained line. A line that is not a status object reports
    /// no error.
    pub fn status(&self) -> StreamedStatusLine {
        self.last_line
            .as_deref()
            .and_then(|line| serde_json::from_str(line).ok())
            .unwrap_or_default()
    }

    /// Error carried by the final line, if any
    pub fn reported_error(&self) -> Option<String> {
        self.status().failure_message().map(str::to_string)
    }
}

/// Drain `stream`, forwarding every line to `observer` as it arrives and
/// keeping only the last one.
pub async fn consume_status_stream(
    mut stream: StatusStream,
    observer: &mut (dyn Write + Send),
) -> std::io::Result<StreamOutcome> {
    let mut outcome = StreamOutcome::default();
    let mut pending: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        pending.extend_from_slice(&chunk?);
        while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            accept_line(&line, observer, &mut outcome);
        }
    }

    // Final line without a trailing newline
    if !pending.is_empty() {
        accept_line(&pending, observer, &mut outcome);
    }

    Ok(outcome)
}

fn accept_line(raw: &[u8], observer: &mut (dyn Write + Send), outcome: &mut StreamOutcome) {
    let text = String::from_utf8_lossy(raw);
    let line = text.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return;
    }

    display_line(line, observer);
    outcome.lines += 1;
    outcome.last_line = Some(line.to_string());
}

// Presentation only; observer write failures never affect the outcome.
fn display_line(line: &str, observer: &mut (dyn Write + Send)) {
    let rendered = match serde_json::from_str::<ProgressMessage>(line) {
        Ok(ProgressMessage {
            stream: Some(text), ..
        }) => text,
        Ok(ProgressMessage {
            error: Some(error), ..
        }) => format!("ERROR: {}\n", error),
        Ok(ProgressMessage {
            status: Some(status),
            id,
            progress,
            ..
        }) => {
            let mut out = String::new();
            if let Some(id) = id {
                out.push_str(&id);
                out.push_str(": ");
            }
            out.push_str(&status);
            if let Some(progress) = progress.filter(|p| !p.is_empty()) {
                out.push(' ');
                out.push_str(&progress);
            }
            out.push('\n');
            out
        }
        _ => format!("{}\n", line),
    };

    let _ = observer.write_all(rendered.as_bytes());
    let _ = observer.flush();
}
