//! Centralized error types for langmatrix
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.
//! Every variant is terminal for the whole run.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for a matrix run
#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Push error: {0}")]
    Push(#[from] PushError),
}

/// Matrix file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read matrix file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse matrix file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid matrix file {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

/// Template and static file materialization errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse template {template}: {source}")]
    Parse {
        template: String,
        #[source]
        source: tera::Error,
    },

    #[error("Failed to execute template {template}: {source}")]
    Execute {
        template: String,
        #[source]
        source: tera::Error,
    },

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Image build errors
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to assemble build context for {tag}: {message}")]
    Context { tag: String, message: String },

    #[error("Failed to render Dockerfile for {tag}: {source}")]
    Dockerfile {
        tag: String,
        #[source]
        source: RenderError,
    },

    #[error("Build transport failed for {tag}: {source}")]
    Transport {
        tag: String,
        #[source]
        source: TransportError,
    },

    #[error("Build of {tag} reported failure: {message}")]
    Reported { tag: String, message: String },

    #[error("Build of {tag} timed out after {}", humantime::format_duration(*timeout))]
    Timeout { tag: String, timeout: Duration },
}

/// Image push errors
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Registry token not found. Set GHCR_TOKEN env var or pass --token")]
    MissingCredentials,

    #[error("Failed to encode registry credentials: {0}")]
    Credentials(#[from] serde_json::Error),

    #[error("Push transport failed for {tag}: {source}")]
    Transport {
        tag: String,
        #[source]
        source: TransportError,
    },

    #[error("Push of {tag} reported failure: {message}")]
    Reported { tag: String, message: String },

    #[error("Push of {tag} timed out after {}", humantime::format_duration(*timeout))]
    Timeout { tag: String, timeout: Duration },
}

/// Errors talking to the container engine
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Unsupported engine host {host}: {reason}")]
    UnsupportedHost { host: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to encode request parameters: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Engine returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to read status stream: {0}")]
    Stream(#[from] std::io::Error),
}
