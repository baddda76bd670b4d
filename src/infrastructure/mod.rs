//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - Container engine (Docker Engine API over HTTP)
//! - Status streams returned by builds and pushes
//! - Registry credentials

pub mod docker;
pub mod registry;
pub mod status_stream;

// Re-export commonly used types
pub use docker::{BuildOptions, DockerClient, ImageTransport};
pub use registry::RegistryCredentials;
pub use status_stream::{consume_status_stream, StatusStream};
