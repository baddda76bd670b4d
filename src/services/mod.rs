//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services use infrastructure adapters to perform I/O operations.

pub mod image_builder;
pub mod image_pusher;
pub mod orchestrator;
pub mod template_renderer;

#[cfg(test)]
pub(crate) mod fake_transport;

// Re-export commonly used types
pub use orchestrator::{render_only, MatrixRunner};
