//! Domain layer - pure business logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod matrix;

// Re-export commonly used types
pub use matrix::{expand, is_template, Combination, OutputTarget, RenderContext};
