//! Subcommand handlers
//!
//! Each handler loads the matrix first, so a malformed file fails the
//! command before any image is built or directory created.

pub mod plan;
pub mod render;
pub mod run;
