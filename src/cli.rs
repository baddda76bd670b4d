//! CLI definitions for langmatrix
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "langmatrix",
    version,
    about = "Build, push and render per-language image variants from a matrix file",
    long_about = "Reads a matrix of languages and versions, builds one container image per \
                  (language, version) pair, optionally pushes it, and renders that pair's \
                  directory tree from templates."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Matrix file describing languages, versions and structure
    #[arg(long, global = true, default_value = "templates/templates.yml")]
    pub matrix: PathBuf,

    /// Root directory that per-language trees are written under
    #[arg(long, global = true, default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every image, optionally push it, and render its tree
    Run {
        /// Push each image after it is built
        #[arg(long)]
        push: bool,

        /// Container engine endpoint (tcp:// or http(s)://)
        #[arg(long, env = "DOCKER_HOST", default_value = "tcp://localhost:2375")]
        docker_host: String,

        /// Registry token used as the push password
        #[arg(long, env = "GHCR_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Deadline for each build and each push (e.g. 90s, 5m)
        #[arg(long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,
    },

    /// Render every tree without touching the container engine
    Render,

    /// Validate the matrix and print what a run would produce
    Plan,
}
