//! `run` command: build, optionally push, and render every combination.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::load_matrix;
use crate::infrastructure::{DockerClient, RegistryCredentials};
use crate::services::MatrixRunner;
use crate::ui;

pub struct RunOptions {
    pub push: bool,
    pub docker_host: String,
    pub token: Option<String>,
    pub timeout: Option<Duration>,
}

pub async fn execute(matrix: &Path, output_dir: &Path, options: RunOptions) -> Result<()> {
    let config = load_matrix(matrix)?;
    ui::print_header("Language Matrix Run");

    // Resolve the credential before any build so a missing token costs nothing
    let credentials = if options.push {
        Some(RegistryCredentials::from_token(
            config.registry.username.as_str(),
            options.token,
        )?)
    } else {
        None
    };

    let client = DockerClient::new(&options.docker_host)
        .with_context(|| format!("Invalid container engine host {}", options.docker_host))?;
    info!(engine = %client.base_url(), push = options.push, "Using container engine");

    let mut runner = MatrixRunner::new(&config, &client, output_dir);
    if let Some(credentials) = credentials {
        runner = runner.with_push(credentials);
    }
    if let Some(timeout) = options.timeout {
        runner = runner.with_timeout(timeout);
    }

    let mut observer = std::io::stderr();
    let report = runner.run(&mut observer).await?;

    ui::print_success(&format!(
        "Built {} image(s), pushed {}, wrote {} file(s)",
        report.images.len(),
        report.pushed.len(),
        report.files_written.len()
    ));
    Ok(())
}
