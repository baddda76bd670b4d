//! `render` command: write every tree without touching the engine.

use anyhow::Result;
use std::path::Path;

use crate::config::load_matrix;
use crate::services::render_only;
use crate::ui;

pub fn execute(matrix: &Path, output_dir: &Path) -> Result<()> {
    let config = load_matrix(matrix)?;
    ui::print_header("Language Matrix Render");

    let report = render_only(&config, output_dir)?;
    for path in &report.files_written {
        ui::print_info(&path.display().to_string());
    }
    ui::print_success(&format!("Wrote {} file(s)", report.files_written.len()));
    Ok(())
}
