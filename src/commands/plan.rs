//! `plan` command: print what a run would build and write.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::{load_matrix, MatrixConfig};
use crate::domain::{expand, OutputTarget};
use crate::ui;

/// One planned combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCombination {
    pub image: String,
    pub base_image: String,
    pub files: Vec<PathBuf>,
}

pub fn plan(config: &MatrixConfig, output_dir: &Path) -> Vec<PlannedCombination> {
    expand(&config.languages)
        .iter()
        .map(|combination| PlannedCombination {
            image: combination.image_reference(&config.registry),
            base_image: combination.base_image(&config.build.alpine_version),
            files: combination
                .language
                .structure
                .iter()
                .map(|entry| output_dir.join(OutputTarget::for_entry(combination, entry).path()))
                .collect(),
        })
        .collect()
}

pub fn execute(matrix: &Path, output_dir: &Path) -> Result<()> {
    let config = load_matrix(matrix)?;
    ui::print_header("Language Matrix Plan");

    let planned = plan(&config, output_dir);
    for entry in &planned {
        ui::print_combination(&entry.image, &entry.base_image, entry.files.as_slice());
    }

    ui::print_success(&format!("{} combination(s)", planned.len()));
    Ok(())
}
