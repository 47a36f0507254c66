use std::path::PathBuf;

use anyhow::Result;
use dashsync_core::store::PathPicker;
use dashsync_core::{DashError, DashsyncConfig};
use owo_colors::OwoColorize;

use super::{headless_engine, summary};

pub async fn run(config: &DashsyncConfig, path: PathBuf) -> Result<()> {
    let engine = headless_engine(config);

    let model = match engine.load_from_file(&PathPicker(path.clone())).await {
        Ok(model) => model,
        Err(DashError::NoFileSelected) => anyhow::bail!("File not found: {}", path.display()),
        Err(DashError::Storage(e)) => anyhow::bail!(
            "Imported data could not be saved to {}: {}",
            config.data_path().display(),
            e
        ),
        Err(e) => anyhow::bail!("Could not import {}: {}", path.display(), e),
    };

    println!("Imported {} from {}", summary(&model), path.display().green());
    Ok(())
}
