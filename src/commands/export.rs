use std::path::PathBuf;

use anyhow::Result;
use dashsync_core::{DashError, DashsyncConfig};
use owo_colors::OwoColorize;

use super::{open_store, summary};

pub async fn run(config: &DashsyncConfig, output: Option<PathBuf>) -> Result<()> {
    let store = open_store(config);

    let model = match store.load_required().await {
        Ok(model) => model,
        Err(DashError::NotFound(key)) => {
            anyhow::bail!("Nothing to export: no dashboard data stored under '{}'", key)
        }
        Err(e) => return Err(e.into()),
    };

    let file = store.export(&model)?;
    let path = output.unwrap_or_else(|| PathBuf::from(&file.filename));
    tokio::fs::write(&path, &file.bytes).await?;

    println!("Exported {} to {}", summary(&model), path.display().green());
    Ok(())
}
