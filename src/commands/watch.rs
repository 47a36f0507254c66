use anyhow::Result;
use dashsync_core::DashsyncConfig;
use log::info;
use owo_colors::OwoColorize;

use super::{headless_engine, summary};

pub async fn run(config: &DashsyncConfig) -> Result<()> {
    let engine = headless_engine(config);

    if !engine.start().await {
        anyhow::bail!("Could not render the dashboard");
    }

    println!(
        "Watching {} ({})",
        config.data_path().display().bold(),
        summary(&engine.model())
    );
    println!("{}", "Press Ctrl-C to stop.".dimmed());

    tokio::signal::ctrl_c().await?;

    if let Some(outcome) = engine.flush().await {
        info!("Pending save finished: {:?}", outcome);
    }
    engine.shutdown();

    Ok(())
}
