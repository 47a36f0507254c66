use anyhow::Result;
use dashsync_core::dates::format_timestamp;
use dashsync_core::{DashError, DashsyncConfig, EntityKind};
use owo_colors::OwoColorize;

use super::open_store;

pub async fn run(config: &DashsyncConfig) -> Result<()> {
    let store = open_store(config);

    let model = match store.load_required().await {
        Ok(model) => model,
        Err(DashError::NotFound(key)) => {
            println!("{}", format!("No dashboard data stored under '{}' yet.", key).dimmed());
            println!("Run `dashsync watch` to load the default data, or `dashsync import <file>`.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", config.data_path().display().bold());
    for kind in EntityKind::ALL {
        println!("   {:<15} {}", kind.to_string(), model.len_of(kind));
    }
    println!(
        "   {:<15} {}",
        "last updated",
        format_timestamp(model.last_updated).green()
    );

    Ok(())
}
