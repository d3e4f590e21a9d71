//! Show or write the effective configuration.

use std::path::Path;

use handsign_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, path: Option<&Path>, write: bool) -> anyhow::Result<()> {
    if !write {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let written = match path {
        Some(path) => {
            config.save_to(path)?;
            path.to_path_buf()
        }
        None => {
            config.save()?;
            config_file_path()
        }
    };
    println!("Config written to: {}", written.display());
    Ok(())
}
