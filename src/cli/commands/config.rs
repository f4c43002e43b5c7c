//! Configuration commands: show, path, init.

use crate::config::ConfigLoader;
use crate::types::{CostwiseError, Result};

/// Show the effective merged configuration.
pub fn show(as_json: bool) -> Result<()> {
    let config = ConfigLoader::load()?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!(
            "{}",
            toml::to_string_pretty(&config).map_err(|e| CostwiseError::Config(e.to_string()))?
        );
    }

    Ok(())
}

/// Show configuration file paths.
pub fn path() -> Result<()> {
    println!("Configuration paths:");
    println!();

    if let Some(global) = ConfigLoader::global_config_path() {
        let exists = if global.exists() { "✓" } else { "✗" };
        println!("  Global:  {} {}", exists, global.display());
    } else {
        println!("  Global:  (not available)");
    }

    let project = ConfigLoader::project_config_path();
    let exists = if project.exists() { "✓" } else { "✗" };
    println!("  Project: {} {}", exists, project.display());

    Ok(())
}

/// Initialize a config file.
pub fn init(global: bool, force: bool) -> Result<()> {
    let dir = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(force)?
    };
    println!("Initialized: {}", dir.display());
    Ok(())
}
