//! Init and Config commands.

use std::path::PathBuf;

use crate::config::{CONFIG_DIR, Settings};

/// Run init command - create configuration file.
pub fn run_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from(CONFIG_DIR).join("settings.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at: {}\nUse --force to overwrite",
            config_path.display()
        );
    }

    let path = Settings::init_config_file(force).map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("Created configuration file at: {}", path.display());
    println!("Point `data.dir` at your knowledge-base snapshot, then run `apirec recommend`.");
    Ok(())
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) -> anyhow::Result<()> {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("{}", toml::to_string_pretty(config)?);

    let paths = config.artifact_paths();
    println!("Resolved artifacts:");
    for (label, path) in [
        ("embeddings", &paths.embeddings),
        ("idf", &paths.idf),
        ("questions", &paths.questions),
        ("javadoc", &paths.javadoc),
    ] {
        let status = if path.exists() { "ok" } else { "missing" };
        println!("  {label:<11} {} [{status}]", path.display());
    }
    Ok(())
}
