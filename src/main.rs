//! CLI entry point for the API recommender.

use std::path::Path;

use anyhow::anyhow;
use apirec::cli::commands::{batch, evaluate, init, recommend};
use apirec::cli::{Cli, Commands};
use apirec::config::CONFIG_DIR;
use apirec::{IndexService, LoadError, ServiceError, Settings, logging};
use clap::Parser;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        let load_error = e
            .downcast_ref::<ServiceError>()
            .map(ServiceError::load_error)
            .or_else(|| e.downcast_ref::<LoadError>());
        if let Some(load_error) = load_error {
            eprintln!("Code: {}", load_error.status_code());
            for suggestion in load_error.recovery_suggestions() {
                eprintln!("  - {suggestion}");
            }
        }
        std::process::exit(1);
    }
}

/// Settings from `--config` or from the nearest `.apirec/settings.toml`.
fn load_settings(config: Option<&Path>) -> anyhow::Result<Settings> {
    let Some(path) = config else {
        return Settings::load().map_err(|e| anyhow!("Configuration error: {e}"));
    };
    let mut settings =
        Settings::load_from(path).map_err(|e| anyhow!("Configuration error: {e}"))?;
    if settings.workspace_root.is_none() {
        // `<root>/.apirec/settings.toml` anchors relative data paths at `<root>`
        settings.workspace_root = path
            .parent()
            .filter(|dir| dir.file_name().is_some_and(|name| name == CONFIG_DIR))
            .and_then(Path::parent)
            .map(Path::to_path_buf);
    }
    Ok(settings)
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { force } = cli.command {
        logging::init();
        return init::run_init(force);
    }

    let mut settings = load_settings(cli.config.as_deref())?;
    if cli.info {
        for target in ["index", "service", "pool"] {
            settings
                .logging
                .modules
                .insert(target.to_string(), "info".to_string());
        }
    }
    logging::init_with_config(&settings.logging);

    let service = IndexService::new(settings);
    let result = match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Config => init::run_config(service.settings()),
        Commands::Recommend {
            query,
            k,
            registry,
            json,
        } => recommend::run_recommend(&service, &query, k, registry.as_deref(), json),
        Commands::TopQuestion { query, json } => {
            recommend::run_top_question(&service, &query, json)
        }
        Commands::Batch {
            file,
            k,
            workers,
            quiet,
        } => batch::run_batch(&service, &file, k, workers, quiet),
        Commands::Evaluate {
            benchmark,
            ks,
            k,
            workers,
            json,
        } => evaluate::run_evaluate(&service, &benchmark, &ks, k, workers, json),
    };
    service.shutdown();
    result
}
