//! Recommend and top-question commands.

use std::path::Path;

use crate::display::create_recommendation_table;
use crate::registry::{InMemoryRegistry, resolve_with_registry};
use crate::service::IndexService;

/// Run recommend command - rank APIs for one query.
pub fn run_recommend(
    service: &IndexService,
    query: &str,
    k: Option<usize>,
    registry: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let k = k.unwrap_or(service.settings().retrieval.default_k);
    let mut recommendations = service.recommend(query, k)?;

    if let Some(path) = registry {
        let registry = InMemoryRegistry::load(path)?;
        let before = recommendations.len();
        recommendations = resolve_with_registry(recommendations, &registry);
        tracing::info!(
            "registry kept {} of {before} recommendations",
            recommendations.len()
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
    } else if recommendations.is_empty() {
        println!("No APIs found for: {query}");
    } else {
        println!("{}", create_recommendation_table(&recommendations));
    }
    Ok(())
}

/// Run top-question command - show the best-matching corpus question.
pub fn run_top_question(service: &IndexService, query: &str, json: bool) -> anyhow::Result<()> {
    let best = service.top_question(query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&best)?);
        return Ok(());
    }
    match best {
        Some(question) => println!(
            "#{} {} (score {:.4})",
            question.id, question.title, question.score
        ),
        None => println!("The question corpus is empty"),
    }
    Ok(())
}
