//! Explicit lifecycle around the one-time knowledge-base load.
//!
//! ```text
//! IndexService::new(settings)  -> nothing loaded yet
//! service.engine()             -> first call loads; concurrent callers wait and share the outcome
//! service.shutdown()           -> releases the engine once every clone of it is dropped
//! ```
//!
//! A failed load is remembered: later calls return the same error without
//! retrying.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::config::Settings;
use crate::engine::RecommendEngine;
use crate::error::{LoadError, ServiceError, ServiceResult};
use crate::types::{ApiRecommendation, QuestionMatch};

type LoadOutcome = Result<Arc<RecommendEngine>, Arc<LoadError>>;

/// Owns the process-wide engine and the barrier that builds it.
#[derive(Debug)]
pub struct IndexService {
    settings: Settings,
    engine: OnceLock<LoadOutcome>,
}

impl IndexService {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            engine: OnceLock::new(),
        }
    }

    /// Wrap an engine that is already built.
    pub fn with_engine(settings: Settings, engine: RecommendEngine) -> Self {
        let service = Self::new(settings);
        let _ = service.engine.set(Ok(Arc::new(engine)));
        service
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// True once a load has completed, successfully or not.
    pub fn is_initialized(&self) -> bool {
        self.engine.get().is_some()
    }

    /// The engine, loading it on first use.
    pub fn engine(&self) -> ServiceResult<Arc<RecommendEngine>> {
        let outcome = self.engine.get_or_init(|| {
            let started = Instant::now();
            match RecommendEngine::load(&self.settings) {
                Ok(engine) => {
                    tracing::info!(target: "service",
                        "knowledge base ready in {:.2}s: {} questions, {} javadoc entries",
                        started.elapsed().as_secs_f64(),
                        engine.question_count(),
                        engine.javadoc_count()
                    );
                    Ok(Arc::new(engine))
                }
                Err(e) => {
                    tracing::error!(target: "service", "knowledge base failed to load: {e}");
                    Err(Arc::new(e))
                }
            }
        });
        outcome.clone().map_err(ServiceError::Load)
    }

    /// Recommend up to `k` APIs, loading the engine on first use.
    pub fn recommend(&self, query: &str, k: usize) -> ServiceResult<Vec<ApiRecommendation>> {
        Ok(self.engine()?.recommend(query, k))
    }

    /// Best-matching corpus question, loading the engine on first use.
    pub fn top_question(&self, query: &str) -> ServiceResult<Option<QuestionMatch>> {
        Ok(self.engine()?.top_question(query))
    }

    /// Drop the service's handle to the engine.
    pub fn shutdown(self) {
        if let Some(Ok(engine)) = self.engine.get() {
            let outstanding = Arc::strong_count(engine) - 1;
            if outstanding > 0 {
                tracing::debug!(target: "service",
                    "shutting down with {outstanding} engine handle(s) still held"
                );
            }
        }
        tracing::debug!(target: "service", "index service shut down");
    }
}
