//! Configuration module for the API recommendation engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.apirec/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `APIREC_` and use double underscores
//! to separate nested levels:
//! - `APIREC_DATA__DIR=/srv/kb` sets `data.dir`
//! - `APIREC_RETRIEVAL__CANDIDATE_COUNT=100` sets `retrieval.candidate_count`
//! - `APIREC_AGGREGATION__JAVADOC_WEIGHT=0.3` sets `aggregation.javadoc_weight`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::LoadError;

/// Directory holding the settings file, searched upward from the current directory.
pub const CONFIG_DIR: &str = ".apirec";

const ENV_PREFIX: &str = "APIREC_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .apirec is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Knowledge-base snapshot location
    #[serde(default)]
    pub data: DataConfig,

    /// Question ranking policy
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// API aggregation policy
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Batch worker pool
    #[serde(default)]
    pub workers: WorkerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// On-disk encoding of the word-embedding model.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingFormat {
    /// word2vec text format: `term v1 v2 ... vD` per line
    #[default]
    Text,
    /// word2vec binary format: `term ` followed by D little-endian f32
    Binary,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DataConfig {
    /// Directory containing the snapshot (relative paths resolve against the workspace root)
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,

    /// Word-embedding model file
    #[serde(default = "default_embeddings_file")]
    pub embeddings: PathBuf,

    /// Encoding of the embedding model file
    #[serde(default)]
    pub embedding_format: EmbeddingFormat,

    /// Idf table (JSON object of term -> weight)
    #[serde(default = "default_idf_file")]
    pub idf: PathBuf,

    /// Question corpus (JSON Lines)
    #[serde(default = "default_questions_file")]
    pub questions: PathBuf,

    /// Javadoc corpus (JSON Lines)
    #[serde(default = "default_javadoc_file")]
    pub javadoc: PathBuf,
}

/// How embedding cosine and idf cosine are combined into one question score.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlendStrategy {
    /// `w * embedding + (1 - w) * idf`
    #[default]
    Weighted,
    /// Harmonic mean of the non-negative parts
    Harmonic,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Number of candidate questions handed to the API aggregation
    #[serde(default = "default_candidate_count")]
    pub candidate_count: usize,

    /// Result size used when the caller does not pass one
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Idf weight for terms missing from the idf table (defaults to the table minimum)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_idf: Option<f32>,

    /// Blend strategy for the two similarity signals
    #[serde(default)]
    pub blend: BlendStrategy,

    /// Weight of the embedding cosine for the weighted blend
    #[serde(default = "default_embedding_weight")]
    pub embedding_weight: f32,

    /// Scan the question index with rayon instead of a single thread
    #[serde(default = "default_false")]
    pub parallel_scan: bool,
}

/// How candidate questions contribute to an API's aggregate score.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    /// `score * decay^rank`
    #[default]
    GeometricDecay,
    /// `score / (rank + 1)`
    ReciprocalRank,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AggregationConfig {
    /// Aggregation strategy
    #[serde(default)]
    pub strategy: AggregationStrategy,

    /// Per-rank decay for the geometric strategy, in (0, 1]
    #[serde(default = "default_decay")]
    pub decay: f32,

    /// Weight of the query/javadoc similarity added once per API
    #[serde(default = "default_javadoc_weight")]
    pub javadoc_weight: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WorkerConfig {
    /// Number of worker threads for batch recommendation
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Capacity of the task queue
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for every target
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `index = "info"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_embeddings_file() -> PathBuf {
    PathBuf::from("w2v_model.txt")
}
fn default_idf_file() -> PathBuf {
    PathBuf::from("idf.json")
}
fn default_questions_file() -> PathBuf {
    PathBuf::from("questions.jsonl")
}
fn default_javadoc_file() -> PathBuf {
    PathBuf::from("javadoc.jsonl")
}
fn default_candidate_count() -> usize {
    50
}
fn default_k() -> usize {
    8
}
fn default_embedding_weight() -> f32 {
    0.5
}
fn default_decay() -> f32 {
    0.5
}
fn default_javadoc_weight() -> f32 {
    0.0
}
fn default_pool_size() -> usize {
    (num_cpus::get() / 2).max(1)
}
fn default_queue_size() -> usize {
    256
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            data: DataConfig::default(),
            retrieval: RetrievalConfig::default(),
            aggregation: AggregationConfig::default(),
            workers: WorkerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            embeddings: default_embeddings_file(),
            embedding_format: EmbeddingFormat::default(),
            idf: default_idf_file(),
            questions: default_questions_file(),
            javadoc: default_javadoc_file(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_count: default_candidate_count(),
            default_k: default_k(),
            default_idf: None,
            blend: BlendStrategy::default(),
            embedding_weight: default_embedding_weight(),
            parallel_scan: false,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            strategy: AggregationStrategy::default(),
            decay: default_decay(),
            javadoc_weight: default_javadoc_weight(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            queue_size: default_queue_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

/// Resolved paths of the four snapshot artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub embeddings: PathBuf,
    pub idf: PathBuf,
    pub questions: PathBuf,
    pub javadoc: PathBuf,
}

impl DataConfig {
    /// Resolve artifact paths. Relative `dir` values are anchored at `root` when given.
    pub fn artifact_paths(&self, root: Option<&Path>) -> ArtifactPaths {
        let dir = match root {
            Some(root) if self.dir.is_relative() => root.join(&self.dir),
            _ => self.dir.clone(),
        };
        ArtifactPaths {
            embeddings: dir.join(&self.embeddings),
            idf: dir.join(&self.idf),
            questions: dir.join(&self.questions),
            javadoc: dir.join(&self.javadoc),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels; single underscores stay in field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for the .apirec directory
    /// from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .apirec is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolved locations of the snapshot artifacts.
    pub fn artifact_paths(&self) -> ArtifactPaths {
        self.data.artifact_paths(self.workspace_root.as_deref())
    }

    /// Reject policy values the engine cannot work with.
    pub fn validate(&self) -> Result<(), LoadError> {
        let fail = |reason: String| Err(LoadError::Config { reason });

        if self.retrieval.candidate_count == 0 {
            return fail("retrieval.candidate_count must be at least 1".to_string());
        }
        let weight = self.retrieval.embedding_weight;
        if !(0.0..=1.0).contains(&weight) {
            return fail(format!(
                "retrieval.embedding_weight must be in [0, 1], got {weight}"
            ));
        }
        let decay = self.aggregation.decay;
        if !(decay > 0.0 && decay <= 1.0) {
            return fail(format!("aggregation.decay must be in (0, 1], got {decay}"));
        }
        let javadoc_weight = self.aggregation.javadoc_weight;
        if !javadoc_weight.is_finite() || javadoc_weight < 0.0 {
            return fail(format!(
                "aggregation.javadoc_weight must be a non-negative number, got {javadoc_weight}"
            ));
        }
        if let Some(idf) = self.retrieval.default_idf {
            if !idf.is_finite() || idf < 0.0 {
                return fail(format!(
                    "retrieval.default_idf must be a non-negative number, got {idf}"
                ));
            }
        }
        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in `.apirec/` under the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let mut settings = Settings::default();
        if let Ok(current_dir) = std::env::current_dir() {
            settings.workspace_root = Some(current_dir);
        }

        settings.save(&config_path)?;
        Ok(config_path)
    }
}
