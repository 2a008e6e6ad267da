//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `TRIAGE_*` environment variables.
//! Everything here is read once before a run and treated as immutable while a
//! query executes.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_COMPOSITE_MIN, DEFAULT_EMBED_CHUNK_DELAY, DEFAULT_EMBED_CHUNK_SIZE,
    DEFAULT_JUDGMENT_TIMEOUT, DEFAULT_PAGE_SIZE, DEFAULT_PROBABILITY_MIN, DEFAULT_RECORD_LIMIT,
    DEFAULT_SAMPLE_SIZE, DEFAULT_SOURCE_BACKOFF, DEFAULT_SOURCE_RETRIES,
    DEFAULT_TARGET_QUALIFY_RATE, DEFAULT_VECTOR_MIN, MAX_PAGE_SIZE, ORACLE_SCALE_MAX,
};
use crate::scoring::SemanticRule;

/// Per-query pre-filter and judgment thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryThresholds {
    /// Minimum query/document cosine similarity. Default: `0.45`.
    pub vector_min: f32,
    /// Minimum composite rule score. Default: `0.40`.
    pub composite_min: f32,
    /// Oracle probability (0..10) at or above which a judged document qualifies. Default: `5.0`.
    pub probability_min: f32,
}

impl Default for QueryThresholds {
    fn default() -> Self {
        Self {
            vector_min: DEFAULT_VECTOR_MIN,
            composite_min: DEFAULT_COMPOSITE_MIN,
            probability_min: DEFAULT_PROBABILITY_MIN,
        }
    }
}

/// Global fast-path / fail-fast policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedupPolicy {
    /// Pre-filtered documents observed before the policy acts. Default: `10`.
    pub sample_size: u32,
    /// Yield at which the fast path locks in, in `[0, 1]`. Default: `0.5`.
    pub target_qualify_rate: f32,
    /// Abort a query whose sample produced no qualified document. Default: `true`.
    pub fail_fast: bool,
}

impl Default for SpeedupPolicy {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            target_qualify_rate: DEFAULT_TARGET_QUALIFY_RATE,
            fail_fast: true,
        }
    }
}

/// Pipeline configuration loaded from environment variables.
///
/// Use [`PipelineConfig::from_env`] to read `TRIAGE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub thresholds: QueryThresholds,
    pub speedup: SpeedupPolicy,

    /// Documents requested per page. Default: `25`, clamped to `1..=100`.
    pub page_size: usize,
    /// Maximum documents fetched per query. Default: `500`.
    pub record_limit: usize,
    /// Offset of the first page. Default: `0`.
    pub start_offset: usize,

    /// Embeddings requested concurrently. Default: `5`.
    pub embed_chunk_size: usize,
    /// Pause between embedding chunks. Default: `200ms`.
    pub embed_chunk_delay: Duration,

    /// Ceiling for a single judgment call. Default: `45s`.
    pub judgment_timeout: Duration,

    /// Attempts per candidate page fetch. Default: `3`.
    pub source_retries: usize,
    /// Pause between page fetch attempts. Default: `750ms`.
    pub source_backoff: Duration,

    /// JSON file holding the semantic rule set.
    pub rules_path: Option<PathBuf>,
    /// Topics handed to the judgment oracle.
    pub topics: Vec<String>,

    /// Model name passed to the judgment backend. Default: `gpt-4o-mini`.
    pub oracle_model: String,
    /// Embeddings endpoint. Default: `https://api.openai.com/v1/embeddings`.
    pub embedding_url: String,
    /// Embedding model name. Default: `text-embedding-3-small`.
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
}

/// Default oracle model used when `TRIAGE_ORACLE_MODEL` is not set.
pub const DEFAULT_ORACLE_MODEL: &str = "gpt-4o-mini";
/// Default embeddings endpoint used when `TRIAGE_EMBEDDING_URL` is not set.
pub const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1/embeddings";
/// Default embedding model used when `TRIAGE_EMBEDDING_MODEL` is not set.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            thresholds: QueryThresholds::default(),
            speedup: SpeedupPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
            record_limit: DEFAULT_RECORD_LIMIT,
            start_offset: 0,
            embed_chunk_size: DEFAULT_EMBED_CHUNK_SIZE,
            embed_chunk_delay: DEFAULT_EMBED_CHUNK_DELAY,
            judgment_timeout: DEFAULT_JUDGMENT_TIMEOUT,
            source_retries: DEFAULT_SOURCE_RETRIES,
            source_backoff: DEFAULT_SOURCE_BACKOFF,
            rules_path: None,
            topics: Vec::new(),
            oracle_model: DEFAULT_ORACLE_MODEL.to_string(),
            embedding_url: DEFAULT_EMBEDDING_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_api_key: None,
        }
    }
}

impl PipelineConfig {
    const ENV_VECTOR_MIN: &'static str = "TRIAGE_VECTOR_MIN";
    const ENV_COMPOSITE_MIN: &'static str = "TRIAGE_COMPOSITE_MIN";
    const ENV_PROBABILITY_MIN: &'static str = "TRIAGE_PROBABILITY_MIN";
    const ENV_SAMPLE_SIZE: &'static str = "TRIAGE_SAMPLE_SIZE";
    const ENV_TARGET_RATE: &'static str = "TRIAGE_TARGET_RATE";
    const ENV_FAIL_FAST: &'static str = "TRIAGE_FAIL_FAST";
    const ENV_PAGE_SIZE: &'static str = "TRIAGE_PAGE_SIZE";
    const ENV_RECORD_LIMIT: &'static str = "TRIAGE_RECORD_LIMIT";
    const ENV_START_OFFSET: &'static str = "TRIAGE_START_OFFSET";
    const ENV_EMBED_CHUNK: &'static str = "TRIAGE_EMBED_CHUNK";
    const ENV_EMBED_DELAY_MS: &'static str = "TRIAGE_EMBED_DELAY_MS";
    const ENV_JUDGMENT_TIMEOUT_SECS: &'static str = "TRIAGE_JUDGMENT_TIMEOUT_SECS";
    const ENV_SOURCE_RETRIES: &'static str = "TRIAGE_SOURCE_RETRIES";
    const ENV_SOURCE_BACKOFF_MS: &'static str = "TRIAGE_SOURCE_BACKOFF_MS";
    const ENV_RULES_PATH: &'static str = "TRIAGE_RULES_PATH";
    const ENV_TOPICS: &'static str = "TRIAGE_TOPICS";
    const ENV_ORACLE_MODEL: &'static str = "TRIAGE_ORACLE_MODEL";
    const ENV_EMBEDDING_URL: &'static str = "TRIAGE_EMBEDDING_URL";
    const ENV_EMBEDDING_MODEL: &'static str = "TRIAGE_EMBEDDING_MODEL";
    const ENV_EMBEDDING_API_KEY: &'static str = "TRIAGE_EMBEDDING_API_KEY";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let thresholds = QueryThresholds {
            vector_min: Self::parse_f32_from_env(
                Self::ENV_VECTOR_MIN,
                defaults.thresholds.vector_min,
            )?,
            composite_min: Self::parse_f32_from_env(
                Self::ENV_COMPOSITE_MIN,
                defaults.thresholds.composite_min,
            )?,
            probability_min: Self::parse_f32_from_env(
                Self::ENV_PROBABILITY_MIN,
                defaults.thresholds.probability_min,
            )?,
        };

        let speedup = SpeedupPolicy {
            sample_size: Self::parse_u64_from_env(
                Self::ENV_SAMPLE_SIZE,
                defaults.speedup.sample_size as u64,
            ) as u32,
            target_qualify_rate: Self::parse_f32_from_env(
                Self::ENV_TARGET_RATE,
                defaults.speedup.target_qualify_rate,
            )?,
            fail_fast: Self::parse_bool_from_env(Self::ENV_FAIL_FAST, defaults.speedup.fail_fast)?,
        };

        let page_size = (Self::parse_u64_from_env(Self::ENV_PAGE_SIZE, defaults.page_size as u64)
            as usize)
            .clamp(1, MAX_PAGE_SIZE);
        let record_limit =
            Self::parse_u64_from_env(Self::ENV_RECORD_LIMIT, defaults.record_limit as u64) as usize;
        let start_offset =
            Self::parse_u64_from_env(Self::ENV_START_OFFSET, defaults.start_offset as u64) as usize;
        let embed_chunk_size =
            Self::parse_u64_from_env(Self::ENV_EMBED_CHUNK, defaults.embed_chunk_size as u64)
                as usize;
        let embed_chunk_delay = Duration::from_millis(Self::parse_u64_from_env(
            Self::ENV_EMBED_DELAY_MS,
            defaults.embed_chunk_delay.as_millis() as u64,
        ));
        let judgment_timeout = Duration::from_secs(Self::parse_u64_from_env(
            Self::ENV_JUDGMENT_TIMEOUT_SECS,
            defaults.judgment_timeout.as_secs(),
        ));
        let source_retries =
            Self::parse_u64_from_env(Self::ENV_SOURCE_RETRIES, defaults.source_retries as u64)
                as usize;
        let source_backoff = Duration::from_millis(Self::parse_u64_from_env(
            Self::ENV_SOURCE_BACKOFF_MS,
            defaults.source_backoff.as_millis() as u64,
        ));

        let rules_path = Self::parse_optional_path_from_env(Self::ENV_RULES_PATH);
        let topics = Self::parse_list_from_env(Self::ENV_TOPICS);
        let oracle_model = Self::parse_string_from_env(Self::ENV_ORACLE_MODEL, defaults.oracle_model);
        let embedding_url =
            Self::parse_string_from_env(Self::ENV_EMBEDDING_URL, defaults.embedding_url);
        let embedding_model =
            Self::parse_string_from_env(Self::ENV_EMBEDDING_MODEL, defaults.embedding_model);
        let embedding_api_key = env::var(Self::ENV_EMBEDDING_API_KEY)
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Self {
            thresholds,
            speedup,
            page_size,
            record_limit,
            start_offset,
            embed_chunk_size,
            embed_chunk_delay,
            judgment_timeout,
            source_retries,
            source_backoff,
            rules_path,
            topics,
            oracle_model,
            embedding_url,
            embedding_model,
            embedding_api_key,
        })
    }

    /// Validates ranges and paths (does not read the rules file).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("vector_min", self.thresholds.vector_min),
            ("composite_min", self.thresholds.composite_min),
        ] {
            if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name,
                    expected: "a finite value in [-1, 1]",
                    value,
                });
            }
        }

        let probability_min = self.thresholds.probability_min;
        if !probability_min.is_finite() || !(0.0..=ORACLE_SCALE_MAX).contains(&probability_min) {
            return Err(ConfigError::OutOfRange {
                name: "probability_min",
                expected: "a finite value in [0, 10]",
                value: probability_min,
            });
        }

        let rate = self.speedup.target_qualify_rate;
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::OutOfRange {
                name: "target_qualify_rate",
                expected: "a finite value in [0, 1]",
                value: rate,
            });
        }

        if self.speedup.sample_size == 0 {
            return Err(ConfigError::ZeroValue {
                name: "sample_size",
            });
        }
        if self.embed_chunk_size == 0 {
            return Err(ConfigError::ZeroValue {
                name: "embed_chunk_size",
            });
        }
        if self.source_retries == 0 {
            return Err(ConfigError::ZeroValue {
                name: "source_retries",
            });
        }

        if let Some(ref path) = self.rules_path
            && !path.exists()
        {
            return Err(ConfigError::PathNotFound { path: path.clone() });
        }

        Ok(())
    }

    /// Reads the configured rule set, or an empty set when no file is configured.
    pub fn load_rules(&self) -> Result<Vec<SemanticRule>, ConfigError> {
        match &self.rules_path {
            Some(path) => load_rules_file(path),
            None => Ok(Vec::new()),
        }
    }

    fn parse_f32_from_env(name: &'static str, default: f32) -> Result<f32, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { name, value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_bool_from_env(name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match env::var(name) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidBool { name, value }),
            },
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_list_from_env(var_name: &str) -> Vec<String> {
        env::var(var_name)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}

/// Reads a JSON array of [`SemanticRule`]s.
pub fn load_rules_file(path: &Path) -> Result<Vec<SemanticRule>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::RulesRead {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| ConfigError::RulesParse {
        path: path.to_path_buf(),
        source,
    })
}
