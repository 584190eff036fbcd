//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `CLINRAG_*` env vars.
//! Nested keys use a double underscore, e.g. `CLINRAG_RETRIEVAL__BUDGET__MAX_TOKENS=2000`.
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("CLINRAG_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// Build a config from an in-memory TOML document only.
    pub fn from_toml_str(toml: &str) -> Self {
        Self { figment: Figment::from(Toml::string(toml)) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed, validated settings. Missing keys fall back to defaults.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub retrieval: RetrievalSettings,
    /// Extra `alias = "CODE"` pairs layered over the built-in synonym table.
    pub synonyms: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataSettings {
    pub corpus_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { corpus_dir: "data/corpus".to_string() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalSettings {
    pub search: SearchSettings,
    pub scoring: ScoringSettings,
    pub budget: BudgetSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchSettings {
    /// Per-backend candidate limit.
    pub limit: usize,
    pub keyword_threshold: Option<f32>,
    pub vector_threshold: Option<f32>,
    pub timeout_ms: u64,
    pub enable_vector: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { limit: 15, keyword_threshold: None, vector_threshold: Some(0.03), timeout_ms: 3000, enable_vector: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringSettings {
    /// Weight of the keyword signal when a vector score is also present.
    pub keyword_weight: f32,
    pub vector_weight: f32,
    /// Weight of the keyword signal when it is the only signal.
    pub keyword_only_weight: f32,
    /// Additive bonus for chunks whose stored question matches the query.
    pub question_boost: f32,
    /// Minimum question/query similarity that earns the bonus.
    pub question_similarity: f32,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            keyword_weight: 0.5,
            vector_weight: 0.5,
            keyword_only_weight: 1.0,
            question_boost: 0.25,
            question_similarity: 0.75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BudgetSettings {
    pub max_tokens: usize,
    pub chars_per_token: usize,
    pub clinical_standard: f32,
    pub min_high_confidence: usize,
    pub top_chunks_reported: usize,
    pub preview_chars: usize,
    pub max_per_source: Option<usize>,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            max_tokens: 1500,
            chars_per_token: 4,
            clinical_standard: 0.80,
            min_high_confidence: 3,
            top_chunks_reported: 8,
            preview_chars: 100,
            max_per_source: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let scoring = &self.retrieval.scoring;
        let budget = &self.retrieval.budget;
        if budget.chars_per_token == 0 {
            return Err(Error::InvalidConfig("retrieval.budget.chars_per_token must be > 0".into()));
        }
        for (name, value) in [
            ("keyword_weight", scoring.keyword_weight),
            ("vector_weight", scoring.vector_weight),
            ("keyword_only_weight", scoring.keyword_only_weight),
            ("question_boost", scoring.question_boost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!("retrieval.scoring.{name} must be a non-negative number, got {value}")));
            }
        }
        if !(scoring.question_similarity > 0.0 && scoring.question_similarity <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "retrieval.scoring.question_similarity must be in (0, 1], got {}",
                scoring.question_similarity
            )));
        }
        if budget.max_per_source == Some(0) {
            return Err(Error::InvalidConfig("retrieval.budget.max_per_source must be >= 1 when set".into()));
        }
        Ok(())
    }

    /// Corpus directory resolved against `base` after `~`/`$VAR` expansion.
    pub fn corpus_dir(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.data.corpus_dir)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
