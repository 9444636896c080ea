//! Configuration loader and typed settings.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env
//! vars, in the same order for every binary. Collection-specific policy
//! (format routing, topic assignment, thresholds, model names) lives here
//! so the engine code stays free of hard-coded collection facts.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{DocFormat, Topic};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_"));

        Ok(Self { figment })
    }

    /// Build a config from a literal TOML string (tests, fixtures).
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let figment = Figment::new().merge(Toml::string(toml));
        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("failed to get '{key}': {e}")))
    }

    /// Extract the full typed settings tree, applying defaults for any
    /// omitted section.
    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| Error::InvalidConfig(format!("invalid settings: {e}")))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub chunking: ChunkingSettings,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub routing: RoutingSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub docs_dir: String,
    pub index_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { docs_dir: "./documents".to_string(), index_dir: "./index_db".to_string() }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, in characters.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: 600, chunk_overlap: 100 }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Cosine-distance cutoff; candidates above it never reach generation.
    pub distance_threshold: f32,
    /// Maximum number of chunks returned to the prompt assembler.
    pub max_results: usize,
    /// Over-fetch factor for the k-NN call before threshold filtering.
    pub candidate_multiplier: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { distance_threshold: 0.5, max_results: 3, candidate_multiplier: 10 }
    }
}

/// Collection-specific routing policy. The defaults mirror the shipped
/// document collection: portable documents carry the Technology topic and
/// are embedded remotely; everything else is embedded locally.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Formats embedded by the remote provider (and stored in the remote
    /// partition). All other formats use the local provider/partition.
    pub remote_formats: Vec<String>,
    /// Topics whose unrestricted queries are scoped to the remote
    /// partition. All other topics scope to the local partition.
    pub remote_topics: Vec<String>,
    /// Topic assigned to each format at ingestion (format tag -> topic).
    pub topics: Vec<FormatTopic>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormatTopic {
    pub format: String,
    pub topic: String,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            remote_formats: vec!["portable-document".to_string()],
            remote_topics: vec!["Technology".to_string()],
            topics: vec![
                FormatTopic { format: "portable-document".into(), topic: "Technology".into() },
                FormatTopic { format: "plain-text".into(), topic: "People".into() },
                FormatTopic { format: "hypertext".into(), topic: "Science".into() },
                FormatTopic { format: "structured-markup".into(), topic: "Literature".into() },
            ],
        }
    }
}

impl RoutingSettings {
    /// Resolve the configured topic for a format. Every format must be
    /// covered; a gap is a configuration error.
    pub fn topic_for_format(&self, format: DocFormat) -> Result<Topic> {
        for entry in &self.topics {
            if entry.format.parse::<DocFormat>()? == format {
                return entry
                    .topic
                    .parse::<Topic>()
                    .map_err(|_| Error::InvalidConfig(format!("bad topic '{}' in routing.topics", entry.topic)));
            }
        }
        Err(Error::InvalidConfig(format!("no topic configured for format '{format}'")))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub remote: RemoteEmbeddingSettings,
    pub local: LocalEmbeddingSettings,
    /// Replace both providers with deterministic fake embeddings
    /// (tests and offline development). Also honored via
    /// `APP_USE_FAKE_EMBEDDINGS=1`.
    pub use_fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            remote: RemoteEmbeddingSettings::default(),
            local: LocalEmbeddingSettings::default(),
            use_fake: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteEmbeddingSettings {
    pub base_url: String,
    pub model: String,
    pub dim: usize,
    /// Env var holding the API key.
    pub api_key_env: String,
}

impl Default for RemoteEmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "embedding-001".to_string(),
            dim: 768,
            api_key_env: "GOOGLE_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalEmbeddingSettings {
    pub model_dir: String,
    pub dim: usize,
    pub max_len: usize,
}

impl Default for LocalEmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: "./models/all-MiniLM-L6-v2".to_string(), dim: 384, max_len: 256 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    /// Topic committed to when inference cannot be parsed; the topic
    /// classifier never returns an "unknown" state.
    pub default_topic: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "gemma3".to_string(),
            default_topic: "Science".to_string(),
        }
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

/// Resolve a possibly relative path against a given base directory after
/// expansion. If `p` is absolute, it's returned as-is.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_format() {
        let routing = RoutingSettings::default();
        for format in DocFormat::ALL {
            routing.topic_for_format(format).expect("topic for format");
        }
        assert_eq!(
            routing.topic_for_format(DocFormat::PortableDocument).ok(),
            Some(Topic::Technology)
        );
    }

    #[test]
    fn settings_from_toml_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            [retrieval]
            distance_threshold = 0.25

            [chunking]
            chunk_size = 400
            chunk_overlap = 50
            "#,
        )
        .expect("config");
        let settings = config.settings().expect("settings");
        assert!((settings.retrieval.distance_threshold - 0.25).abs() < f32::EPSILON);
        assert_eq!(settings.chunking.chunk_size, 400);
        // untouched sections keep defaults
        assert_eq!(settings.retrieval.max_results, 3);
        assert_eq!(settings.llm.model, "gemma3");
    }
}
