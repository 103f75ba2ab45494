//! Required secrets read from the process environment.
//!
//! Every loader takes a lookup closure so callers (and tests) can supply an
//! environment other than the real one. Binaries use the `from_env` helpers.

use thiserror::Error;

/// OpenAI API key variable.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Pinecone API key variable.
pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
/// Pinecone serverless region variable.
pub const PINECONE_ENV: &str = "PINECONE_ENV";
/// Pinecone index name variable used by the ask tool.
pub const PINECONE_INDEX: &str = "PINECONE_INDEX";

/// Index name used when `PINECONE_INDEX` is unset.
pub const DEFAULT_INDEX_NAME: &str = "cubs-index";

/// Startup configuration failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("{name} environment variable is required ({purpose})")]
    Missing {
        /// Variable name.
        name: &'static str,
        /// What the value is used for.
        purpose: &'static str,
    },
}

fn require<F>(lookup: &F, name: &'static str, purpose: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::Missing { name, purpose }),
    }
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Secrets needed by the collector.
#[derive(Clone)]
pub struct CollectorKeys {
    /// OpenAI embeddings key.
    pub openai_api_key: String,
    /// Pinecone key.
    pub pinecone_api_key: String,
    /// Pinecone region the index is created in.
    pub pinecone_region: String,
}

impl CollectorKeys {
    /// Loads the collector keys, failing on the first missing variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            openai_api_key: require(&lookup, OPENAI_API_KEY, "embedding requests")?,
            pinecone_api_key: require(&lookup, PINECONE_API_KEY, "vector index access")?,
            pinecone_region: require(&lookup, PINECONE_ENV, "vector index region")?,
        })
    }

    /// Loads the collector keys from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }
}

impl std::fmt::Debug for CollectorKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorKeys")
            .field("openai_api_key", &"<redacted>")
            .field("pinecone_api_key", &"<redacted>")
            .field("pinecone_region", &self.pinecone_region)
            .finish()
    }
}

/// Secrets needed by the embedding demo.
#[derive(Clone)]
pub struct DemoKeys {
    /// OpenAI embeddings key.
    pub openai_api_key: String,
}

impl DemoKeys {
    /// Loads the demo key from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            openai_api_key: require(&lookup, OPENAI_API_KEY, "embedding requests")?,
        })
    }

    /// Loads the demo key from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }
}

/// Secrets and index selection needed by the ask tool.
#[derive(Clone)]
pub struct AskKeys {
    /// OpenAI key used for both the question embedding and the answer.
    pub openai_api_key: String,
    /// Pinecone key.
    pub pinecone_api_key: String,
    /// Index to query; falls back to [`DEFAULT_INDEX_NAME`].
    pub index_name: String,
}

impl AskKeys {
    /// Loads the ask keys from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = require(&lookup, OPENAI_API_KEY, "embedding and chat requests")?;
        let pinecone_api_key = require(&lookup, PINECONE_API_KEY, "vector index access")?;
        let index_name = lookup(PINECONE_INDEX)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string());
        Ok(Self {
            openai_api_key,
            pinecone_api_key,
            index_name,
        })
    }

    /// Loads the ask keys from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }
}
