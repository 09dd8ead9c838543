//! Runtime configuration read from the environment.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, VellumError};
use crate::input::ParserConfig;
use crate::provision::PurgePolicy;
use crate::query::SessionPolicy;
use crate::store::VectorizerPolicy;

/// Store endpoint variable.
pub const ENV_STORE_URL: &str = "WEAVIATE_URL";
/// Store credential variable.
pub const ENV_STORE_API_KEY: &str = "WEAVIATE_API_KEY";
const ENV_STORE_TIMEOUT: &str = "VELLUM_STORE_TIMEOUT_SECS";
const ENV_VECTORIZER: &str = "VELLUM_VECTORIZER";
const ENV_PURGE_POLICY: &str = "VELLUM_PURGE_POLICY";
const ENV_QUERY_URL: &str = "VELLUM_QUERY_AGENT_URL";
const ENV_QUERY_TIMEOUT: &str = "VELLUM_QUERY_TIMEOUT_SECS";
const ENV_SESSION_POLICY: &str = "VELLUM_SESSION_POLICY";

/// Default query agent endpoint.
pub const DEFAULT_QUERY_AGENT_URL: &str = "https://api.agents.weaviate.io/v1/query/run";

/// Connection settings for the document store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Cluster URL.
    pub url: String,
    /// API credential.
    pub api_key: String,
    /// Deadline applied to every store call.
    pub timeout: Duration,
    /// Vectorization applied to every created collection.
    pub vectorizer: VectorizerPolicy,
}

impl StoreConfig {
    /// Create settings with default timeout and vectorizer.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            vectorizer: VectorizerPolicy::default(),
        }
    }

    /// Read settings from the process environment.
    ///
    /// Both the endpoint and the credential are required.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read settings through a variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = required(&lookup, ENV_STORE_URL)?;
        let api_key = required(&lookup, ENV_STORE_API_KEY)?;

        let mut config = Self::new(url, api_key);
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_STORE_TIMEOUT)? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(module) = non_empty(&lookup, ENV_VECTORIZER) {
            config.vectorizer = VectorizerPolicy::new(module);
        }
        Ok(config)
    }
}

/// Settings for an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// What to delete before files are processed.
    pub purge: PurgePolicy,
    /// Objects per batched write.
    pub batch_size: usize,
    /// Process files on a worker pool.
    pub parallel: bool,
    /// Row failure reasons kept per file.
    pub max_failure_samples: usize,
    /// Parser configuration.
    pub parser: ParserConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            purge: PurgePolicy::Reset,
            batch_size: 100,
            parallel: false,
            max_failure_samples: 5,
            parser: ParserConfig::default(),
        }
    }
}

/// Settings for the query capability.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Query agent endpoint.
    pub endpoint: String,
    /// Deadline for one question.
    pub timeout: Duration,
    /// When a new session replaces the current one.
    pub session_policy: SessionPolicy,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_QUERY_AGENT_URL.to_string(),
            timeout: Duration::from_secs(120),
            session_policy: SessionPolicy::default(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default)]
pub struct VellumConfig {
    /// Ingestion settings.
    pub ingest: IngestConfig,
    /// Query settings.
    pub query: QueryConfig,
}

impl VellumConfig {
    /// Read optional overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read optional overrides through a variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(policy) = parse_var::<PurgePolicy>(&lookup, ENV_PURGE_POLICY)? {
            config.ingest.purge = policy;
        }
        if let Some(endpoint) = non_empty(&lookup, ENV_QUERY_URL) {
            config.query.endpoint = endpoint;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_QUERY_TIMEOUT)? {
            config.query.timeout = Duration::from_secs(secs);
        }
        if let Some(policy) = parse_var::<SessionPolicy>(&lookup, ENV_SESSION_POLICY)? {
            config.query.session_policy = policy;
        }
        Ok(config)
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    non_empty(lookup, name)
        .ok_or_else(|| VellumError::Config(format!("{} environment variable not set", name)))
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup, name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| VellumError::Config(format!("Invalid {}: {}", name, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_store_config_requires_both_settings() {
        let err = StoreConfig::from_vars(vars(&[(ENV_STORE_URL, "https://x")])).unwrap_err();
        assert!(err.to_string().contains(ENV_STORE_API_KEY));

        let err = StoreConfig::from_vars(vars(&[(ENV_STORE_API_KEY, "k")])).unwrap_err();
        assert!(err.to_string().contains(ENV_STORE_URL));
    }

    #[test]
    fn test_blank_setting_is_missing() {
        let result = StoreConfig::from_vars(vars(&[
            (ENV_STORE_URL, "  "),
            (ENV_STORE_API_KEY, "k"),
        ]));
        assert!(matches!(result, Err(VellumError::Config(_))));
    }

    #[test]
    fn test_store_config_overrides() {
        let config = StoreConfig::from_vars(vars(&[
            (ENV_STORE_URL, "https://cluster.example"),
            (ENV_STORE_API_KEY, "secret"),
            (ENV_STORE_TIMEOUT, "5"),
            (ENV_VECTORIZER, "text2vec-openai"),
        ]))
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.vectorizer.module, "text2vec-openai");
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let result = StoreConfig::from_vars(vars(&[
            (ENV_STORE_URL, "https://cluster.example"),
            (ENV_STORE_API_KEY, "secret"),
            (ENV_STORE_TIMEOUT, "soon"),
        ]));
        assert!(matches!(result, Err(VellumError::Config(_))));
    }

    #[test]
    fn test_vellum_config_policies() {
        let config = VellumConfig::from_vars(vars(&[
            (ENV_PURGE_POLICY, "additive"),
            (ENV_SESSION_POLICY, "per-batch"),
        ]))
        .unwrap();
        assert_eq!(config.ingest.purge, PurgePolicy::Additive);
        assert_eq!(config.query.session_policy, SessionPolicy::PerBatch);

        let defaults = VellumConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(defaults.ingest.purge, PurgePolicy::Reset);
        assert_eq!(defaults.query.endpoint, DEFAULT_QUERY_AGENT_URL);
    }
}
