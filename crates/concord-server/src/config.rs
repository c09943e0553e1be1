use concord_core::oracle::AnthropicOracleConfig;
use concord_core::{
    AnthropicOracle, CandidateGateway, ConflictsChecker, DisabledOracle, EntityStore,
    MatchOracleAdapter, Oracle, ReconciliationEngine, RequestOrchestrator, SamplingParams,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Contents of `concord.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcordConfig {
    pub server: ServerConfig,
    pub oracle: OracleConfig,
    pub store: StoreConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub enabled: bool,
    pub provider: String,
    pub base_url: String,
    pub model: String,
    /// `ANTHROPIC_API_KEY` takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub match_max_tokens: u32,
    pub conflicts_max_tokens: u32,
    pub temperature: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "anthropic".to_string(),
            base_url: concord_core::oracle::DEFAULT_BASE_URL.to_string(),
            model: concord_core::oracle::DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 30,
            match_max_tokens: concord_core::matcher::MATCH_MAX_TOKENS,
            conflicts_max_tokens: concord_core::conflicts::CONFLICTS_MAX_TOKENS,
            temperature: concord_core::matcher::ORACLE_TEMPERATURE,
        }
    }
}

impl OracleConfig {
    /// API key from the environment, falling back to the config file.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .or_else(|| self.api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub fetch_limit: usize,
    pub sample_on_error: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            fetch_limit: concord_core::DEFAULT_FETCH_LIMIT,
            sample_on_error: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub default_threshold: u8,
    /// Entities reconciled at once within a request.
    pub concurrency: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_threshold: concord_core::DEFAULT_THRESHOLD,
            concurrency: 1,
        }
    }
}

impl ConcordConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults when the file is missing; a file that exists but does not
    /// parse is logged and also replaced by defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.server.data_dir.join("concord.redb")
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.matching.default_threshold > 100 {
            errors.push(format!(
                "[matching] default_threshold must be 0-100, got {}",
                self.matching.default_threshold
            ));
        }
        if self.matching.concurrency == 0 {
            errors.push("[matching] concurrency must be at least 1".to_string());
        }
        if self.store.fetch_limit == 0 {
            errors.push("[store] fetch_limit must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.oracle.temperature) {
            errors.push(format!(
                "[oracle] temperature must be within 0.0-1.0, got {}",
                self.oracle.temperature
            ));
        }
        if self.oracle.model.trim().is_empty() {
            errors.push("[oracle] model must not be empty".to_string());
        }
        if self.oracle.provider != "anthropic" {
            errors.push(format!(
                "[oracle] unknown provider '{}' (supported: anthropic)",
                self.oracle.provider
            ));
        }
        if self.oracle.match_max_tokens == 0 || self.oracle.conflicts_max_tokens == 0 {
            errors.push("[oracle] max token budgets must be at least 1".to_string());
        }

        errors
    }

    /// The configured oracle, or a disabled one when matching should run
    /// in degraded mode only.
    pub fn build_oracle(&self) -> anyhow::Result<Arc<dyn Oracle>> {
        if !self.oracle.enabled {
            info!("Oracle disabled by config; using string similarity only");
            return Ok(Arc::new(DisabledOracle));
        }

        let Some(api_key) = self.oracle.resolved_api_key() else {
            warn!("No {} set; using string similarity only", API_KEY_ENV);
            return Ok(Arc::new(DisabledOracle));
        };

        let oracle = AnthropicOracle::new(
            AnthropicOracleConfig::new(api_key)
                .with_base_url(&self.oracle.base_url)
                .with_model(&self.oracle.model)
                .with_timeout(Duration::from_secs(self.oracle.timeout_secs)),
        )?;
        info!("Oracle: {} ({})", self.oracle.provider, oracle.model());
        Ok(Arc::new(oracle))
    }

    pub fn build_orchestrator(
        &self,
        store: Option<Arc<dyn EntityStore>>,
        oracle: Arc<dyn Oracle>,
    ) -> RequestOrchestrator {
        let gateway = match store {
            Some(store) => CandidateGateway::new(store),
            None => CandidateGateway::unavailable(),
        }
        .with_limit(self.store.fetch_limit)
        .with_sample_on_error(self.store.sample_on_error);

        let matcher = MatchOracleAdapter::new(oracle.clone()).with_params(SamplingParams::new(
            self.oracle.temperature,
            self.oracle.match_max_tokens,
        ));
        let conflicts = ConflictsChecker::new(oracle).with_params(SamplingParams::new(
            self.oracle.temperature,
            self.oracle.conflicts_max_tokens,
        ));

        RequestOrchestrator::new(ReconciliationEngine::new(gateway, matcher), conflicts)
            .with_concurrency(self.matching.concurrency)
            .with_default_threshold(self.matching.default_threshold)
    }
}
