//! External text-generation service used to judge name similarity.
//!
//! The oracle is opaque: it takes a prompt and returns free text that is
//! expected, but not guaranteed, to embed JSON. Callers treat every reply
//! as untrusted input (see [`extract`]).

mod anthropic;
pub mod extract;

pub use anthropic::{AnthropicOracle, AnthropicOracleConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

use crate::error::{ConcordError, Result};
use async_trait::async_trait;

/// Sampling parameters passed with each prompt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl SamplingParams {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature: temperature.clamp(0.0, 1.0),
            max_tokens,
        }
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Send one prompt and return the raw text reply.
    async fn complete(&self, prompt: &str, params: SamplingParams) -> Result<String>;
}

/// Oracle that is never reachable. Forces every caller onto its degraded path.
#[derive(Debug, Clone, Default)]
pub struct DisabledOracle;

#[async_trait]
impl Oracle for DisabledOracle {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str, _params: SamplingParams) -> Result<String> {
        Err(ConcordError::OracleUnavailable("oracle disabled".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_params_clamp_temperature() {
        assert_eq!(SamplingParams::new(3.0, 10).temperature, 1.0);
        assert_eq!(SamplingParams::new(-1.0, 10).temperature, 0.0);
    }

    #[tokio::test]
    async fn test_disabled_oracle_always_fails() {
        let err = DisabledOracle
            .complete("anything", SamplingParams::new(0.1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::ConcordError::OracleUnavailable(_)));
    }
}
