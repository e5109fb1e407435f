//! Pipeline statistics configuration

use crate::error::FlowError;
use crate::filters::ComponentPairSplitter;
use serde::{Deserialize, Serialize};

/// Environment variable holding the autocovariance lag length
pub const LAG_LENGTH_VAR: &str = "SAMPLEFLOW_LAG_LENGTH";
/// Environment variable holding the component pair, e.g. `"1,3"`
pub const PAIR_COMPONENTS_VAR: &str = "SAMPLEFLOW_PAIR_COMPONENTS";

/// Statistics configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Number of autocovariance lags to track (default: 10)
    pub lag_length: usize,
    /// Components extracted by a pair splitter, if any
    pub pair_components: Option<[usize; 2]>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            lag_length: 10,
            pair_components: None,
        }
    }
}

impl StatsConfig {
    pub fn new(lag_length: usize) -> Self {
        StatsConfig {
            lag_length,
            ..StatsConfig::default()
        }
    }

    pub fn with_pair_components(mut self, first: usize, second: usize) -> Self {
        self.pair_components = Some([first, second]);
        self
    }

    /// Parses and validates a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, FlowError> {
        let config: StatsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration from `SAMPLEFLOW_*` environment variables,
    /// falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, FlowError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, FlowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = StatsConfig::default();

        if let Some(raw) = lookup(LAG_LENGTH_VAR) {
            config.lag_length = raw.trim().parse::<usize>().map_err(|_| {
                FlowError::InvalidConfig(format!("{} must be an integer, got '{}'", LAG_LENGTH_VAR, raw))
            })?;
        }

        if let Some(raw) = lookup(PAIR_COMPONENTS_VAR) {
            let indices = raw
                .split(',')
                .map(|part| part.trim().parse::<usize>())
                .collect::<Result<Vec<_>, _>>()
                .ok()
                .filter(|indices| indices.len() == 2)
                .ok_or_else(|| {
                    FlowError::InvalidConfig(format!(
                        "{} must be two comma-separated indices, got '{}'",
                        PAIR_COMPONENTS_VAR, raw
                    ))
                })?;
            config.pair_components = Some([indices[0], indices[1]]);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        if self.lag_length == 0 {
            return Err(FlowError::InvalidConfig(
                "lag_length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the configured pair splitter, if any.
    pub fn pair_splitter(&self) -> Option<ComponentPairSplitter> {
        self.pair_components
            .map(|[first, second]| ComponentPairSplitter::new(first, second))
    }
}
