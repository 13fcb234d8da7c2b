use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::intel::Intel;
use crate::scoring::ScoringConfig;

/// Capital mandate split across the top markets, in millions
pub const DEFAULT_TOTAL_CAPITAL: f64 = 100.0;

/// How many markets make the shortlist
pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dataset file (JSON or YAML). Relative paths resolve against the config file.
    #[serde(default)]
    pub dataset: Option<PathBuf>,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,

    #[serde(default)]
    pub allocation: Option<AllocationConfig>,

    /// Extra or replacement country narratives, keyed by country name
    #[serde(default)]
    pub intel: Option<HashMap<String, Intel>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AllocationConfig {
    #[serde(default)]
    pub total_capital: Option<f64>,

    #[serde(default)]
    pub top_n: Option<usize>,

    /// Only rank markets that clear the margin of safety
    #[serde(default)]
    pub deployable_only: Option<bool>,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            total_capital: Some(DEFAULT_TOTAL_CAPITAL),
            top_n: Some(DEFAULT_TOP_N),
            deployable_only: Some(false),
        }
    }
}

impl AllocationConfig {
    pub fn total_capital(&self) -> f64 {
        self.total_capital.unwrap_or(DEFAULT_TOTAL_CAPITAL)
    }

    pub fn top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    pub fn deployable_only(&self) -> bool {
        self.deployable_only.unwrap_or(false)
    }
}

/// Validate allocation settings, collecting every error
pub fn validate_allocation(config: &AllocationConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(capital) = config.total_capital {
        if !capital.is_finite() || capital <= 0.0 {
            errors.push(format!(
                "allocation.total_capital: must be positive, got {}",
                capital
            ));
        }
    }

    if config.top_n == Some(0) {
        errors.push("allocation.top_n: must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
