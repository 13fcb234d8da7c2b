use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScoringError};

/// Display multiplier applied to every score
pub const DEFAULT_SCALE: f64 = 100.0;

/// Adoption share (percent) below which a market is still in takeoff
pub const DEFAULT_STAGE_THRESHOLD: f64 = 20.0;

/// Survival probability at or above which a market counts as resilient
pub const DEFAULT_MARGIN_OF_SAFETY: f64 = 0.78;

/// One of the three weighted factors of the ROI score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Resilience,
    MarketRoom,
    Wealth,
}

impl Factor {
    pub const ALL: [Factor; 3] = [Factor::Resilience, Factor::MarketRoom, Factor::Wealth];

    pub fn label(self) -> &'static str {
        match self {
            Factor::Resilience => "resilience",
            Factor::MarketRoom => "market_room",
            Factor::Wealth => "wealth",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Factor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "resilience" | "safety" => Ok(Factor::Resilience),
            "market_room" | "room" => Ok(Factor::MarketRoom),
            "wealth" | "gdp" => Ok(Factor::Wealth),
            other => Err(format!(
                "unknown factor '{}' (expected resilience, market-room or wealth)",
                other
            )),
        }
    }
}

fn neutral_weight() -> f64 {
    1.0
}

/// Exponents applied to the three factors of the ROI score.
///
/// A weight of 0 removes a factor, 1 keeps it as measured, 2 squares it.
/// Any finite non-negative value is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightVector {
    #[serde(default = "neutral_weight")]
    pub resilience: f64,
    #[serde(default = "neutral_weight")]
    pub market_room: f64,
    #[serde(default = "neutral_weight")]
    pub wealth: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self::neutral()
    }
}

impl WeightVector {
    /// Build a validated weight vector
    pub fn new(resilience: f64, market_room: f64, wealth: f64) -> Result<Self> {
        let weights = Self {
            resilience,
            market_room,
            wealth,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// All weights at 1.0: every factor counts as measured
    pub fn neutral() -> Self {
        Self {
            resilience: 1.0,
            market_room: 1.0,
            wealth: 1.0,
        }
    }

    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Resilience => self.resilience,
            Factor::MarketRoom => self.market_room,
            Factor::Wealth => self.wealth,
        }
    }

    /// Copy of this vector with one weight replaced
    pub fn with(mut self, factor: Factor, value: f64) -> Self {
        match factor {
            Factor::Resilience => self.resilience = value,
            Factor::MarketRoom => self.market_room = value,
            Factor::Wealth => self.wealth = value,
        }
        self
    }

    /// Reject negative or non-finite weights
    pub fn validate(&self) -> Result<()> {
        for factor in Factor::ALL {
            let value = self.get(factor);
            if !value.is_finite() || value < 0.0 {
                return Err(ScoringError::InvalidWeight {
                    factor: factor.label(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Classification cut-offs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Adoption share in percent; below it a market is in `Takeoff`
    pub stage_threshold: f64,
    /// Survival probability; at or above it a market is `Resilient`
    pub margin_of_safety: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stage_threshold: DEFAULT_STAGE_THRESHOLD,
            margin_of_safety: DEFAULT_MARGIN_OF_SAFETY,
        }
    }
}

/// Everything a scoring request needs besides the records themselves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    pub weights: WeightVector,
    pub scale: f64,
    pub thresholds: Thresholds,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            weights: WeightVector::neutral(),
            scale: DEFAULT_SCALE,
            thresholds: Thresholds::default(),
        }
    }
}

/// Scoring section of the config file.
///
/// Every field is optional; missing fields fall back to the defaults.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   weights: { resilience: 2.0, market_room: 1.0, wealth: 0.5 }
///   scale: 100
///   stage_threshold: 20
///   margin_of_safety: 0.78
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Default weight vector (all 1.0 when absent)
    #[serde(default)]
    pub weights: Option<WeightVector>,

    /// Display multiplier (default: 100.0)
    #[serde(default)]
    pub scale: Option<f64>,

    /// Takeoff/Mature cut-off in percent (default: 20.0)
    #[serde(default)]
    pub stage_threshold: Option<f64>,

    /// Resilient/Vulnerable cut-off as a probability (default: 0.78)
    #[serde(default)]
    pub margin_of_safety: Option<f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: Some(WeightVector::neutral()),
            scale: Some(DEFAULT_SCALE),
            stage_threshold: Some(DEFAULT_STAGE_THRESHOLD),
            margin_of_safety: Some(DEFAULT_MARGIN_OF_SAFETY),
        }
    }
}

impl ScoringConfig {
    /// Resolve optional fields into concrete parameters
    pub fn params(&self) -> ScoringParams {
        ScoringParams {
            weights: self.weights.unwrap_or_default(),
            scale: self.scale.unwrap_or(DEFAULT_SCALE),
            thresholds: Thresholds {
                stage_threshold: self.stage_threshold.unwrap_or(DEFAULT_STAGE_THRESHOLD),
                margin_of_safety: self.margin_of_safety.unwrap_or(DEFAULT_MARGIN_OF_SAFETY),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_config() {
        let config = ScoringConfig::default();

        assert_eq!(config.weights, Some(WeightVector::neutral()));
        assert_eq!(config.scale, Some(100.0));
        assert_eq!(config.stage_threshold, Some(20.0));
        assert_eq!(config.margin_of_safety, Some(0.78));
    }

    #[test]
    fn test_scoring_config_serde_roundtrip() {
        let config = ScoringConfig::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_scoring_config_parse() {
        let yaml = r#"
weights:
  resilience: 2.0
margin_of_safety: 0.85
"#;
        let config: ScoringConfig = serde_saphyr::from_str(yaml).unwrap();
        let params = config.params();
        assert_eq!(params.weights.resilience, 2.0);
        assert_eq!(params.weights.market_room, 1.0);
        assert_eq!(params.weights.wealth, 1.0);
        assert_eq!(params.thresholds.margin_of_safety, 0.85);
        assert_eq!(params.thresholds.stage_threshold, DEFAULT_STAGE_THRESHOLD);
        assert_eq!(params.scale, DEFAULT_SCALE);
    }

    #[test]
    fn test_empty_scoring_config_parse() {
        let config: ScoringConfig = serde_saphyr::from_str("{}").unwrap();
        assert!(config.weights.is_none());
        assert_eq!(config.params(), ScoringParams::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let yaml = "weights:\n  safety: 1.0\n";
        assert!(serde_saphyr::from_str::<ScoringConfig>(yaml).is_err());
    }

    #[test]
    fn test_weight_vector_rejects_negative() {
        let err = WeightVector::new(1.0, -0.5, 1.0).unwrap_err();
        assert_eq!(
            err,
            ScoringError::InvalidWeight {
                factor: "market_room",
                value: -0.5
            }
        );
    }

    #[test]
    fn test_weight_vector_rejects_nan() {
        assert!(WeightVector::new(f64::NAN, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_weight_vector_accepts_large_weights() {
        assert!(WeightVector::new(0.0, 3.5, 10.0).is_ok());
    }

    #[test]
    fn test_with_replaces_one_weight() {
        let w = WeightVector::neutral().with(Factor::Wealth, 0.25);
        assert_eq!(w.wealth, 0.25);
        assert_eq!(w.resilience, 1.0);
        assert_eq!(w.market_room, 1.0);
    }

    #[test]
    fn test_factor_from_str() {
        assert_eq!("market-room".parse::<Factor>(), Ok(Factor::MarketRoom));
        assert_eq!("Resilience".parse::<Factor>(), Ok(Factor::Resilience));
        assert_eq!("gdp".parse::<Factor>(), Ok(Factor::Wealth));
        assert!("size".parse::<Factor>().is_err());
    }
}
