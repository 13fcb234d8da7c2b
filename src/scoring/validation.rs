use super::config::{Factor, ScoringConfig};

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref weights) = config.weights {
        for factor in Factor::ALL {
            let value = weights.get(factor);
            if !value.is_finite() || value < 0.0 {
                errors.push(format!(
                    "scoring.weights.{}: must be a non-negative number, got {}",
                    factor.label(),
                    value
                ));
            }
        }
    }

    if let Some(scale) = config.scale {
        if !scale.is_finite() || scale <= 0.0 {
            errors.push(format!("scoring.scale: must be positive, got {}", scale));
        }
    }

    if let Some(threshold) = config.stage_threshold {
        if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
            errors.push(format!(
                "scoring.stage_threshold: must be a percentage between 0 and 100, got {}",
                threshold
            ));
        }
    }

    if let Some(margin) = config.margin_of_safety {
        if !margin.is_finite() || !(0.0..=1.0).contains(&margin) {
            errors.push(format!(
                "scoring.margin_of_safety: must be a probability between 0 and 1, got {}",
                margin
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::WeightVector;

    fn empty() -> ScoringConfig {
        ScoringConfig {
            weights: None,
            scale: None,
            stage_threshold: None,
            margin_of_safety: None,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_scoring(&ScoringConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_config() {
        assert!(validate_scoring(&empty()).is_ok());
    }

    #[test]
    fn test_negative_weight() {
        let config = ScoringConfig {
            weights: Some(WeightVector {
                resilience: 1.0,
                market_room: 1.0,
                wealth: -2.0,
            }),
            ..empty()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("scoring.weights.wealth"));
    }

    #[test]
    fn test_zero_scale() {
        let config = ScoringConfig {
            scale: Some(0.0),
            ..empty()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("scoring.scale"));
    }

    #[test]
    fn test_margin_given_as_percentage() {
        let config = ScoringConfig {
            margin_of_safety: Some(78.0),
            ..empty()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("scoring.margin_of_safety"));
    }

    #[test]
    fn test_collects_all_errors() {
        let config = ScoringConfig {
            weights: Some(WeightVector {
                resilience: -1.0, // Error 1
                market_room: f64::NAN, // Error 2
                wealth: 1.0,
            }),
            scale: Some(-100.0),          // Error 3
            stage_threshold: Some(120.0), // Error 4
            margin_of_safety: Some(0.78),
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
