use serde::Serialize;

use super::config::{Factor, WeightVector};
use crate::dataset::CountryRecord;
use crate::error::{Result, ScoringError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorContribution {
    pub factor: Factor,
    pub value: f64,    // Metric as measured
    pub weight: f64,   // Exponent applied
    pub weighted: f64, // value ^ weight
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub factors: Vec<FactorContribution>,
    pub damping: f64, // 1 + infrastructure_saturation
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

fn out_of_range(record: &CountryRecord, field: &'static str, value: f64, expected: &'static str) -> ScoringError {
    ScoringError::Domain {
        subject: record.name.clone(),
        field,
        value,
        expected,
    }
}

fn check_unit_interval(record: &CountryRecord, field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range(record, field, value, "0..=1"))
    }
}

/// Check the metrics that feed the ROI formula.
///
/// Out-of-range values are rejected, never clamped.
pub fn validate_record(record: &CountryRecord) -> Result<()> {
    check_unit_interval(record, "survival_probability", record.survival_probability)?;
    check_unit_interval(record, "market_room", record.market_room)?;

    let power = record.purchasing_power;
    if !power.is_finite() || power <= 0.0 {
        return Err(out_of_range(record, "purchasing_power", power, "> 0"));
    }

    // 1 + saturation is the denominator
    let saturation = record.infrastructure_saturation;
    if !saturation.is_finite() || saturation <= -1.0 {
        return Err(out_of_range(record, "infrastructure_saturation", saturation, "> -1"));
    }

    Ok(())
}

/// The display multiplier must be a positive finite number
pub fn validate_scale(scale: f64) -> Result<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(ScoringError::Domain {
            subject: "scoring".to_string(),
            field: "scale",
            value: scale,
            expected: "> 0",
        })
    }
}

/// Raise a factor to its weight. A zero base only supports integral weights.
fn weighted_factor(record: &CountryRecord, field: &'static str, value: f64, weight: f64) -> Result<f64> {
    if value == 0.0 && weight.fract() != 0.0 {
        return Err(out_of_range(
            record,
            field,
            value,
            "> 0 when its weight is fractional",
        ));
    }
    // powf(0.0, 0.0) == 1.0
    Ok(value.powf(weight))
}

/// Score a record and keep the per-factor trail.
///
/// ```text
/// score = p^w_res * room^w_room * power^w_wealth / (1 + saturation) * scale
/// ```
pub fn score_breakdown(record: &CountryRecord, weights: &WeightVector, scale: f64) -> Result<ScoreResult> {
    weights.validate()?;
    validate_scale(scale)?;
    validate_record(record)?;

    let metrics = [
        (Factor::Resilience, "survival_probability", record.survival_probability),
        (Factor::MarketRoom, "market_room", record.market_room),
        (Factor::Wealth, "purchasing_power", record.purchasing_power),
    ];

    let mut product = 1.0;
    let mut factors = Vec::with_capacity(metrics.len());
    for (factor, field, value) in metrics {
        let weight = weights.get(factor);
        let weighted = weighted_factor(record, field, value, weight)?;
        product *= weighted;
        factors.push(FactorContribution {
            factor,
            value,
            weight,
            weighted,
        });
    }

    let damping = 1.0 + record.infrastructure_saturation;

    Ok(ScoreResult {
        score: product / damping * scale,
        breakdown: ScoreBreakdown {
            factors,
            damping,
            scale,
        },
    })
}

/// ROI score of one record under the given weights
pub fn score(record: &CountryRecord, weights: &WeightVector, scale: f64) -> Result<f64> {
    score_breakdown(record, weights, scale).map(|r| r.score)
}

/// Score with every weight at 1.0, the as-measured reference value
pub fn base_score(record: &CountryRecord, scale: f64) -> Result<f64> {
    score(record, &WeightVector::neutral(), scale)
}

/// Score every record, in input order. Fails on the first invalid record.
pub fn score_all(records: &[CountryRecord], weights: &WeightVector, scale: f64) -> Result<Vec<f64>> {
    weights.validate()?;
    validate_scale(scale)?;
    records.iter().map(|r| score(r, weights, scale)).collect()
}
