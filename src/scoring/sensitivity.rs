use serde::Serialize;

use super::config::{Factor, WeightVector};
use super::engine::score;
use crate::dataset::CountryRecord;
use crate::error::Result;

/// One point of a single-factor sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub weight: f64,
    pub score: f64,
    /// score / score under the base weights; None when the base score is 0
    pub ratio: Option<f64>,
}

/// Score a record under a caller-supplied weight vector
pub fn recompute(record: &CountryRecord, weight_override: &WeightVector, scale: f64) -> Result<f64> {
    score(record, weight_override, scale)
}

/// Vary one factor's weight over `values`, holding the others at `base`
pub fn sweep(
    record: &CountryRecord,
    base: &WeightVector,
    factor: Factor,
    values: &[f64],
    scale: f64,
) -> Result<Vec<SweepPoint>> {
    let base_score = score(record, base, scale)?;

    values
        .iter()
        .map(|&weight| {
            let s = score(record, &base.with(factor, weight), scale)?;
            let ratio = if base_score == 0.0 {
                None
            } else {
                Some(s / base_score)
            };
            Ok(SweepPoint {
                weight,
                score: s,
                ratio,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoringError;
    use crate::scoring::engine::tests::sample_record;
    use crate::scoring::DEFAULT_SCALE;

    fn india() -> CountryRecord {
        sample_record("India", 0.846, 0.95, 4.5, 0.5)
    }

    #[test]
    fn test_recompute_matches_score() {
        let w = WeightVector::new(2.0, 0.5, 1.5).unwrap();
        assert_eq!(
            recompute(&india(), &w, DEFAULT_SCALE).unwrap(),
            score(&india(), &w, DEFAULT_SCALE).unwrap()
        );
    }

    #[test]
    fn test_recompute_is_deterministic() {
        let w = WeightVector::new(1.7, 0.3, 1.1).unwrap();
        let a = recompute(&india(), &w, DEFAULT_SCALE).unwrap();
        let b = recompute(&india(), &w, DEFAULT_SCALE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sweep_resilience() {
        let points = sweep(
            &india(),
            &WeightVector::neutral(),
            Factor::Resilience,
            &[0.0, 1.0, 2.0],
            DEFAULT_SCALE,
        )
        .unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[1].ratio, Some(1.0));
        assert!((points[2].ratio.unwrap() - 0.846).abs() < 1e-12);
        assert!((points[0].ratio.unwrap() - 1.0 / 0.846).abs() < 1e-12);
    }

    #[test]
    fn test_sweep_rejects_negative_value() {
        let err = sweep(
            &india(),
            &WeightVector::neutral(),
            Factor::Wealth,
            &[1.0, -0.5],
            DEFAULT_SCALE,
        )
        .unwrap_err();
        assert!(matches!(err, ScoringError::InvalidWeight { factor: "wealth", .. }));
    }

    #[test]
    fn test_sweep_ratio_none_for_zero_base() {
        let r = sample_record("Zero", 0.0, 0.5, 2.0, 0.0);
        let points = sweep(
            &r,
            &WeightVector::neutral(),
            Factor::Resilience,
            &[0.0],
            DEFAULT_SCALE,
        )
        .unwrap();
        assert_eq!(points[0].ratio, None);
        assert_eq!(points[0].score, 100.0);
    }
}
