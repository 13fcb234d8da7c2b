use serde::Serialize;
use std::fmt;

use super::config::Thresholds;
use crate::dataset::CountryRecord;
use crate::error::{Result, ScoringError};

/// Position on the adoption S-curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MarketStage {
    Takeoff,
    Mature,
}

/// Whether the market is expected to keep growing without subsidy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResilienceGrade {
    Resilient,
    Vulnerable,
}

/// Capital decision under the margin of safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Decision {
    Deploy,
    Veto,
}

impl fmt::Display for MarketStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketStage::Takeoff => f.write_str("Takeoff"),
            MarketStage::Mature => f.write_str("Mature"),
        }
    }
}

impl fmt::Display for ResilienceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResilienceGrade::Resilient => f.write_str("Resilient"),
            ResilienceGrade::Vulnerable => f.write_str("Vulnerable"),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Deploy => f.write_str("DEPLOY"),
            Decision::Veto => f.write_str("VETO"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub stage: MarketStage,
    pub resilience: ResilienceGrade,
    pub decision: Decision,
}

/// `Takeoff` while adoption share is below the threshold, `Mature` from it on
pub fn market_stage(record: &CountryRecord, stage_threshold: f64) -> Result<MarketStage> {
    let share = record.current_adoption_share;
    if !share.is_finite() || !(0.0..=100.0).contains(&share) {
        return Err(ScoringError::Domain {
            subject: record.name.clone(),
            field: "current_adoption_share",
            value: share,
            expected: "0..=100",
        });
    }

    if share < stage_threshold {
        Ok(MarketStage::Takeoff)
    } else {
        Ok(MarketStage::Mature)
    }
}

/// `Resilient` when survival probability reaches the margin of safety
pub fn resilience_grade(record: &CountryRecord, margin_of_safety: f64) -> Result<ResilienceGrade> {
    let p = record.survival_probability;
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(ScoringError::Domain {
            subject: record.name.clone(),
            field: "survival_probability",
            value: p,
            expected: "0..=1",
        });
    }

    if p >= margin_of_safety {
        Ok(ResilienceGrade::Resilient)
    } else {
        Ok(ResilienceGrade::Vulnerable)
    }
}

pub fn decision(grade: ResilienceGrade) -> Decision {
    match grade {
        ResilienceGrade::Resilient => Decision::Deploy,
        ResilienceGrade::Vulnerable => Decision::Veto,
    }
}

/// Run both classifiers and derive the capital decision
pub fn classify(record: &CountryRecord, thresholds: &Thresholds) -> Result<Classification> {
    let stage = market_stage(record, thresholds.stage_threshold)?;
    let resilience = resilience_grade(record, thresholds.margin_of_safety)?;
    Ok(Classification {
        stage,
        resilience,
        decision: decision(resilience),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::engine::tests::sample_record;
    use crate::scoring::{DEFAULT_MARGIN_OF_SAFETY, DEFAULT_STAGE_THRESHOLD};

    fn with_share(share: f64) -> CountryRecord {
        let mut r = sample_record("Test", 0.5, 0.5, 2.0, 0.0);
        r.current_adoption_share = share;
        r
    }

    fn with_survival(p: f64) -> CountryRecord {
        sample_record("Test", p, 0.5, 2.0, 0.0)
    }

    #[test]
    fn test_stage_boundary_is_mature() {
        assert_eq!(
            market_stage(&with_share(20.0), DEFAULT_STAGE_THRESHOLD).unwrap(),
            MarketStage::Mature
        );
        assert_eq!(
            market_stage(&with_share(19.999), DEFAULT_STAGE_THRESHOLD).unwrap(),
            MarketStage::Takeoff
        );
    }

    #[test]
    fn test_resilience_boundary_is_resilient() {
        assert_eq!(
            resilience_grade(&with_survival(0.78), DEFAULT_MARGIN_OF_SAFETY).unwrap(),
            ResilienceGrade::Resilient
        );
        assert_eq!(
            resilience_grade(&with_survival(0.7799), DEFAULT_MARGIN_OF_SAFETY).unwrap(),
            ResilienceGrade::Vulnerable
        );
    }

    #[test]
    fn test_margin_is_adjustable() {
        let r = with_survival(0.80);
        assert_eq!(resilience_grade(&r, 0.78).unwrap(), ResilienceGrade::Resilient);
        assert_eq!(resilience_grade(&r, 0.85).unwrap(), ResilienceGrade::Vulnerable);
    }

    #[test]
    fn test_classification_is_total() {
        let thresholds = Thresholds::default();
        for share in [0.0, 5.0, 19.9, 20.0, 55.0, 100.0] {
            for p in [0.0, 0.3, 0.78, 0.9, 1.0] {
                let mut r = with_survival(p);
                r.current_adoption_share = share;
                let c = classify(&r, &thresholds).unwrap();
                assert_eq!(c.decision, decision(c.resilience));
            }
        }
    }

    #[test]
    fn test_negative_share_rejected() {
        let err = market_stage(&with_share(-1.0), DEFAULT_STAGE_THRESHOLD).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::Domain { field: "current_adoption_share", .. }
        ));
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        assert!(resilience_grade(&with_survival(1.01), DEFAULT_MARGIN_OF_SAFETY).is_err());
        assert!(resilience_grade(&with_survival(f64::NAN), DEFAULT_MARGIN_OF_SAFETY).is_err());
    }

    #[test]
    fn test_decision_follows_grade() {
        assert_eq!(decision(ResilienceGrade::Resilient), Decision::Deploy);
        assert_eq!(decision(ResilienceGrade::Vulnerable), Decision::Veto);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(MarketStage::Takeoff.to_string(), "Takeoff");
        assert_eq!(ResilienceGrade::Vulnerable.to_string(), "Vulnerable");
        assert_eq!(Decision::Deploy.to_string(), "DEPLOY");
    }
}
