use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

/// One country in a dataset snapshot, the unit the engine scores.
///
/// `purchasing_power` is an opaque positive wealth proxy. Some sources use raw
/// GDP per capita, others a 0-10 index; whoever builds the snapshot must keep
/// one scale across all records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    pub survival_probability: f64,
    pub market_room: f64,
    pub purchasing_power: f64,
    pub infrastructure_saturation: f64,
    pub current_adoption_share: f64, // percent, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_period_share: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_period_policy_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunity_gap: Option<f64>,
}

impl CountryRecord {
    /// Change in adoption share against the prior period, if a baseline exists
    pub fn share_delta(&self) -> Option<f64> {
        self.prior_period_share
            .map(|prior| self.current_adoption_share - prior)
    }

    /// Change in policy score against the prior period, if both are present
    pub fn policy_delta(&self) -> Option<f64> {
        match (self.policy_score, self.prior_period_policy_score) {
            (Some(now), Some(prior)) => Some(now - prior),
            _ => None,
        }
    }
}

/// A record as it appears in a dataset file, before required fields are checked.
///
/// Accepts the column spellings found in exported audit sheets. The survival
/// probability may come either as a fraction or as a percentage column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCountryRecord {
    #[serde(default, alias = "country", alias = "Country")]
    pub name: Option<String>,
    #[serde(default, alias = "Survival_Prob", alias = "survival_prob")]
    pub survival_probability: Option<f64>,
    #[serde(default, alias = "new_prob_pct", alias = "New_Prob_Pct")]
    pub survival_pct: Option<f64>,
    #[serde(default, alias = "Market_Room")]
    pub market_room: Option<f64>,
    #[serde(default, alias = "Purchasing_Power")]
    pub purchasing_power: Option<f64>,
    #[serde(default, alias = "infra_saturation", alias = "Infra_Saturation")]
    pub infrastructure_saturation: Option<f64>,
    #[serde(
        default,
        alias = "EV_Share_Pct",
        alias = "ev_share_pct",
        alias = "lagged_share"
    )]
    pub current_adoption_share: Option<f64>,
    #[serde(default, alias = "EV_Share_Pct_2023")]
    pub prior_period_share: Option<f64>,
    #[serde(default, alias = "Policy_Score")]
    pub policy_score: Option<f64>,
    #[serde(default, alias = "Policy_Score_2023")]
    pub prior_period_policy_score: Option<f64>,
    #[serde(default, alias = "Opportunity_Gap")]
    pub opportunity_gap: Option<f64>,
}

const UNNAMED: &str = "<unnamed>";

fn required(value: Option<f64>, country: &str, field: &'static str) -> Result<f64, ScoringError> {
    value.ok_or_else(|| ScoringError::MissingField {
        country: country.to_string(),
        field,
    })
}

impl TryFrom<RawCountryRecord> for CountryRecord {
    type Error = ScoringError;

    fn try_from(raw: RawCountryRecord) -> Result<Self, Self::Error> {
        let name = match raw.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => {
                return Err(ScoringError::MissingField {
                    country: UNNAMED.to_string(),
                    field: "name",
                })
            }
        };

        // Fraction wins over the percentage column when both are present
        let survival = raw
            .survival_probability
            .or_else(|| raw.survival_pct.map(|pct| pct / 100.0));

        Ok(CountryRecord {
            survival_probability: required(survival, &name, "survival_probability")?,
            market_room: required(raw.market_room, &name, "market_room")?,
            purchasing_power: required(raw.purchasing_power, &name, "purchasing_power")?,
            infrastructure_saturation: required(
                raw.infrastructure_saturation,
                &name,
                "infrastructure_saturation",
            )?,
            current_adoption_share: required(
                raw.current_adoption_share,
                &name,
                "current_adoption_share",
            )?,
            prior_period_share: raw.prior_period_share,
            policy_score: raw.policy_score,
            prior_period_policy_score: raw.prior_period_policy_score,
            opportunity_gap: raw.opportunity_gap,
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_raw() -> RawCountryRecord {
        RawCountryRecord {
            name: Some("India".to_string()),
            survival_probability: Some(0.846),
            market_room: Some(0.95),
            purchasing_power: Some(4.5),
            infrastructure_saturation: Some(0.5),
            current_adoption_share: Some(5.2),
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_raw_converts() {
        let record = CountryRecord::try_from(complete_raw()).unwrap();
        assert_eq!(record.name, "India");
        assert_eq!(record.survival_probability, 0.846);
        assert!(record.prior_period_share.is_none());
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut raw = complete_raw();
        raw.market_room = None;
        let err = CountryRecord::try_from(raw).unwrap_err();
        assert_eq!(
            err,
            ScoringError::MissingField {
                country: "India".to_string(),
                field: "market_room",
            }
        );
    }

    #[test]
    fn test_missing_name() {
        let mut raw = complete_raw();
        raw.name = Some("   ".to_string());
        let err = CountryRecord::try_from(raw).unwrap_err();
        assert!(matches!(err, ScoringError::MissingField { field: "name", .. }));
    }

    #[test]
    fn test_percentage_survival_is_converted() {
        let mut raw = complete_raw();
        raw.survival_probability = None;
        raw.survival_pct = Some(78.0);
        let record = CountryRecord::try_from(raw).unwrap();
        assert!((record.survival_probability - 0.78).abs() < 1e-12);
    }

    #[test]
    fn test_fraction_preferred_over_percentage() {
        let mut raw = complete_raw();
        raw.survival_pct = Some(10.0);
        let record = CountryRecord::try_from(raw).unwrap();
        assert_eq!(record.survival_probability, 0.846);
    }

    #[test]
    fn test_aliased_columns_parse() {
        let json = r#"{
            "country": "Germany",
            "Survival_Prob": 0.28,
            "market_room": 0.2,
            "purchasing_power": 9.5,
            "infra_saturation": 0.9,
            "EV_Share_Pct": 22.5,
            "EV_Share_Pct_2023": 18.4,
            "iso_alpha": "DEU"
        }"#;
        let raw: RawCountryRecord = serde_json::from_str(json).unwrap();
        let record = CountryRecord::try_from(raw).unwrap();
        assert_eq!(record.name, "Germany");
        assert_eq!(record.infrastructure_saturation, 0.9);
        assert!((record.share_delta().unwrap() - 4.1).abs() < 1e-9);
    }

    #[test]
    fn test_policy_delta_needs_both_scores() {
        let mut record = CountryRecord::try_from(complete_raw()).unwrap();
        record.policy_score = Some(7.0);
        assert!(record.policy_delta().is_none());
        record.prior_period_policy_score = Some(5.5);
        assert_eq!(record.policy_delta(), Some(1.5));
    }
}
