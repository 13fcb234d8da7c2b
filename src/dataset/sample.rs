use super::loader::Dataset;
use super::types::CountryRecord;

/// Label of the built-in snapshot
pub const SAMPLE_SNAPSHOT: &str = "built-in sample (6 markets)";

#[allow(clippy::too_many_arguments)]
fn row(
    name: &str,
    survival_probability: f64,
    market_room: f64,
    purchasing_power: f64,
    infrastructure_saturation: f64,
    current_adoption_share: f64,
    prior_period_share: f64,
    opportunity_gap: f64,
) -> CountryRecord {
    CountryRecord {
        name: name.to_string(),
        survival_probability,
        market_room,
        purchasing_power,
        infrastructure_saturation,
        current_adoption_share,
        prior_period_share: Some(prior_period_share),
        policy_score: None,
        prior_period_policy_score: None,
        opportunity_gap: Some(opportunity_gap),
    }
}

/// Small snapshot used when no dataset file is configured.
///
/// Purchasing power is on the 0-10 index scale.
pub fn sample_dataset() -> Dataset {
    Dataset {
        snapshot: Some(SAMPLE_SNAPSHOT.to_string()),
        countries: vec![
            row("India", 0.846, 0.95, 4.5, 0.5, 5.2, 2.7, 0.846),
            row("Germany", 0.28, 0.2, 9.5, 0.9, 22.5, 20.0, 0.12),
            row("Australia", 0.892, 0.8, 8.5, 0.4, 12.0, 9.5, 0.65),
            row("USA", 0.892, 0.7, 9.8, 0.6, 9.5, 7.0, 0.55),
            row("Spain", 0.772, 0.4, 7.0, 0.5, 18.0, 15.5, 0.30),
            row("Iceland", 0.746, 0.3, 8.0, 0.7, 19.5, 17.0, 0.25),
        ],
    }
}
