use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{AllocationConfig, Config};
use crate::dataset::CountryRecord;
use crate::error::{Result, ScoringError};
use crate::intel::{Intel, IntelTable};
use crate::scoring::{
    allocate, base_score, classify, rank, score_breakdown, Classification, Decision,
    ScoreResult, ScoringParams, Thresholds, WeightVector,
};

/// Parameters of one portfolio request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationSettings {
    pub params: ScoringParams,
    pub top_n: usize,
    /// Capital to split; `None` ranks without allocating
    pub total_capital: Option<f64>,
    pub deployable_only: bool,
}

impl EvaluationSettings {
    /// Settings from the config file, with defaults for anything unset
    pub fn from_config(config: &Config) -> Self {
        let params = config.scoring.clone().unwrap_or_default().params();
        let allocation = config.allocation.clone().unwrap_or_default();
        Self::new(params, &allocation)
    }

    pub fn new(params: ScoringParams, allocation: &AllocationConfig) -> Self {
        Self {
            params,
            top_n: allocation.top_n(),
            total_capital: Some(allocation.total_capital()),
            deployable_only: allocation.deployable_only(),
        }
    }

    /// Same shortlist, no capital split
    pub fn ranking_only(self) -> Self {
        Self {
            total_capital: None,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioEntry<'a> {
    pub rank: usize, // 1-based
    pub record: &'a CountryRecord,
    pub score: f64,
    pub classification: Classification,
    pub share: Option<f64>,
    pub amount: Option<f64>,
}

/// The shortlisted markets with their slice of the mandate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio<'a> {
    pub entries: Vec<PortfolioEntry<'a>>,
    pub total_capital: Option<f64>,
    pub weights: WeightVector,
    /// Markets scored before the shortlist was cut
    pub considered: usize,
    /// Markets dropped for failing the margin of safety
    pub vetoed: usize,
}

/// Score, classify, rank and allocate a whole snapshot.
///
/// The dataset is only read. One invalid record fails the whole call. Without
/// a capital figure the shortlist is ranked only, so an all-zero snapshot
/// still ranks.
pub fn evaluate_portfolio<'a>(
    records: &'a [CountryRecord],
    settings: &EvaluationSettings,
) -> Result<Portfolio<'a>> {
    let params = &settings.params;
    let ranked = rank(records, &params.weights, params.scale)?;

    let mut classified = Vec::with_capacity(ranked.len());
    for r in ranked {
        let classification = classify(r.record, &params.thresholds)?;
        classified.push((r, classification));
    }

    let considered = classified.len();
    let mut vetoed = 0;
    if settings.deployable_only {
        classified.retain(|(_, c)| c.decision == Decision::Deploy);
        vetoed = considered - classified.len();
        if classified.is_empty() && considered > 0 {
            warn!(
                margin_of_safety = params.thresholds.margin_of_safety,
                "every market was vetoed, nothing to allocate"
            );
        }
    }

    classified.truncate(settings.top_n);

    let splits: Vec<(Option<f64>, Option<f64>)> = match settings.total_capital {
        Some(total) => {
            let shortlist: Vec<_> = classified.iter().map(|(r, _)| r.clone()).collect();
            allocate(&shortlist, total)?
                .into_iter()
                .map(|a| (Some(a.share), Some(a.amount)))
                .collect()
        }
        None => vec![(None, None); classified.len()],
    };

    let entries = classified
        .into_iter()
        .zip(splits)
        .enumerate()
        .map(|(i, ((ranked, classification), (share, amount)))| PortfolioEntry {
            rank: i + 1,
            record: ranked.record,
            score: ranked.score,
            classification,
            share,
            amount,
        })
        .collect::<Vec<_>>();

    debug!(
        considered,
        vetoed,
        selected = entries.len(),
        "portfolio evaluated"
    );

    Ok(Portfolio {
        entries,
        total_capital: settings.total_capital,
        weights: params.weights,
        considered,
        vetoed,
    })
}

/// Everything known about one market under the current weights
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport<'a> {
    pub record: &'a CountryRecord,
    pub score: ScoreResult,
    /// Score with all weights at 1.0
    pub base_score: f64,
    pub rank: usize, // 1-based, among all markets
    pub of: usize,
    pub classification: Classification,
    pub stage_threshold: f64,
    pub margin_of_safety: f64,
    pub share_delta: Option<f64>,
    pub policy_delta: Option<f64>,
    pub intel: Intel,
}

/// Build the audit report for one country
pub fn audit_country<'a>(
    records: &'a [CountryRecord],
    country: &str,
    params: &ScoringParams,
    intel: &IntelTable,
) -> Result<AuditReport<'a>> {
    let wanted = country.trim();
    let record = records
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| ScoringError::UnknownCountry(wanted.to_string()))?;

    let ranked = rank(records, &params.weights, params.scale)?;
    let position = ranked
        .iter()
        .position(|r| std::ptr::eq(r.record, record))
        .map_or(ranked.len(), |i| i + 1);

    let Thresholds {
        stage_threshold,
        margin_of_safety,
    } = params.thresholds;

    Ok(AuditReport {
        record,
        score: score_breakdown(record, &params.weights, params.scale)?,
        base_score: base_score(record, params.scale)?,
        rank: position,
        of: ranked.len(),
        classification: classify(record, &params.thresholds)?,
        stage_threshold,
        margin_of_safety,
        share_delta: record.share_delta(),
        policy_delta: record.policy_delta(),
        intel: intel.lookup(&record.name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample_dataset;
    use crate::scoring::engine::tests::sample_record;
    use crate::scoring::{is_conserved, Allocation, MarketStage, ResilienceGrade};

    fn settings(top_n: usize, deployable_only: bool) -> EvaluationSettings {
        EvaluationSettings {
            params: ScoringParams::default(),
            top_n,
            total_capital: Some(100.0),
            deployable_only,
        }
    }

    fn amounts_conserved(portfolio: &Portfolio) -> bool {
        let allocations: Vec<Allocation> = portfolio
            .entries
            .iter()
            .map(|e| Allocation {
                record: e.record,
                score: e.score,
                share: e.share.unwrap(),
                amount: e.amount.unwrap(),
            })
            .collect();
        is_conserved(&allocations, portfolio.total_capital.unwrap())
    }

    #[test]
    fn test_portfolio_ranks_and_allocates() {
        let dataset = sample_dataset();
        let portfolio = evaluate_portfolio(&dataset.countries, &settings(3, false)).unwrap();

        assert_eq!(portfolio.entries.len(), 3);
        assert_eq!(portfolio.considered, 6);
        assert_eq!(portfolio.vetoed, 0);
        assert_eq!(portfolio.entries[0].rank, 1);
        assert!(portfolio.entries[0].score >= portfolio.entries[1].score);
        assert!(amounts_conserved(&portfolio));
    }

    #[test]
    fn test_deployable_only_drops_vetoed() {
        let dataset = sample_dataset();
        let portfolio = evaluate_portfolio(&dataset.countries, &settings(10, true)).unwrap();

        // Germany, Spain and Iceland sit below 0.78
        assert_eq!(portfolio.vetoed, 3);
        assert!(portfolio
            .entries
            .iter()
            .all(|e| e.classification.decision == Decision::Deploy));
        assert!(amounts_conserved(&portfolio));
    }

    #[test]
    fn test_everything_vetoed_gives_empty_portfolio() {
        let dataset = sample_dataset();
        let mut s = settings(10, true);
        s.params.thresholds.margin_of_safety = 0.99;
        let portfolio = evaluate_portfolio(&dataset.countries, &s).unwrap();
        assert!(portfolio.entries.is_empty());
        assert_eq!(portfolio.vetoed, 6);
    }

    #[test]
    fn test_invalid_weight_fails_evaluation() {
        let dataset = sample_dataset();
        let mut s = settings(3, false);
        s.params.weights.resilience = -1.0;
        let err = evaluate_portfolio(&dataset.countries, &s).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidWeight { .. }));
    }

    #[test]
    fn test_all_zero_snapshot_ranks_without_allocating() {
        let records = vec![
            sample_record("A", 0.0, 0.5, 2.0, 0.0),
            sample_record("B", 0.0, 0.9, 3.0, 0.0),
        ];
        let s = settings(2, false);

        let ranked = evaluate_portfolio(&records, &s.ranking_only()).unwrap();
        assert_eq!(ranked.entries.len(), 2);
        assert_eq!(ranked.entries[0].record.name, "A");
        assert_eq!(ranked.entries[1].record.name, "B");
        assert!(ranked.entries.iter().all(|e| e.score == 0.0 && e.amount.is_none()));
        assert!(ranked.total_capital.is_none());

        let err = evaluate_portfolio(&records, &s).unwrap_err();
        assert_eq!(err, ScoringError::DegenerateAllocation { count: 2 });
    }

    #[test]
    fn test_settings_from_default_config() {
        let s = EvaluationSettings::from_config(&Config::default());
        assert_eq!(s.top_n, 10);
        assert_eq!(s.total_capital, Some(100.0));
        assert!(!s.deployable_only);
        assert_eq!(s.params, ScoringParams::default());
    }

    #[test]
    fn test_audit_report() {
        let dataset = sample_dataset();
        let intel = IntelTable::with_defaults();
        let report =
            audit_country(&dataset.countries, "india", &ScoringParams::default(), &intel).unwrap();

        assert_eq!(report.record.name, "India");
        assert!((report.score.score - 241.11).abs() < 0.01);
        assert_eq!(report.base_score, report.score.score);
        assert_eq!(report.of, 6);
        assert_eq!(report.classification.stage, MarketStage::Takeoff);
        assert_eq!(report.classification.resilience, ResilienceGrade::Resilient);
        assert!((report.share_delta.unwrap() - 2.5).abs() < 1e-9);
        assert!(report.policy_delta.is_none());
        assert_eq!(report.intel.headline, "Emerging Growth");
    }

    #[test]
    fn test_audit_mature_vulnerable_market() {
        let dataset = sample_dataset();
        let report = audit_country(
            &dataset.countries,
            "Germany",
            &ScoringParams::default(),
            &IntelTable::with_defaults(),
        )
        .unwrap();
        assert_eq!(report.classification.stage, MarketStage::Mature);
        assert_eq!(report.classification.decision, Decision::Veto);
        assert_eq!(report.rank, 6);
    }

    #[test]
    fn test_audit_unknown_country() {
        let dataset = sample_dataset();
        let err = audit_country(
            &dataset.countries,
            "Atlantis",
            &ScoringParams::default(),
            &IntelTable::new(),
        )
        .unwrap_err();
        assert_eq!(err, ScoringError::UnknownCountry("Atlantis".to_string()));
    }
}
