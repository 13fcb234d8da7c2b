use super::config::WeightVector;
use super::engine::{score, validate_scale};
use crate::dataset::CountryRecord;
use crate::error::{Result, ScoringError};

/// Relative tolerance for the sum of allocations against the mandate
pub const ALLOCATION_TOLERANCE: f64 = 1e-6;

/// A record with its score, in ranking order
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<'a> {
    pub record: &'a CountryRecord,
    pub score: f64,
}

/// Capital assigned to one ranked record
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<'a> {
    pub record: &'a CountryRecord,
    pub score: f64,
    pub share: f64,  // Fraction of the mandate, 0-1
    pub amount: f64, // share * total_capital
}

/// Score every record and sort descending.
///
/// The sort is stable: equal scores keep their input order.
pub fn rank<'a>(records: &'a [CountryRecord], weights: &WeightVector, scale: f64) -> Result<Vec<Ranked<'a>>> {
    weights.validate()?;
    validate_scale(scale)?;

    let mut ranked = records
        .iter()
        .map(|record| score(record, weights, scale).map(|value| Ranked { record, score: value }))
        .collect::<Result<Vec<_>>>()?;

    // slice::sort_by is stable
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    Ok(ranked)
}

/// The `n` best records. Asking for more than exist returns all of them.
pub fn rank_top_n<'a>(
    records: &'a [CountryRecord],
    weights: &WeightVector,
    scale: f64,
    n: usize,
) -> Result<Vec<Ranked<'a>>> {
    let mut ranked = rank(records, weights, scale)?;
    ranked.truncate(n);
    Ok(ranked)
}

/// Split `total_capital` across the ranked records in proportion to score.
///
/// The amounts sum to `total_capital` within [`ALLOCATION_TOLERANCE`]
/// (relative). A set whose scores sum to zero cannot be split and fails with
/// `DegenerateAllocation`.
pub fn allocate<'a>(ranked: &[Ranked<'a>], total_capital: f64) -> Result<Vec<Allocation<'a>>> {
    if !total_capital.is_finite() || total_capital < 0.0 {
        return Err(ScoringError::Domain {
            subject: "allocation".to_string(),
            field: "total_capital",
            value: total_capital,
            expected: ">= 0",
        });
    }

    if ranked.is_empty() {
        return Ok(Vec::new());
    }

    let total_score: f64 = ranked.iter().map(|r| r.score).sum();
    if total_score == 0.0 {
        return Err(ScoringError::DegenerateAllocation {
            count: ranked.len(),
        });
    }

    Ok(ranked
        .iter()
        .map(|r| {
            let share = r.score / total_score;
            Allocation {
                record: r.record,
                score: r.score,
                share,
                amount: share * total_capital,
            }
        })
        .collect())
}

/// Whether allocations add up to the mandate within tolerance
pub fn is_conserved(allocations: &[Allocation], total_capital: f64) -> bool {
    let sum: f64 = allocations.iter().map(|a| a.amount).sum();
    let tolerance = ALLOCATION_TOLERANCE * total_capital.abs().max(1.0);
    (sum - total_capital).abs() <= tolerance
}
