pub mod classify;
pub mod config;
pub mod engine;
pub mod rank;
pub mod sensitivity;
pub mod validation;

pub use classify::{
    classify, decision, market_stage, resilience_grade, Classification, Decision, MarketStage,
    ResilienceGrade,
};
pub use config::*;
pub use engine::{
    base_score, score, score_all, score_breakdown, validate_record, validate_scale, ScoreResult,
};
pub use rank::{allocate, is_conserved, rank, rank_top_n, Allocation, Ranked, ALLOCATION_TOLERANCE};
pub use sensitivity::{recompute, sweep, SweepPoint};
pub use validation::validate_scoring;
