use serde::{Deserialize, Serialize};

/// One (institution, branch, level, period) admission outcome.
///
/// Nullable numerics mean "not reported for this period" and must stay null
/// through every layer; they are never coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub institution_code: i64,
    pub level_short_name: String,
    pub level: String,
    pub branch: String,
    pub period: String,
    pub period_date: String,
    pub quota: i64,
    pub filled: Option<i64>,
    pub unfilled_quota: Option<i64>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub min_score_rank: Option<i64>,
}
