// SPDX-License-Identifier: Apache-2.0

use crate::QueryError;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Range reported when a numeric column has zero non-null values.
pub const SCORE_RANGE_FALLBACK: NumericRange = NumericRange {
    min: 0.0,
    max: 100.0,
};
pub const QUOTA_RANGE_FALLBACK: NumericRange = NumericRange {
    min: 0.0,
    max: 1000.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeFacets {
    pub min_score: NumericRange,
    pub quota: NumericRange,
}

/// Whole-dataset facet summary. Changes only on re-import, so callers cache
/// it for minutes at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetSet {
    pub city: Vec<String>,
    pub ownership_type: Vec<String>,
    pub institution_kind: Vec<String>,
    pub branch: Vec<String>,
    pub period: Vec<String>,
    pub ranges: RangeFacets,
}

/// Sorted distinct non-empty values of each categorical dimension, plus the
/// min/max of each numeric dimension over its non-null values.
pub fn compute_facets(conn: &Connection) -> Result<FacetSet, QueryError> {
    Ok(FacetSet {
        city: distinct_values(conn, "hastaneler", "city")?,
        ownership_type: distinct_values(conn, "hastaneler", "ownership_type")?,
        institution_kind: distinct_values(conn, "hastaneler", "institution_kind")?,
        branch: distinct_values(conn, "tus_puanlar", "branch")?,
        period: distinct_values(conn, "tus_puanlar", "period")?,
        ranges: RangeFacets {
            min_score: numeric_range(conn, "min_score", SCORE_RANGE_FALLBACK)?,
            quota: numeric_range(conn, "quota", QUOTA_RANGE_FALLBACK)?,
        },
    })
}

fn distinct_values(
    conn: &Connection,
    table: &str,
    column: &str,
) -> Result<Vec<String>, QueryError> {
    let sql =
        format!("SELECT DISTINCT {column} FROM {table} WHERE {column} <> '' ORDER BY {column} ASC");
    let mut stmt = conn.prepare(&sql).map_err(|e| QueryError(e.to_string()))?;
    let mapped = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| QueryError(e.to_string()))?;
    mapped
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| QueryError(e.to_string()))
}

fn numeric_range(
    conn: &Connection,
    column: &str,
    fallback: NumericRange,
) -> Result<NumericRange, QueryError> {
    let sql = format!("SELECT MIN({column}), MAX({column}) FROM tus_puanlar WHERE {column} IS NOT NULL");
    let bounds: (Option<f64>, Option<f64>) = conn
        .query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(|e| QueryError(e.to_string()))?;
    match bounds {
        (Some(min), Some(max)) => Ok(NumericRange { min, max }),
        _ => Ok(fallback),
    }
}
