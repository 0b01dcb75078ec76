#![forbid(unsafe_code)]

use rusqlite::{params_from_iter, types::Value, Connection};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const CRATE_NAME: &str = "tus-rehber-query";

mod facets;
mod periods;

pub use facets::{
    compute_facets, FacetSet, NumericRange, RangeFacets, QUOTA_RANGE_FALLBACK,
    SCORE_RANGE_FALLBACK,
};
pub use periods::active_period_window;

/// Filter specification for a multi-period search. Empty vectors mean "no
/// filter on that dimension"; absent numeric bounds mean "no range filter".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterSpec {
    pub text: Option<String>,
    pub city: Vec<String>,
    pub ownership_type: Vec<String>,
    pub institution_kind: Vec<String>,
    pub branch: Vec<String>,
    pub min_score_floor: Option<f64>,
    pub min_score_ceiling: Option<f64>,
    pub quota_floor: Option<i64>,
    pub quota_ceiling: Option<i64>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            text: None,
            city: Vec::new(),
            ownership_type: Vec::new(),
            institution_kind: Vec::new(),
            branch: Vec::new(),
            min_score_floor: None,
            min_score_ceiling: None,
            quota_floor: None,
            quota_ceiling: None,
            page: 1,
            page_size: 20,
        }
    }
}

impl FilterSpec {
    /// Any numeric bound pins evaluation to the single most recent period.
    #[must_use]
    pub fn has_numeric_bounds(&self) -> bool {
        self.min_score_floor.is_some()
            || self.min_score_ceiling.is_some()
            || self.quota_floor.is_some()
            || self.quota_ceiling.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_page_size: u32,
    pub max_text_len: usize,
    pub period_window: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_page_size: 100,
            max_text_len: 128,
            period_window: 4,
        }
    }
}

/// Per-period figures for one group. All-null means "no record for this
/// period in the active window".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PeriodCell {
    pub quota: Option<i64>,
    pub filled: Option<i64>,
    pub min_score: Option<f64>,
    pub min_score_rank: Option<i64>,
}

impl PeriodCell {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quota.is_none()
            && self.filled.is_none()
            && self.min_score.is_none()
            && self.min_score_rank.is_none()
    }
}

/// One distinct (institution, branch, level) group with its per-period data.
/// The `periods` key set always equals the active window returned alongside.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupRow {
    pub institution_code: i64,
    pub institution_name: String,
    pub city: String,
    pub ownership_type: String,
    pub institution_kind: String,
    pub branch: String,
    pub level: String,
    pub periods: BTreeMap<String, PeriodCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PagedMultiPeriodResult {
    pub rows: Vec<GroupRow>,
    /// Active period window, most recent first.
    pub periods: Vec<String>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

#[derive(Debug)]
pub struct QueryError(pub String);

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for QueryError {}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GroupKey {
    institution_code: i64,
    institution_name: String,
    city: String,
    ownership_type: String,
    institution_kind: String,
    branch: String,
    level: String,
}

/// Multi-period search: resolve the active window, enumerate the distinct
/// matching groups, paginate over groups, then batch-fetch and reshape the
/// page's per-period data.
pub fn search(
    conn: &Connection,
    spec: &FilterSpec,
    limits: &SearchLimits,
) -> Result<PagedMultiPeriodResult, QueryError> {
    validate_spec(spec, limits)?;

    let window = periods::active_period_window(conn, limits.period_window)?;

    let (where_sql, params) = build_predicate(spec, window.first().map(String::as_str));
    let groups = fetch_groups(conn, &where_sql, &params)?;

    let total = groups.len() as u64;
    let total_pages = total.div_ceil(u64::from(spec.page_size)) as u32;

    let offset = (spec.page as usize - 1) * spec.page_size as usize;
    let page_groups: Vec<GroupKey> = groups
        .into_iter()
        .skip(offset)
        .take(spec.page_size as usize)
        .collect();

    let cells = fetch_period_cells(conn, &page_groups, &window)?;

    let rows = page_groups
        .into_iter()
        .map(|group| {
            let key = (
                group.institution_code,
                group.branch.clone(),
                group.level.clone(),
            );
            let by_period = cells.get(&key);
            let mut period_map = BTreeMap::new();
            for period in &window {
                let cell = by_period
                    .and_then(|m| m.get(period))
                    .copied()
                    .unwrap_or_default();
                period_map.insert(period.clone(), cell);
            }
            GroupRow {
                institution_code: group.institution_code,
                institution_name: group.institution_name,
                city: group.city,
                ownership_type: group.ownership_type,
                institution_kind: group.institution_kind,
                branch: group.branch,
                level: group.level,
                periods: period_map,
            }
        })
        .collect();

    Ok(PagedMultiPeriodResult {
        rows,
        periods: window,
        total,
        page: spec.page,
        page_size: spec.page_size,
        total_pages,
    })
}

fn validate_spec(spec: &FilterSpec, limits: &SearchLimits) -> Result<(), QueryError> {
    if spec.page == 0 {
        return Err(QueryError("page must be at least 1".to_string()));
    }
    if spec.page_size == 0 || spec.page_size > limits.max_page_size {
        return Err(QueryError(format!(
            "page_size must be between 1 and {}",
            limits.max_page_size
        )));
    }
    if let Some(text) = &spec.text {
        if text.len() > limits.max_text_len {
            return Err(QueryError(format!(
                "text length exceeds {}",
                limits.max_text_len
            )));
        }
    }
    Ok(())
}

/// Row-grain predicate over `tus_puanlar p INNER JOIN hastaneler h`.
///
/// Numeric bounds pin evaluation to the latest period; without them no
/// period restriction is applied at the filter stage.
fn build_predicate(spec: &FilterSpec, latest_period: Option<&str>) -> (String, Vec<Value>) {
    let mut where_parts: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(text) = spec.text.as_deref().filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", escape_like(text));
        where_parts.push("(h.name LIKE ? ESCAPE '!' OR p.branch LIKE ? ESCAPE '!')".to_string());
        params.push(Value::Text(pattern.clone()));
        params.push(Value::Text(pattern));
    }

    push_membership(&mut where_parts, &mut params, "h.city", &spec.city);
    push_membership(
        &mut where_parts,
        &mut params,
        "h.ownership_type",
        &spec.ownership_type,
    );
    push_membership(
        &mut where_parts,
        &mut params,
        "h.institution_kind",
        &spec.institution_kind,
    );
    push_membership(&mut where_parts, &mut params, "p.branch", &spec.branch);

    if spec.has_numeric_bounds() {
        if let Some(latest) = latest_period {
            where_parts.push("p.period = ?".to_string());
            params.push(Value::Text(latest.to_string()));
        }
        if let Some(floor) = spec.min_score_floor {
            where_parts.push("p.min_score >= ?".to_string());
            params.push(Value::Real(floor));
        }
        if let Some(ceiling) = spec.min_score_ceiling {
            where_parts.push("p.min_score <= ?".to_string());
            params.push(Value::Real(ceiling));
        }
        if let Some(floor) = spec.quota_floor {
            where_parts.push("p.quota >= ?".to_string());
            params.push(Value::Integer(floor));
        }
        if let Some(ceiling) = spec.quota_ceiling {
            where_parts.push("p.quota <= ?".to_string());
            params.push(Value::Integer(ceiling));
        }
    }

    let where_sql = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    (where_sql, params)
}

fn push_membership(
    where_parts: &mut Vec<String>,
    params: &mut Vec<Value>,
    column: &str,
    values: &[String],
) {
    if values.is_empty() {
        return;
    }
    let placeholders = vec!["?"; values.len()].join(", ");
    where_parts.push(format!("{column} IN ({placeholders})"));
    for value in values {
        params.push(Value::Text(value.clone()));
    }
}

fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '!' | '%' | '_' => {
                out.push('!');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Distinct (institution_code, branch, level) triples satisfying the
/// predicate, ordered by institution name, branch, level, code.
fn fetch_groups(
    conn: &Connection,
    where_sql: &str,
    params: &[Value],
) -> Result<Vec<GroupKey>, QueryError> {
    let sql = format!(
        "SELECT p.institution_code, h.name, h.city, h.ownership_type, h.institution_kind, \
                p.branch, p.level \
         FROM tus_puanlar p \
         INNER JOIN hastaneler h ON h.institution_code = p.institution_code{where_sql} \
         GROUP BY p.institution_code, p.branch, p.level \
         ORDER BY h.name ASC, p.branch ASC, p.level ASC, p.institution_code ASC"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| QueryError(e.to_string()))?;
    let mapped = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            Ok(GroupKey {
                institution_code: row.get(0)?,
                institution_name: row.get(1)?,
                city: row.get(2)?,
                ownership_type: row.get(3)?,
                institution_kind: row.get(4)?,
                branch: row.get(5)?,
                level: row.get(6)?,
            })
        })
        .map_err(|e| QueryError(e.to_string()))?;
    mapped
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| QueryError(e.to_string()))
}

type CellMap = HashMap<(i64, String, String), HashMap<String, PeriodCell>>;

/// One batch query for every (group, period-in-window) record of the page:
/// OR of per-group equality constraints, AND a period IN filter. Never one
/// query per group.
fn fetch_period_cells(
    conn: &Connection,
    groups: &[GroupKey],
    window: &[String],
) -> Result<CellMap, QueryError> {
    if groups.is_empty() || window.is_empty() {
        return Ok(HashMap::new());
    }

    let mut params: Vec<Value> = Vec::new();
    let group_parts: Vec<&str> = groups
        .iter()
        .map(|g| {
            params.push(Value::Integer(g.institution_code));
            params.push(Value::Text(g.branch.clone()));
            params.push(Value::Text(g.level.clone()));
            "(p.institution_code = ? AND p.branch = ? AND p.level = ?)"
        })
        .collect();
    let period_placeholders = vec!["?"; window.len()].join(", ");
    for period in window {
        params.push(Value::Text(period.clone()));
    }

    let sql = format!(
        "SELECT p.institution_code, p.branch, p.level, p.period, \
                p.quota, p.filled, p.min_score, p.min_score_rank \
         FROM tus_puanlar p \
         WHERE ({}) AND p.period IN ({period_placeholders}) \
         ORDER BY p.id ASC",
        group_parts.join(" OR ")
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| QueryError(e.to_string()))?;
    let mapped = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            let key: (i64, String, String) = (row.get(0)?, row.get(1)?, row.get(2)?);
            let period: String = row.get(3)?;
            let cell = PeriodCell {
                quota: row.get::<_, Option<i64>>(4)?,
                filled: row.get::<_, Option<i64>>(5)?,
                min_score: row.get::<_, Option<f64>>(6)?,
                min_score_rank: row.get::<_, Option<i64>>(7)?,
            };
            Ok((key, period, cell))
        })
        .map_err(|e| QueryError(e.to_string()))?;

    let mut out: CellMap = HashMap::new();
    for item in mapped {
        let (key, period, cell) = item.map_err(|e| QueryError(e.to_string()))?;
        out.entry(key).or_default().insert(period, cell);
    }
    Ok(out)
}
