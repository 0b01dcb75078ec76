use crate::QueryError;
use rusqlite::Connection;
use tus_rehber_model::PeriodKey;

/// The up-to-`window` most recent distinct period tokens, newest first.
///
/// Ordering is chronological (year, then half), not lexical; the window is
/// shorter than `window` when fewer distinct periods exist.
pub fn active_period_window(
    conn: &Connection,
    window: usize,
) -> Result<Vec<String>, QueryError> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT period FROM tus_puanlar")
        .map_err(|e| QueryError(e.to_string()))?;
    let tokens = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| QueryError(e.to_string()))?
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| QueryError(e.to_string()))?;

    let mut keys: Vec<PeriodKey> = tokens.iter().map(|t| PeriodKey::new(t)).collect();
    keys.sort_by(|a, b| b.cmp(a));
    keys.truncate(window);
    Ok(keys.into_iter().map(PeriodKey::into_token).collect())
}
