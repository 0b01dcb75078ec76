use crate::IngestError;
use rusqlite::{params, Connection};
use std::path::Path;
use tus_rehber_model::{Institution, PlacementRecord};

pub const SQLITE_SCHEMA_VERSION: i64 = 1;
const INSERT_BATCH_SIZE: usize = 100;

/// Open (or create) the dataset database with the serving schema in place.
pub fn open_database(path: &Path) -> Result<Connection, IngestError> {
    let conn = Connection::open(path).map_err(|e| IngestError(e.to_string()))?;
    conn.execute_batch(
        "
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;
        PRAGMA temp_store=MEMORY;
        CREATE TABLE IF NOT EXISTS hastaneler (
          id INTEGER PRIMARY KEY,
          institution_code INTEGER NOT NULL UNIQUE,
          name TEXT NOT NULL,
          ownership_type TEXT NOT NULL,
          institution_kind TEXT NOT NULL,
          city TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS tus_puanlar (
          id INTEGER PRIMARY KEY,
          institution_code INTEGER NOT NULL,
          level_short_name TEXT NOT NULL,
          level TEXT NOT NULL,
          branch TEXT NOT NULL,
          period TEXT NOT NULL,
          period_date TEXT NOT NULL,
          quota INTEGER NOT NULL,
          filled INTEGER,
          unfilled_quota INTEGER,
          min_score REAL,
          max_score REAL,
          min_score_rank INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_hastaneler_city ON hastaneler(city);
        CREATE INDEX IF NOT EXISTS idx_hastaneler_ownership_type ON hastaneler(ownership_type);
        CREATE INDEX IF NOT EXISTS idx_hastaneler_institution_kind ON hastaneler(institution_kind);
        CREATE INDEX IF NOT EXISTS idx_tus_puanlar_institution_code ON tus_puanlar(institution_code);
        CREATE INDEX IF NOT EXISTS idx_tus_puanlar_branch ON tus_puanlar(branch);
        CREATE INDEX IF NOT EXISTS idx_tus_puanlar_period ON tus_puanlar(period);
        CREATE INDEX IF NOT EXISTS idx_tus_puanlar_min_score ON tus_puanlar(min_score);
        CREATE INDEX IF NOT EXISTS idx_tus_puanlar_quota ON tus_puanlar(quota);
        ",
    )
    .map_err(|e| IngestError(e.to_string()))?;
    conn.execute_batch(&format!("PRAGMA user_version={SQLITE_SCHEMA_VERSION};"))
        .map_err(|e| IngestError(e.to_string()))?;
    Ok(conn)
}

/// Whole-dataset replace: delete everything, then insert the new rows in
/// batches, all inside one transaction. There is no incremental upsert.
pub fn replace_dataset(
    conn: &mut Connection,
    institutions: &[Institution],
    placements: &[PlacementRecord],
) -> Result<(), IngestError> {
    let tx = conn.transaction().map_err(|e| IngestError(e.to_string()))?;
    tx.execute("DELETE FROM tus_puanlar", [])
        .map_err(|e| IngestError(e.to_string()))?;
    tx.execute("DELETE FROM hastaneler", [])
        .map_err(|e| IngestError(e.to_string()))?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO hastaneler (institution_code, name, ownership_type, institution_kind, city)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(|e| IngestError(e.to_string()))?;
        for batch in institutions.chunks(INSERT_BATCH_SIZE) {
            for h in batch {
                stmt.execute(params![
                    h.institution_code,
                    h.name,
                    h.ownership_type,
                    h.institution_kind,
                    h.city
                ])
                .map_err(|e| IngestError(e.to_string()))?;
            }
        }

        let mut stmt = tx
            .prepare(
                "INSERT INTO tus_puanlar (institution_code, level_short_name, level, branch,
                                          period, period_date, quota, filled, unfilled_quota,
                                          min_score, max_score, min_score_rank)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )
            .map_err(|e| IngestError(e.to_string()))?;
        for batch in placements.chunks(INSERT_BATCH_SIZE) {
            for p in batch {
                stmt.execute(params![
                    p.institution_code,
                    p.level_short_name,
                    p.level,
                    p.branch,
                    p.period,
                    p.period_date,
                    p.quota,
                    p.filled,
                    p.unfilled_quota,
                    p.min_score,
                    p.max_score,
                    p.min_score_rank
                ])
                .map_err(|e| IngestError(e.to_string()))?;
            }
        }
    }
    tx.commit().map_err(|e| IngestError(e.to_string()))
}
