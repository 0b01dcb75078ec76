#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

pub const CRATE_NAME: &str = "tus-rehber-ingest";

mod csv;
mod decode;
mod sqlite;

pub use csv::{parse_delimited_records, parse_opt_f64, parse_opt_i64};
pub use decode::{decode_institutions, decode_placements};
pub use sqlite::{open_database, replace_dataset, SQLITE_SCHEMA_VERSION};

#[derive(Debug)]
pub struct IngestError(pub String);

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for IngestError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub institutions: u64,
    pub placements: u64,
    pub skipped_institution_rows: u64,
    pub skipped_placement_rows: u64,
}

/// Full bulk import: parse both semicolon-delimited sources, then replace the
/// entire dataset in one transaction (delete-all, then batched inserts).
pub fn run_import(
    institutions_csv: &Path,
    placements_csv: &Path,
    db_path: &Path,
) -> Result<ImportReport, IngestError> {
    let institution_raw =
        fs::read_to_string(institutions_csv).map_err(|e| IngestError(e.to_string()))?;
    let placement_raw =
        fs::read_to_string(placements_csv).map_err(|e| IngestError(e.to_string()))?;

    let institution_records = parse_delimited_records(&institution_raw, ';');
    let placement_records = parse_delimited_records(&placement_raw, ';');

    let (institutions, skipped_institution_rows) = decode_institutions(&institution_records);
    let (placements, skipped_placement_rows) = decode_placements(&placement_records);

    let mut conn = open_database(db_path)?;
    replace_dataset(&mut conn, &institutions, &placements)?;

    Ok(ImportReport {
        institutions: institutions.len() as u64,
        placements: placements.len() as u64,
        skipped_institution_rows,
        skipped_placement_rows,
    })
}
