use serde::{Deserialize, Serialize};

/// One medical institution. Immutable reference data; the whole table is
/// replaced on every bulk import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub institution_code: i64,
    pub name: String,
    pub ownership_type: String,
    pub institution_kind: String,
    pub city: String,
}
