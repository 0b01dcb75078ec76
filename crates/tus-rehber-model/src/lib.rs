#![forbid(unsafe_code)]

pub const CRATE_NAME: &str = "tus-rehber-model";

mod institution;
mod period;
mod placement;

pub use institution::Institution;
pub use period::PeriodKey;
pub use placement::PlacementRecord;
