#![forbid(unsafe_code)]

pub const CRATE_NAME: &str = "tus-rehber-api";

mod errors;
pub mod params;

pub use errors::{ApiError, ApiErrorCode};
