// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiErrorCode {
    InvalidQueryParameter,
    RateLimited,
    Internal,
}

/// Wire error body. Validation failures carry the first violated field in
/// `details`; internal failures never leak query structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn invalid_param(name: &str, reason: &str) -> Self {
        Self {
            code: ApiErrorCode::InvalidQueryParameter,
            message: format!("invalid query parameter: {name}"),
            details: json!({"parameter": name, "reason": reason}),
        }
    }

    #[must_use]
    pub fn rate_limited(scope: &str) -> Self {
        Self {
            code: ApiErrorCode::RateLimited,
            message: "rate limit exceeded".to_string(),
            details: json!({"scope": scope}),
        }
    }

    #[must_use]
    pub fn internal() -> Self {
        Self {
            code: ApiErrorCode::Internal,
            message: "internal error".to_string(),
            details: json!({}),
        }
    }
}
