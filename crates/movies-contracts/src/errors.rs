//! # Error Bodies
//!
//! Every non-2xx response carries an [`ErrorBody`]:
//!
//! ```json
//! {"error":{"code":"VALIDATION_ERROR","message":"...","details":{"errors":[
//!   {"propertyName":"Title","message":"'Title' must not be empty."}
//! ]}}}
//! ```
//!
//! `details` is present only for validation failures.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorDetail {
    /// Machine-readable code (`NOT_FOUND`, `VALIDATION_ERROR`, ...).
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Field failures carried in `details`, empty for non-validation errors.
    pub fn validation_failures(&self) -> Vec<ValidationFailureResponse> {
        self.error
            .details
            .clone()
            .and_then(|d| serde_json::from_value::<ValidationProblem>(d).ok())
            .map(|p| p.errors)
            .unwrap_or_default()
    }
}

/// Payload of `details` for `VALIDATION_ERROR`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValidationProblem {
    pub errors: Vec<ValidationFailureResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailureResponse {
    pub property_name: String,
    pub message: String,
}
