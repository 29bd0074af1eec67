//! Translation of store failures into domain errors.
//!
//! Clients only ever see the coarse category; raw driver text is logged and
//! replaced for the infrastructure variants.

use serde_json::json;
use tracing::{error, warn};

use super::Error;
use super::ports::StoreError;

impl From<StoreError> for Error {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { entity } => Self::not_found(format!("{entity} not found")),
            StoreError::Conflict { constraint } => {
                Self::conflict("resource already exists").with_details(json!({
                    "constraint": constraint,
                }))
            }
            StoreError::VersionMismatch { expected, actual } => {
                Self::conflict("resource was modified concurrently").with_details(json!({
                    "expectedVersion": expected,
                    "currentVersion": actual,
                }))
            }
            StoreError::InvalidData { message } | StoreError::InvalidReference { message } => {
                Self::invalid_request(message)
            }
            StoreError::Timeout { operation } => {
                warn!(%operation, "store operation timed out");
                Self::gateway_timeout("the data store did not respond in time")
            }
            StoreError::Canceled { operation } => {
                warn!(%operation, "store operation canceled");
                Self::client_closed_request("the request was canceled")
            }
            StoreError::Connection { message } => {
                error!(%message, "store connection failed");
                Self::service_unavailable("the data store is unavailable")
            }
            StoreError::Query { message } => {
                error!(%message, "store query failed");
                Self::internal("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(StoreError::not_found("post 1"), ErrorCode::NotFound)]
    #[case(StoreError::conflict("users_email_key"), ErrorCode::Conflict)]
    #[case(StoreError::version_mismatch(1_u32, 2_u32), ErrorCode::Conflict)]
    #[case(StoreError::invalid_data("title too long"), ErrorCode::InvalidRequest)]
    #[case(StoreError::invalid_reference("unknown post"), ErrorCode::InvalidRequest)]
    #[case(StoreError::timeout("post update"), ErrorCode::GatewayTimeout)]
    #[case(StoreError::canceled("post update"), ErrorCode::ClientClosedRequest)]
    #[case(StoreError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(StoreError::query("syntax error"), ErrorCode::InternalError)]
    fn maps_each_variant(#[case] store_error: StoreError, #[case] expected: ErrorCode) {
        assert_eq!(Error::from(store_error).code(), expected);
    }

    #[rstest]
    fn infrastructure_text_is_not_exposed() {
        let err = Error::from(StoreError::connection("password authentication failed"));
        assert!(!err.message().contains("password"));
    }

    #[rstest]
    fn version_mismatch_reports_both_versions() {
        let err = Error::from(StoreError::version_mismatch(3_u32, 5_u32));
        assert_eq!(
            err.details(),
            Some(&json!({ "expectedVersion": 3, "currentVersion": 5 }))
        );
    }
}
