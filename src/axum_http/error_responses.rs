use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::domain::gateways::payment_processor::ProcessorError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: serde_json::Value,
}

/// Uniform HTTP error conversion: every processor failure becomes a 500
/// whose body carries the raw upstream payload when one was captured, the
/// error message otherwise.
#[derive(Debug)]
pub struct ApiError(pub ProcessorError);

impl From<ProcessorError> for ApiError {
    fn from(err: ProcessorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: error_body(&self.0),
            }),
        )
            .into_response()
    }
}

fn error_body(err: &ProcessorError) -> serde_json::Value {
    match err.upstream_payload() {
        Some(payload) => payload.clone(),
        None => serde_json::Value::String(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_body_prefers_the_captured_upstream_payload() {
        let err = ProcessorError::Validation {
            context: "create subscription",
            message: "Nonce is invalid".to_string(),
            payload: Some(json!({ "message": "Nonce is invalid", "code": "91565" })),
        };

        assert_eq!(
            error_body(&err),
            json!({ "message": "Nonce is invalid", "code": "91565" })
        );
    }

    #[test]
    fn error_body_falls_back_to_the_error_message() {
        let err = ProcessorError::Auth("token exchange failed with status 401".to_string());

        assert_eq!(
            error_body(&err),
            json!("token exchange failed with status 401")
        );
    }
}
