//! Response classification shared by the processor clients.

use reqwest::StatusCode;

use crate::domain::{
    gateways::payment_processor::ProcessorError, value_objects::subscriptions::SubscriptionId,
};

/// Reads a failed response body for logging and classification.
pub async fn read_error_body(resp: reqwest::Response) -> String {
    match resp.text().await {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => "<empty response body>".to_string(),
        Err(err) => format!("<failed to read response body: {err}>"),
    }
}

/// Maps an upstream HTTP failure onto the shared error taxonomy. `lookup`
/// names the subscription a read or update targeted, so a 404 surfaces as
/// not-found instead of a generic client error.
pub fn classify_error(
    status: StatusCode,
    context: &'static str,
    payload: Option<serde_json::Value>,
    lookup: Option<&SubscriptionId>,
) -> ProcessorError {
    let message = payload
        .as_ref()
        .and_then(|value| value.get("message"))
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
        .unwrap_or_else(|| format!("request failed with status {status}"));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ProcessorError::Auth(message);
    }
    if status == StatusCode::NOT_FOUND {
        if let Some(subscription_id) = lookup {
            return ProcessorError::NotFound(subscription_id.clone());
        }
    }
    if status.is_client_error() {
        return ProcessorError::Validation {
            context,
            message,
            payload,
        };
    }
    ProcessorError::Upstream {
        context,
        message,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unauthorized_status_classifies_as_auth_error() {
        let err = classify_error(StatusCode::UNAUTHORIZED, "create customer", None, None);
        assert!(matches!(err, ProcessorError::Auth(_)));
    }

    #[test]
    fn not_found_with_lookup_names_the_subscription() {
        let subscription_id = SubscriptionId::from("sub-gone");
        let err = classify_error(
            StatusCode::NOT_FOUND,
            "find subscription",
            None,
            Some(&subscription_id),
        );

        assert!(matches!(err, ProcessorError::NotFound(id) if id == subscription_id));
    }

    #[test]
    fn not_found_without_lookup_stays_a_validation_error() {
        let err = classify_error(StatusCode::NOT_FOUND, "create subscription", None, None);
        assert!(matches!(err, ProcessorError::Validation { .. }));
    }

    #[test]
    fn client_error_classifies_as_validation_with_payload() {
        let err = classify_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "create subscription",
            Some(json!({ "message": "Nonce is invalid" })),
            None,
        );

        match err {
            ProcessorError::Validation {
                message, payload, ..
            } => {
                assert_eq!(message, "Nonce is invalid");
                assert_eq!(payload, Some(json!({ "message": "Nonce is invalid" })));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn server_error_classifies_as_upstream() {
        let err = classify_error(StatusCode::BAD_GATEWAY, "create subscription", None, None);
        assert!(matches!(err, ProcessorError::Upstream { .. }));
    }
}
