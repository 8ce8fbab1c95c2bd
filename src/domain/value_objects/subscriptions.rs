use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    billing::{PlanTerms, SubscriberInfo},
    enums::subscription_statuses::SubscriptionStatus,
};

/// Single-use client-side token representing raw payment instrument details.
/// Exchanged exactly once for a durable [`PaymentMethodReference`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentNonce(pub String);

impl PaymentNonce {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PaymentNonce {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Durable token identifying a stored instrument on a processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethodReference(pub String);

impl PaymentMethodReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PaymentMethodReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PaymentMethodReference {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub String);

impl SubscriptionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SubscriptionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Everything a processor needs to create a subscription. The card gateway
/// requires `payment_method` and the inline billing knobs; the wallet
/// processor requires a catalog plan and uses `subscriber`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSubscriptionModel {
    pub payment_method: Option<PaymentMethodReference>,
    pub plan: PlanTerms,
    pub subscriber: Option<SubscriberInfo>,
    pub merchant_account_id: Option<String>,
    pub billing_day_of_month: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedSubscription {
    pub id: SubscriptionId,
    pub approval_url: Option<String>,
    pub status: SubscriptionStatus,
}

/// Processor-agnostic projection of a subscription's upstream state. Only
/// `id` and `status` are guaranteed; fields a processor does not report stay
/// unset and are omitted from the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSnapshot {
    pub id: SubscriptionId,
    pub status: SubscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_ref: Option<PaymentMethodReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycles_completed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycles_total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_billing_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_count: Option<u32>,
}

impl SubscriptionSnapshot {
    /// Snapshot carrying only the guaranteed fields.
    pub fn bare(id: SubscriptionId, status: SubscriptionStatus) -> Self {
        Self {
            id,
            status,
            payment_method_ref: None,
            amount: None,
            currency: None,
            cycles_completed: None,
            cycles_total: None,
            created_at: None,
            updated_at: None,
            next_billing_time: None,
            failure_count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_serializes_camel_case_and_omits_unset_fields() {
        let snapshot = SubscriptionSnapshot {
            amount: Some("10.00".to_string()),
            currency: Some("USD".to_string()),
            cycles_completed: Some(2),
            ..SubscriptionSnapshot::bare(
                SubscriptionId::from("sub-42"),
                SubscriptionStatus::Active,
            )
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["id"], "sub-42");
        assert_eq!(value["status"], "active");
        assert_eq!(value["amount"], "10.00");
        assert_eq!(value["cyclesCompleted"], 2);
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("paymentMethodRef"));
        assert!(!object.contains_key("nextBillingTime"));
        assert!(!object.contains_key("failureCount"));
    }
}
