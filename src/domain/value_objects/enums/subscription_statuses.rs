use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    #[default]
    Pending,
    PastDue,
    Canceled,
    Expired,
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Expired => "expired",
        };
        write!(f, "{}", status)
    }
}

impl SubscriptionStatus {
    /// Maps the card gateway's status vocabulary. Unrecognized values fall
    /// back to `Pending`.
    pub fn from_card_gateway(value: &str) -> Self {
        match value {
            "Active" => SubscriptionStatus::Active,
            "Pending" => SubscriptionStatus::Pending,
            "Past Due" => SubscriptionStatus::PastDue,
            "Canceled" => SubscriptionStatus::Canceled,
            "Expired" => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Pending,
        }
    }

    /// Maps the wallet processor's status vocabulary.
    pub fn from_wallet(value: &str) -> Self {
        match value {
            "ACTIVE" => SubscriptionStatus::Active,
            "APPROVAL_PENDING" | "APPROVED" => SubscriptionStatus::Pending,
            "SUSPENDED" => SubscriptionStatus::PastDue,
            "CANCELLED" => SubscriptionStatus::Canceled,
            "EXPIRED" => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_card_gateway_statuses() {
        assert_eq!(
            SubscriptionStatus::from_card_gateway("Active"),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::from_card_gateway("Past Due"),
            SubscriptionStatus::PastDue
        );
        assert_eq!(
            SubscriptionStatus::from_card_gateway("Canceled"),
            SubscriptionStatus::Canceled
        );
        assert_eq!(
            SubscriptionStatus::from_card_gateway("something-new"),
            SubscriptionStatus::Pending
        );
    }

    #[test]
    fn maps_wallet_statuses() {
        assert_eq!(
            SubscriptionStatus::from_wallet("ACTIVE"),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::from_wallet("APPROVAL_PENDING"),
            SubscriptionStatus::Pending
        );
        assert_eq!(
            SubscriptionStatus::from_wallet("SUSPENDED"),
            SubscriptionStatus::PastDue
        );
        assert_eq!(
            SubscriptionStatus::from_wallet("CANCELLED"),
            SubscriptionStatus::Canceled
        );
        assert_eq!(
            SubscriptionStatus::from_wallet("EXPIRED"),
            SubscriptionStatus::Expired
        );
    }

    #[test]
    fn serializes_snake_case_matching_display() {
        let json = serde_json::to_string(&SubscriptionStatus::PastDue).unwrap();
        assert_eq!(json, "\"past_due\"");
        assert_eq!(SubscriptionStatus::PastDue.to_string(), "past_due");
    }
}
