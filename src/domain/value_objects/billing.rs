use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub String);

impl Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlanId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
    Year,
}

impl Display for IntervalUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unit = match self {
            IntervalUnit::Day => "DAY",
            IntervalUnit::Week => "WEEK",
            IntervalUnit::Month => "MONTH",
            IntervalUnit::Year => "YEAR",
        };
        write!(f, "{}", unit)
    }
}

impl IntervalUnit {
    pub fn from_str(value: &str) -> Self {
        match value {
            "DAY" => IntervalUnit::Day,
            "WEEK" => IntervalUnit::Week,
            "YEAR" => IntervalUnit::Year,
            _ => IntervalUnit::Month,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingInterval {
    pub unit: IntervalUnit,
    pub count: u32,
}

impl BillingInterval {
    pub fn monthly() -> Self {
        Self {
            unit: IntervalUnit::Month,
            count: 1,
        }
    }
}

/// Recurring price point. `total_cycles` of 0 means the subscription never
/// expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTerms {
    pub price: String,
    pub currency: String,
    pub interval: BillingInterval,
    pub total_cycles: u32,
}

/// Price terms attached to a subscription: the card gateway embeds the price
/// inline per subscription, the wallet processor references a catalog plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanTerms {
    Inline(PricingTerms),
    Catalog(PlanId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDescriptor {
    pub name: String,
    pub description: String,
    pub kind: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanDescriptor {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberInfo {
    pub given_name: String,
    pub surname: String,
    pub email: String,
}
