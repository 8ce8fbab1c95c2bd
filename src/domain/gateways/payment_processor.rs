use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::domain::value_objects::{
    billing::{PlanDescriptor, PlanId, PricingTerms, ProductDescriptor, ProductId},
    credentials::ProcessorCredential,
    subscriptions::{
        CreateSubscriptionModel, CreatedSubscription, PaymentMethodReference, PaymentNonce,
        SubscriptionId, SubscriptionSnapshot,
    },
};

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("{0}")]
    Auth(String),
    #[error("{context}: {message}")]
    Validation {
        context: &'static str,
        message: String,
        payload: Option<serde_json::Value>,
    },
    #[error("subscription {0} was not found")]
    NotFound(SubscriptionId),
    #[error("{context}: {message}")]
    Upstream {
        context: &'static str,
        message: String,
        payload: Option<serde_json::Value>,
    },
    #[error("{0} is not supported by this processor")]
    Unsupported(&'static str),
}

impl ProcessorError {
    /// Raw error payload captured from the processor, when one was returned.
    pub fn upstream_payload(&self) -> Option<&serde_json::Value> {
        match self {
            ProcessorError::Validation { payload, .. }
            | ProcessorError::Upstream { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }
}

pub type ProcessorResult<T> = std::result::Result<T, ProcessorError>;

/// Unified subscription capability implemented once per processor. The
/// transport shell and use cases depend only on this contract.
#[async_trait]
#[automock]
pub trait SubscriptionProcessor {
    async fn acquire_credential(&self) -> ProcessorResult<ProcessorCredential>;

    /// Exchanges a one-time-use nonce for a durable payment method reference
    /// by creating a customer carrying the instrument.
    async fn create_payment_method(
        &self,
        credential: &ProcessorCredential,
        nonce: &PaymentNonce,
    ) -> ProcessorResult<PaymentMethodReference>;

    async fn create_subscription(
        &self,
        credential: &ProcessorCredential,
        model: &CreateSubscriptionModel,
    ) -> ProcessorResult<CreatedSubscription>;

    async fn get_subscription(
        &self,
        credential: &ProcessorCredential,
        subscription_id: &SubscriptionId,
    ) -> ProcessorResult<SubscriptionSnapshot>;

    /// Exchanges `nonce` for a fresh reference, then swaps it onto the
    /// subscription. Two sequential calls with no rollback: a failure on the
    /// second step leaves the freshly created instrument orphaned upstream.
    async fn update_payment_method(
        &self,
        credential: &ProcessorCredential,
        subscription_id: &SubscriptionId,
        nonce: &PaymentNonce,
    ) -> ProcessorResult<SubscriptionSnapshot>;
}

/// Catalog setup offered by processors that require a product and billing
/// plan to exist before a subscription can reference them.
#[async_trait]
#[automock]
pub trait PlanCatalog {
    async fn create_product(
        &self,
        credential: &ProcessorCredential,
        descriptor: &ProductDescriptor,
    ) -> ProcessorResult<ProductId>;

    async fn create_plan(
        &self,
        credential: &ProcessorCredential,
        product_id: &ProductId,
        descriptor: &PlanDescriptor,
        pricing: &PricingTerms,
    ) -> ProcessorResult<PlanId>;
}

/// Browser-side tokenization key generation, offered by the card gateway.
#[async_trait]
#[automock]
pub trait ClientTokenProvider {
    async fn generate_client_token(&self) -> ProcessorResult<String>;
}
