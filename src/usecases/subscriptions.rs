use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::{
    gateways::payment_processor::{ProcessorError, ProcessorResult, SubscriptionProcessor},
    value_objects::{
        billing::{PlanId, PlanTerms, PricingTerms, SubscriberInfo},
        credentials::ProcessorCredential,
        subscriptions::{
            CreateSubscriptionModel, CreatedSubscription, PaymentMethodReference, PaymentNonce,
            SubscriptionId, SubscriptionSnapshot,
        },
    },
};

/// Inline billing terms the card gateway applies to every subscription it
/// creates, resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct CardBillingDefaults {
    pub merchant_account_id: Option<String>,
    pub pricing: PricingTerms,
    pub billing_day_of_month: u8,
}

/// Per-processor defaults injected into the use case. `pricing` is set for
/// the card gateway, `subscriber` for the wallet processor.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionDefaults {
    pub pricing: Option<CardBillingDefaults>,
    pub subscriber: Option<SubscriberInfo>,
}

/// Outcome of a catalog-plan signup: the created subscription and the
/// approval link the buyer must visit.
#[derive(Debug, Clone)]
pub struct PlanSignup {
    pub subscription_id: SubscriptionId,
    pub approval_url: String,
}

pub struct SubscriptionUseCase<P>
where
    P: SubscriptionProcessor + Send + Sync + 'static,
{
    processor: Arc<P>,
    defaults: SubscriptionDefaults,
}

impl<P> SubscriptionUseCase<P>
where
    P: SubscriptionProcessor + Send + Sync + 'static,
{
    pub fn new(processor: Arc<P>, defaults: SubscriptionDefaults) -> Self {
        Self {
            processor,
            defaults,
        }
    }

    /// Full card-gateway bootstrap: the nonce is exchanged for a payment
    /// method reference by creating a customer, then a subscription is
    /// created with that reference and the configured billing terms.
    pub async fn subscribe_with_nonce(
        &self,
        nonce: PaymentNonce,
    ) -> ProcessorResult<CreatedSubscription> {
        info!("subscriptions: subscribe with nonce requested");

        let model_template = self.card_subscription_model(None)?;

        let credential = self.acquire().await?;
        let payment_method = self
            .processor
            .create_payment_method(&credential, &nonce)
            .await
            .map_err(|err| {
                error!(
                    error = ?err,
                    "subscriptions: failed to create payment method from nonce"
                );
                err
            })?;
        info!(
            payment_method_ref = %payment_method,
            "subscriptions: payment method created"
        );

        let model = CreateSubscriptionModel {
            payment_method: Some(payment_method),
            ..model_template
        };
        self.create_card_subscription(&credential, &model).await
    }

    /// Creates a subscription against an already stored instrument, skipping
    /// the nonce exchange.
    pub async fn subscribe_with_payment_method(
        &self,
        payment_method: PaymentMethodReference,
    ) -> ProcessorResult<CreatedSubscription> {
        info!(
            payment_method_ref = %payment_method,
            "subscriptions: subscribe with stored payment method requested"
        );

        let model = self.card_subscription_model(Some(payment_method))?;
        let credential = self.acquire().await?;
        self.create_card_subscription(&credential, &model).await
    }

    /// Creates a subscription referencing a catalog plan. The buyer must
    /// visit the returned approval link before the subscription activates;
    /// a creation response without one fails as an upstream error.
    pub async fn subscribe_to_plan(&self, plan_id: PlanId) -> ProcessorResult<PlanSignup> {
        info!(plan_id = %plan_id, "subscriptions: subscribe to catalog plan requested");

        let credential = self.acquire().await?;
        let model = CreateSubscriptionModel {
            payment_method: None,
            plan: PlanTerms::Catalog(plan_id.clone()),
            subscriber: self.defaults.subscriber.clone(),
            merchant_account_id: None,
            billing_day_of_month: None,
        };

        let created = self
            .processor
            .create_subscription(&credential, &model)
            .await
            .map_err(|err| {
                error!(
                    plan_id = %plan_id,
                    error = ?err,
                    "subscriptions: failed to create plan subscription"
                );
                err
            })?;

        let CreatedSubscription { id, approval_url, .. } = created;
        let approval_url = approval_url.ok_or_else(|| {
            let err = ProcessorError::Upstream {
                context: "create subscription",
                message: "created subscription carries no approval link".to_string(),
                payload: None,
            };
            error!(
                subscription_id = %id,
                "subscriptions: created subscription carries no approval link"
            );
            err
        })?;

        info!(
            subscription_id = %id,
            plan_id = %plan_id,
            "subscriptions: subscription created, awaiting buyer approval"
        );
        Ok(PlanSignup {
            subscription_id: id,
            approval_url,
        })
    }

    pub async fn check_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> ProcessorResult<SubscriptionSnapshot> {
        info!(
            subscription_id = %subscription_id,
            "subscriptions: subscription status requested"
        );

        let credential = self.acquire().await?;
        let snapshot = self
            .processor
            .get_subscription(&credential, subscription_id)
            .await
            .map_err(|err| {
                error!(
                    subscription_id = %subscription_id,
                    error = ?err,
                    "subscriptions: failed to fetch subscription"
                );
                err
            })?;

        info!(
            subscription_id = %subscription_id,
            status = %snapshot.status,
            "subscriptions: subscription status fetched"
        );
        Ok(snapshot)
    }

    /// Swaps the subscription's stored instrument for one derived from a
    /// fresh nonce. The processor performs this as two non-atomic calls; a
    /// failure after the first leaves an unused instrument behind upstream.
    pub async fn rotate_payment_method(
        &self,
        subscription_id: &SubscriptionId,
        nonce: PaymentNonce,
    ) -> ProcessorResult<SubscriptionSnapshot> {
        info!(
            subscription_id = %subscription_id,
            "subscriptions: payment method rotation requested"
        );

        let credential = self.acquire().await?;
        let snapshot = self
            .processor
            .update_payment_method(&credential, subscription_id, &nonce)
            .await
            .map_err(|err| {
                error!(
                    subscription_id = %subscription_id,
                    error = ?err,
                    "subscriptions: failed to rotate payment method"
                );
                err
            })?;

        info!(
            subscription_id = %subscription_id,
            payment_method_ref = ?snapshot.payment_method_ref,
            "subscriptions: payment method rotated"
        );
        Ok(snapshot)
    }

    async fn acquire(&self) -> ProcessorResult<ProcessorCredential> {
        self.processor.acquire_credential().await.map_err(|err| {
            error!(
                error = ?err,
                "subscriptions: failed to acquire processor credential"
            );
            err
        })
    }

    fn card_subscription_model(
        &self,
        payment_method: Option<PaymentMethodReference>,
    ) -> ProcessorResult<CreateSubscriptionModel> {
        let billing = self.defaults.pricing.as_ref().ok_or_else(|| {
            let err = ProcessorError::Validation {
                context: "create subscription",
                message: "card billing defaults are not configured".to_string(),
                payload: None,
            };
            warn!("subscriptions: card billing defaults are missing");
            err
        })?;

        Ok(CreateSubscriptionModel {
            payment_method,
            plan: PlanTerms::Inline(billing.pricing.clone()),
            subscriber: None,
            merchant_account_id: billing.merchant_account_id.clone(),
            billing_day_of_month: Some(billing.billing_day_of_month),
        })
    }

    async fn create_card_subscription(
        &self,
        credential: &ProcessorCredential,
        model: &CreateSubscriptionModel,
    ) -> ProcessorResult<CreatedSubscription> {
        let created = self
            .processor
            .create_subscription(credential, model)
            .await
            .map_err(|err| {
                error!(
                    error = ?err,
                    "subscriptions: failed to create subscription"
                );
                err
            })?;

        info!(
            subscription_id = %created.id,
            status = %created.status,
            "subscriptions: subscription created"
        );
        Ok(created)
    }
}
