use std::sync::Arc;

use tracing::{error, info};

use crate::domain::{
    gateways::payment_processor::{PlanCatalog, ProcessorResult, SubscriptionProcessor},
    value_objects::billing::{PlanDescriptor, PlanId, PricingTerms, ProductDescriptor},
};

/// Provisions the catalog objects a plan-based subscription needs: a product
/// first, then a billing plan attached to it. The resulting plan id is what
/// buyers subscribe against.
pub struct PlanSetupUseCase<P, C>
where
    P: SubscriptionProcessor + Send + Sync + 'static,
    C: PlanCatalog + Send + Sync + 'static,
{
    credential_source: Arc<P>,
    catalog: Arc<C>,
    product: ProductDescriptor,
    plan: PlanDescriptor,
    pricing: PricingTerms,
}

impl<P, C> PlanSetupUseCase<P, C>
where
    P: SubscriptionProcessor + Send + Sync + 'static,
    C: PlanCatalog + Send + Sync + 'static,
{
    pub fn new(
        credential_source: Arc<P>,
        catalog: Arc<C>,
        product: ProductDescriptor,
        plan: PlanDescriptor,
        pricing: PricingTerms,
    ) -> Self {
        Self {
            credential_source,
            catalog,
            product,
            plan,
            pricing,
        }
    }

    pub async fn create_plan(&self) -> ProcessorResult<PlanId> {
        info!(
            product_name = %self.product.name,
            "plan_setup: provisioning catalog product and billing plan"
        );

        let credential = self
            .credential_source
            .acquire_credential()
            .await
            .map_err(|err| {
                error!(
                    error = ?err,
                    "plan_setup: failed to acquire processor credential"
                );
                err
            })?;

        let product_id = self
            .catalog
            .create_product(&credential, &self.product)
            .await
            .map_err(|err| {
                error!(error = ?err, "plan_setup: failed to create catalog product");
                err
            })?;
        info!(product_id = %product_id, "plan_setup: catalog product created");

        let plan_id = self
            .catalog
            .create_plan(&credential, &product_id, &self.plan, &self.pricing)
            .await
            .map_err(|err| {
                error!(
                    product_id = %product_id,
                    error = ?err,
                    "plan_setup: failed to create billing plan"
                );
                err
            })?;

        info!(
            plan_id = %plan_id,
            product_id = %product_id,
            "plan_setup: billing plan created"
        );
        Ok(plan_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        gateways::payment_processor::{
            MockPlanCatalog, MockSubscriptionProcessor, ProcessorError,
        },
        value_objects::{
            billing::{BillingInterval, ProductId},
            credentials::{AccessToken, ProcessorCredential},
        },
    };

    fn sample_product() -> ProductDescriptor {
        ProductDescriptor {
            name: "Monthly Subscription".to_string(),
            description: "Monthly recurring payment for premium access".to_string(),
            kind: "SERVICE".to_string(),
            category: "SOFTWARE".to_string(),
        }
    }

    fn sample_plan() -> PlanDescriptor {
        PlanDescriptor {
            name: "Monthly Premium Plan".to_string(),
            description: "Monthly subscription for $10".to_string(),
        }
    }

    fn sample_pricing() -> PricingTerms {
        PricingTerms {
            price: "10.00".to_string(),
            currency: "USD".to_string(),
            interval: BillingInterval::monthly(),
            total_cycles: 0,
        }
    }

    fn bearer() -> ProcessorCredential {
        ProcessorCredential::Bearer(AccessToken::from_grant("token".to_string(), 3600))
    }

    #[tokio::test]
    async fn create_plan_provisions_product_then_plan() {
        let mut credential_source = MockSubscriptionProcessor::new();
        credential_source
            .expect_acquire_credential()
            .times(1)
            .returning(|| Box::pin(async { Ok(bearer()) }));

        let mut catalog = MockPlanCatalog::new();
        catalog
            .expect_create_product()
            .withf(|_, descriptor| descriptor.name == "Monthly Subscription")
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(ProductId::from("PROD-4XH24418")) }));
        catalog
            .expect_create_plan()
            .withf(|_, product_id, plan, pricing| {
                product_id == &ProductId::from("PROD-4XH24418")
                    && plan.name == "Monthly Premium Plan"
                    && pricing.price == "10.00"
            })
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(PlanId::from("P-5ML4271244454362")) }));

        let usecase = PlanSetupUseCase::new(
            Arc::new(credential_source),
            Arc::new(catalog),
            sample_product(),
            sample_plan(),
            sample_pricing(),
        );
        let plan_id = usecase.create_plan().await.unwrap();

        assert_eq!(plan_id, PlanId::from("P-5ML4271244454362"));
    }

    #[tokio::test]
    async fn create_plan_aborts_when_product_creation_fails() {
        let mut credential_source = MockSubscriptionProcessor::new();
        credential_source
            .expect_acquire_credential()
            .returning(|| Box::pin(async { Ok(bearer()) }));

        let mut catalog = MockPlanCatalog::new();
        catalog.expect_create_product().returning(|_, _| {
            Box::pin(async {
                Err(ProcessorError::Upstream {
                    context: "create product",
                    message: "processor rejected the request".to_string(),
                    payload: None,
                })
            })
        });
        catalog.expect_create_plan().never();

        let usecase = PlanSetupUseCase::new(
            Arc::new(credential_source),
            Arc::new(catalog),
            sample_product(),
            sample_plan(),
            sample_pricing(),
        );
        let err = usecase.create_plan().await.unwrap_err();

        assert!(matches!(err, ProcessorError::Upstream { .. }));
    }
}
