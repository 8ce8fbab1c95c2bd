use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    axum_http::error_responses::ApiError,
    config::config_model::WalletConfig,
    domain::{
        gateways::payment_processor::{PlanCatalog, SubscriptionProcessor},
        value_objects::{
            billing::{
                BillingInterval, IntervalUnit, PlanDescriptor, PlanId, PricingTerms,
                ProductDescriptor, SubscriberInfo,
            },
            subscriptions::SubscriptionId,
        },
    },
    usecases::{
        plan_setup::PlanSetupUseCase,
        subscriptions::{SubscriptionDefaults, SubscriptionUseCase},
    },
};

// Run example
//   curl "http://localhost:$SERVER_PORT/wallet/create-plan"
//   curl -X POST "http://localhost:$SERVER_PORT/wallet/subscribe" \
//     -H "Content-Type: application/json" \
//     -d '{"planId":"P-5ML4271244454362WXNWU5NQ"}'

pub struct WalletRouteState<P>
where
    P: SubscriptionProcessor + PlanCatalog + Send + Sync + 'static,
{
    subscriptions: SubscriptionUseCase<P>,
    plan_setup: PlanSetupUseCase<P, P>,
}

pub fn routes<P>(processor: Arc<P>, config: &WalletConfig) -> Router
where
    P: SubscriptionProcessor + PlanCatalog + Send + Sync + 'static,
{
    let defaults = SubscriptionDefaults {
        pricing: None,
        subscriber: Some(SubscriberInfo {
            given_name: config.subscriber.given_name.clone(),
            surname: config.subscriber.surname.clone(),
            email: config.subscriber.email.clone(),
        }),
    };
    let product = ProductDescriptor {
        name: config.product.name.clone(),
        description: config.product.description.clone(),
        kind: config.product.kind.clone(),
        category: config.product.category.clone(),
    };
    let plan = PlanDescriptor {
        name: config.plan.name.clone(),
        description: config.plan.description.clone(),
    };
    let pricing = PricingTerms {
        price: config.plan.price.clone(),
        currency: config.plan.currency.clone(),
        interval: BillingInterval {
            unit: IntervalUnit::from_str(&config.plan.interval_unit),
            count: config.plan.interval_count,
        },
        total_cycles: config.plan.total_cycles,
    };

    let state = Arc::new(WalletRouteState {
        subscriptions: SubscriptionUseCase::new(Arc::clone(&processor), defaults),
        plan_setup: PlanSetupUseCase::new(
            Arc::clone(&processor),
            processor,
            product,
            plan,
            pricing,
        ),
    });

    Router::new()
        .route("/create-plan", get(create_plan::<P>))
        .route("/subscribe", post(subscribe::<P>))
        .route(
            "/check-subscription/:subscription_id",
            get(check_subscription::<P>),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanResponse {
    pub plan_id: PlanId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSubscribeRequest {
    pub plan_id: PlanId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSubscribeResponse {
    pub approval_url: String,
    pub subscription_id: SubscriptionId,
}

pub async fn create_plan<P>(State(state): State<Arc<WalletRouteState<P>>>) -> Response
where
    P: SubscriptionProcessor + PlanCatalog + Send + Sync + 'static,
{
    match state.plan_setup.create_plan().await {
        Ok(plan_id) => Json(CreatePlanResponse { plan_id }).into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}

pub async fn subscribe<P>(
    State(state): State<Arc<WalletRouteState<P>>>,
    Json(payload): Json<WalletSubscribeRequest>,
) -> Response
where
    P: SubscriptionProcessor + PlanCatalog + Send + Sync + 'static,
{
    match state.subscriptions.subscribe_to_plan(payload.plan_id).await {
        Ok(signup) => Json(WalletSubscribeResponse {
            approval_url: signup.approval_url,
            subscription_id: signup.subscription_id,
        })
        .into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}

pub async fn check_subscription<P>(
    State(state): State<Arc<WalletRouteState<P>>>,
    Path(subscription_id): Path<SubscriptionId>,
) -> Response
where
    P: SubscriptionProcessor + PlanCatalog + Send + Sync + 'static,
{
    match state.subscriptions.check_subscription(&subscription_id).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}
