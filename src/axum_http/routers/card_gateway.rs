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
    config::config_model::CardGatewayConfig,
    domain::{
        gateways::payment_processor::{ClientTokenProvider, SubscriptionProcessor},
        value_objects::{
            billing::{BillingInterval, PricingTerms},
            subscriptions::{PaymentMethodReference, PaymentNonce, SubscriptionId},
        },
    },
    usecases::subscriptions::{CardBillingDefaults, SubscriptionDefaults, SubscriptionUseCase},
};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT/braintree-like/subscribe" \
//     -H "Content-Type: application/json" \
//     -d '{"paymentMethodNonce":"fake-valid-nonce"}'

pub struct CardGatewayRouteState<P>
where
    P: SubscriptionProcessor + ClientTokenProvider + Send + Sync + 'static,
{
    subscriptions: SubscriptionUseCase<P>,
    client: Arc<P>,
}

pub fn routes<P>(processor: Arc<P>, config: &CardGatewayConfig) -> Router
where
    P: SubscriptionProcessor + ClientTokenProvider + Send + Sync + 'static,
{
    let defaults = SubscriptionDefaults {
        pricing: Some(CardBillingDefaults {
            merchant_account_id: config.merchant_account_id.clone(),
            pricing: PricingTerms {
                price: config.plan_price.clone(),
                currency: config.plan_currency.clone(),
                interval: BillingInterval::monthly(),
                total_cycles: config.total_cycles,
            },
            billing_day_of_month: config.billing_day_of_month,
        }),
        subscriber: None,
    };
    let state = Arc::new(CardGatewayRouteState {
        subscriptions: SubscriptionUseCase::new(Arc::clone(&processor), defaults),
        client: processor,
    });

    Router::new()
        .route("/subscribe", post(subscribe::<P>))
        .route(
            "/check-subscription/:subscription_id",
            get(check_subscription::<P>),
        )
        .route("/update-card/:subscription_id", post(update_card::<P>))
        .route("/test-connection", get(test_connection::<P>))
        .route("/test-subscription", post(test_subscription::<P>))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub payment_method_nonce: PaymentNonce,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub subscription_id: SubscriptionId,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
    pub payment_method_nonce: PaymentNonce,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardResponse {
    pub message: String,
    pub subscription_id: SubscriptionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_ref: Option<PaymentMethodReference>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionResponse {
    pub message: String,
    pub client_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSubscriptionRequest {
    pub payment_method_token: PaymentMethodReference,
}

pub async fn subscribe<P>(
    State(state): State<Arc<CardGatewayRouteState<P>>>,
    Json(payload): Json<SubscribeRequest>,
) -> Response
where
    P: SubscriptionProcessor + ClientTokenProvider + Send + Sync + 'static,
{
    match state
        .subscriptions
        .subscribe_with_nonce(payload.payment_method_nonce)
        .await
    {
        Ok(created) => Json(SubscribeResponse {
            subscription_id: created.id,
            message: "Subscription created successfully.".to_string(),
        })
        .into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}

pub async fn check_subscription<P>(
    State(state): State<Arc<CardGatewayRouteState<P>>>,
    Path(subscription_id): Path<SubscriptionId>,
) -> Response
where
    P: SubscriptionProcessor + ClientTokenProvider + Send + Sync + 'static,
{
    match state.subscriptions.check_subscription(&subscription_id).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}

pub async fn update_card<P>(
    State(state): State<Arc<CardGatewayRouteState<P>>>,
    Path(subscription_id): Path<SubscriptionId>,
    Json(payload): Json<UpdateCardRequest>,
) -> Response
where
    P: SubscriptionProcessor + ClientTokenProvider + Send + Sync + 'static,
{
    match state
        .subscriptions
        .rotate_payment_method(&subscription_id, payload.payment_method_nonce)
        .await
    {
        Ok(snapshot) => Json(UpdateCardResponse {
            message: "Payment method updated successfully.".to_string(),
            subscription_id: snapshot.id,
            payment_method_ref: snapshot.payment_method_ref,
        })
        .into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}

pub async fn test_connection<P>(
    State(state): State<Arc<CardGatewayRouteState<P>>>,
) -> Response
where
    P: SubscriptionProcessor + ClientTokenProvider + Send + Sync + 'static,
{
    match state.client.generate_client_token().await {
        Ok(client_token) => Json(TestConnectionResponse {
            message: "Card gateway connection successful".to_string(),
            client_token,
        })
        .into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}

pub async fn test_subscription<P>(
    State(state): State<Arc<CardGatewayRouteState<P>>>,
    Json(payload): Json<TestSubscriptionRequest>,
) -> Response
where
    P: SubscriptionProcessor + ClientTokenProvider + Send + Sync + 'static,
{
    match state
        .subscriptions
        .subscribe_with_payment_method(payload.payment_method_token)
        .await
    {
        Ok(created) => Json(SubscribeResponse {
            subscription_id: created.id,
            message: "Subscription created successfully.".to_string(),
        })
        .into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}
