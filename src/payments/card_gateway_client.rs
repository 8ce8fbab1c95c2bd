use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::upstream::{classify_error, read_error_body};
use crate::config::config_model::CardGatewayConfig;
use crate::domain::{
    gateways::payment_processor::{
        ClientTokenProvider, ProcessorError, ProcessorResult, SubscriptionProcessor,
    },
    value_objects::{
        billing::PlanTerms,
        credentials::ProcessorCredential,
        enums::subscription_statuses::SubscriptionStatus,
        subscriptions::{
            CreateSubscriptionModel, CreatedSubscription, PaymentMethodReference, PaymentNonce,
            SubscriptionId, SubscriptionSnapshot,
        },
    },
};

/// Card gateway client built on reqwest. Every call authenticates with the
/// merchant's key pair over HTTP basic auth; there is no token lifecycle.
pub struct CardGatewayClient {
    http: reqwest::Client,
    base_url: String,
    merchant_id: String,
    public_key: String,
    private_key: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionResource {
    id: String,
    status: String,
    payment_method_token: Option<String>,
    price: Option<String>,
    currency_iso_code: Option<String>,
    current_billing_cycle: Option<u32>,
    number_of_billing_cycles: Option<u32>,
    failure_count: Option<u32>,
    next_billing_date: Option<NaiveDate>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionEnvelope {
    subscription: SubscriptionResource,
}

impl CardGatewayClient {
    pub fn new(config: &CardGatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            merchant_id: config.merchant_id.clone(),
            public_key: config.public_key.clone(),
            private_key: config.private_key.clone(),
        })
    }

    fn merchant_url(&self, resource: &str) -> String {
        format!(
            "{}/merchants/{}/{}",
            self.base_url, self.merchant_id, resource
        )
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &'static str,
        lookup: Option<&SubscriptionId>,
    ) -> ProcessorResult<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = read_error_body(resp).await;
        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "card gateway api request failed"
        );

        let payload = serde_json::from_str::<serde_json::Value>(&body).ok();
        Err(classify_error(status, context, payload, lookup))
    }
}

fn transport_error(context: &'static str) -> impl FnOnce(reqwest::Error) -> ProcessorError {
    move |err| {
        error!(
            error = ?err,
            context = %context,
            "card gateway transport error"
        );
        ProcessorError::Upstream {
            context,
            message: err.to_string(),
            payload: None,
        }
    }
}

fn subscription_request_body(
    model: &CreateSubscriptionModel,
) -> ProcessorResult<serde_json::Value> {
    let payment_method = model.payment_method.as_ref().ok_or_else(|| {
        ProcessorError::Validation {
            context: "create subscription",
            message: "a payment method reference is required".to_string(),
            payload: None,
        }
    })?;
    let pricing = match &model.plan {
        PlanTerms::Inline(pricing) => pricing,
        PlanTerms::Catalog(_) => {
            return Err(ProcessorError::Unsupported("catalog plan subscriptions"));
        }
    };

    let mut subscription = serde_json::Map::new();
    subscription.insert(
        "payment_method_token".to_string(),
        json!(payment_method.as_str()),
    );
    if let Some(merchant_account_id) = &model.merchant_account_id {
        subscription.insert("merchant_account_id".to_string(), json!(merchant_account_id));
    }
    subscription.insert("price".to_string(), json!(pricing.price));
    subscription.insert("currency_iso_code".to_string(), json!(pricing.currency));
    if let Some(billing_day) = model.billing_day_of_month {
        subscription.insert("billing_day_of_month".to_string(), json!(billing_day));
    }
    // total_cycles of 0 means unbounded; the gateway expects the field absent.
    if pricing.total_cycles > 0 {
        subscription.insert(
            "number_of_billing_cycles".to_string(),
            json!(pricing.total_cycles),
        );
    }
    subscription.insert("options".to_string(), json!({ "start_immediately": true }));

    Ok(json!({ "subscription": subscription }))
}

fn snapshot_from_resource(resource: SubscriptionResource) -> SubscriptionSnapshot {
    SubscriptionSnapshot {
        id: SubscriptionId(resource.id),
        status: SubscriptionStatus::from_card_gateway(&resource.status),
        payment_method_ref: resource.payment_method_token.map(PaymentMethodReference),
        amount: resource.price,
        currency: resource.currency_iso_code,
        cycles_completed: resource.current_billing_cycle,
        cycles_total: resource.number_of_billing_cycles,
        created_at: resource.created_at,
        updated_at: resource.updated_at,
        next_billing_time: resource
            .next_billing_date
            .map(|date| date.and_time(NaiveTime::MIN).and_utc()),
        failure_count: resource.failure_count,
    }
}

#[async_trait]
impl SubscriptionProcessor for CardGatewayClient {
    async fn acquire_credential(&self) -> ProcessorResult<ProcessorCredential> {
        Ok(ProcessorCredential::MerchantKeys)
    }

    async fn create_payment_method(
        &self,
        _credential: &ProcessorCredential,
        nonce: &PaymentNonce,
    ) -> ProcessorResult<PaymentMethodReference> {
        let body = json!({ "customer": { "payment_method_nonce": nonce.as_str() } });
        let resp = self
            .http
            .post(self.merchant_url("customers"))
            .basic_auth(&self.public_key, Some(&self.private_key))
            .json(&body)
            .send()
            .await
            .map_err(transport_error("create customer"))?;
        let resp = Self::ensure_success(resp, "create customer", None).await?;

        #[derive(Deserialize)]
        struct PaymentMethodResp {
            token: String,
        }
        #[derive(Deserialize)]
        struct CustomerResp {
            payment_methods: Vec<PaymentMethodResp>,
        }
        #[derive(Deserialize)]
        struct CustomerEnvelope {
            customer: CustomerResp,
        }

        let parsed: CustomerEnvelope = resp
            .json()
            .await
            .map_err(transport_error("create customer"))?;
        parsed
            .customer
            .payment_methods
            .into_iter()
            .next()
            .map(|method| PaymentMethodReference(method.token))
            .ok_or_else(|| ProcessorError::Upstream {
                context: "create customer",
                message: "customer was created without a payment method".to_string(),
                payload: None,
            })
    }

    async fn create_subscription(
        &self,
        _credential: &ProcessorCredential,
        model: &CreateSubscriptionModel,
    ) -> ProcessorResult<CreatedSubscription> {
        let body = subscription_request_body(model)?;
        let resp = self
            .http
            .post(self.merchant_url("subscriptions"))
            .basic_auth(&self.public_key, Some(&self.private_key))
            .json(&body)
            .send()
            .await
            .map_err(transport_error("create subscription"))?;
        let resp = Self::ensure_success(resp, "create subscription", None).await?;

        let parsed: SubscriptionEnvelope = resp
            .json()
            .await
            .map_err(transport_error("create subscription"))?;
        let subscription = parsed.subscription;
        Ok(CreatedSubscription {
            id: SubscriptionId(subscription.id),
            approval_url: None,
            status: SubscriptionStatus::from_card_gateway(&subscription.status),
        })
    }

    async fn get_subscription(
        &self,
        _credential: &ProcessorCredential,
        subscription_id: &SubscriptionId,
    ) -> ProcessorResult<SubscriptionSnapshot> {
        let resp = self
            .http
            .get(self.merchant_url(&format!("subscriptions/{}", subscription_id)))
            .basic_auth(&self.public_key, Some(&self.private_key))
            .send()
            .await
            .map_err(transport_error("find subscription"))?;
        let resp = Self::ensure_success(resp, "find subscription", Some(subscription_id)).await?;

        let parsed: SubscriptionEnvelope = resp
            .json()
            .await
            .map_err(transport_error("find subscription"))?;
        Ok(snapshot_from_resource(parsed.subscription))
    }

    async fn update_payment_method(
        &self,
        _credential: &ProcessorCredential,
        subscription_id: &SubscriptionId,
        nonce: &PaymentNonce,
    ) -> ProcessorResult<SubscriptionSnapshot> {
        let body = json!({ "payment_method": { "payment_method_nonce": nonce.as_str() } });
        let resp = self
            .http
            .post(self.merchant_url("payment_methods"))
            .basic_auth(&self.public_key, Some(&self.private_key))
            .json(&body)
            .send()
            .await
            .map_err(transport_error("create payment method"))?;
        let resp = Self::ensure_success(resp, "create payment method", None).await?;

        #[derive(Deserialize)]
        struct PaymentMethodResp {
            token: String,
        }
        #[derive(Deserialize)]
        struct PaymentMethodEnvelope {
            payment_method: PaymentMethodResp,
        }

        let parsed: PaymentMethodEnvelope = resp
            .json()
            .await
            .map_err(transport_error("create payment method"))?;
        let token = parsed.payment_method.token;

        let body = json!({ "subscription": { "payment_method_token": token } });
        let resp = self
            .http
            .put(self.merchant_url(&format!("subscriptions/{}", subscription_id)))
            .basic_auth(&self.public_key, Some(&self.private_key))
            .json(&body)
            .send()
            .await
            .map_err(transport_error("update subscription"))?;
        let resp = Self::ensure_success(resp, "update subscription", Some(subscription_id)).await?;

        let parsed: SubscriptionEnvelope = resp
            .json()
            .await
            .map_err(transport_error("update subscription"))?;
        Ok(snapshot_from_resource(parsed.subscription))
    }
}

#[async_trait]
impl ClientTokenProvider for CardGatewayClient {
    async fn generate_client_token(&self) -> ProcessorResult<String> {
        let resp = self
            .http
            .post(self.merchant_url("client_token"))
            .basic_auth(&self.public_key, Some(&self.private_key))
            .json(&json!({}))
            .send()
            .await
            .map_err(transport_error("generate client token"))?;
        let resp = Self::ensure_success(resp, "generate client token", None).await?;

        #[derive(Deserialize)]
        struct ClientTokenResp {
            client_token: String,
        }

        let parsed: ClientTokenResp = resp
            .json()
            .await
            .map_err(transport_error("generate client token"))?;
        Ok(parsed.client_token)
    }
}
