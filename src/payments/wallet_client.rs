use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use super::upstream::{classify_error, read_error_body};
use crate::config::config_model::WalletConfig;
use crate::domain::{
    gateways::payment_processor::{
        PlanCatalog, ProcessorError, ProcessorResult, SubscriptionProcessor,
    },
    value_objects::{
        billing::{PlanDescriptor, PlanId, PlanTerms, PricingTerms, ProductDescriptor, ProductId},
        credentials::{AccessToken, ProcessorCredential},
        enums::subscription_statuses::SubscriptionStatus,
        subscriptions::{
            CreateSubscriptionModel, CreatedSubscription, PaymentMethodReference, PaymentNonce,
            SubscriptionId, SubscriptionSnapshot,
        },
    },
};

/// Wallet processor client built on reqwest. Authenticates with a cached
/// client-credentials bearer token and stamps every create call with a
/// fresh request id for upstream idempotency keying.
pub struct WalletClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token_cache: Mutex<Option<AccessToken>>,
}

#[derive(Debug, Deserialize)]
struct HateoasLink {
    rel: String,
    href: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionDetail {
    id: String,
    status: Option<String>,
    create_time: Option<DateTime<Utc>>,
    update_time: Option<DateTime<Utc>>,
    billing_info: Option<BillingInfo>,
}

#[derive(Debug, Deserialize, Default)]
struct BillingInfo {
    next_billing_time: Option<DateTime<Utc>>,
    failed_payments_count: Option<u32>,
    #[serde(default)]
    cycle_executions: Vec<CycleExecution>,
    last_payment: Option<LastPayment>,
}

#[derive(Debug, Deserialize)]
struct CycleExecution {
    tenure_type: Option<String>,
    cycles_completed: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LastPayment {
    amount: Option<Money>,
}

#[derive(Debug, Deserialize)]
struct Money {
    value: Option<String>,
    currency_code: Option<String>,
}

impl WalletClient {
    pub fn new(config: &WalletConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_cache: Mutex::new(None),
        })
    }

    /// Exchanges the client id/secret for a bearer token. Every failure mode
    /// of the exchange surfaces as an auth error.
    async fn exchange_client_credentials(&self) -> ProcessorResult<AccessToken> {
        // https://developer.paypal.com/api/rest/authentication/
        let resp = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|err| {
                error!(error = ?err, "wallet token exchange transport error");
                ProcessorError::Auth(err.to_string())
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = read_error_body(resp).await;
            error!(
                status = %status,
                response_body = %body,
                "wallet token exchange was rejected"
            );
            return Err(ProcessorError::Auth(format!(
                "token exchange failed with status {status}"
            )));
        }

        #[derive(Deserialize)]
        struct TokenResp {
            access_token: String,
            expires_in: i64,
        }

        let parsed: TokenResp = resp.json().await.map_err(|err| {
            error!(error = ?err, "wallet token response could not be decoded");
            ProcessorError::Auth(err.to_string())
        })?;

        Ok(AccessToken::from_grant(
            parsed.access_token,
            parsed.expires_in,
        ))
    }

    /// Serves the cached token while it is usable, exchanging a new one
    /// otherwise. The cache lock is held across the exchange so concurrent
    /// callers do not race duplicate grants.
    async fn current_token(&self) -> ProcessorResult<AccessToken> {
        let mut cache = self.token_cache.lock().await;
        if let Some(token) = cache.as_ref() {
            if !token.is_expired() {
                return Ok(token.clone());
            }
        }

        let token = self.exchange_client_credentials().await?;
        *cache = Some(token.clone());
        Ok(token)
    }

    async fn refresh_token(&self) -> ProcessorResult<AccessToken> {
        let mut cache = self.token_cache.lock().await;
        let token = self.exchange_client_credentials().await?;
        *cache = Some(token.clone());
        Ok(token)
    }

    /// Sends a bearer-authenticated request. A 401 on the first attempt gets
    /// exactly one forced token re-acquire; the rebuilt request carries the
    /// same request id, so the upstream idempotency key is preserved.
    async fn send_authorized(
        &self,
        credential: &ProcessorCredential,
        context: &'static str,
        build: impl Fn(&str) -> reqwest::RequestBuilder,
    ) -> ProcessorResult<reqwest::Response> {
        let token = match credential {
            ProcessorCredential::Bearer(token) => token.clone(),
            ProcessorCredential::MerchantKeys => {
                return Err(ProcessorError::Auth(
                    "wallet calls require a bearer credential".to_string(),
                ));
            }
        };

        let resp = build(token.secret())
            .send()
            .await
            .map_err(transport_error(context))?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        info!(
            context = %context,
            "wallet bearer token was rejected, re-acquiring once"
        );
        let fresh = self.refresh_token().await?;
        build(fresh.secret())
            .send()
            .await
            .map_err(transport_error(context))
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
            "wallet api request failed"
        );

        let payload = serde_json::from_str::<serde_json::Value>(&body).ok();
        Err(classify_error(status, context, payload, lookup))
    }
}

fn transport_error(context: &'static str) -> impl FnOnce(reqwest::Error) -> ProcessorError {
    move |err| {
        error!(error = ?err, context = %context, "wallet transport error");
        ProcessorError::Upstream {
            context,
            message: err.to_string(),
            payload: None,
        }
    }
}

fn fresh_request_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

fn approval_link(links: &[HateoasLink]) -> Option<String> {
    links
        .iter()
        .find(|link| link.rel == "approve")
        .map(|link| link.href.clone())
}

fn plan_request_body(
    product_id: &ProductId,
    descriptor: &PlanDescriptor,
    pricing: &PricingTerms,
) -> serde_json::Value {
    json!({
        "product_id": product_id,
        "name": descriptor.name,
        "description": descriptor.description,
        "status": "ACTIVE",
        "billing_cycles": [{
            "frequency": {
                "interval_unit": pricing.interval.unit,
                "interval_count": pricing.interval.count,
            },
            "tenure_type": "REGULAR",
            "sequence": 1,
            "total_cycles": pricing.total_cycles,
            "pricing_scheme": {
                "fixed_price": {
                    "value": pricing.price,
                    "currency_code": pricing.currency,
                }
            }
        }],
        "payment_preferences": {
            "auto_bill_outstanding": true,
            "setup_fee_failure_action": "CONTINUE",
            "payment_failure_threshold": 3,
        }
    })
}

fn subscription_request_body(
    model: &CreateSubscriptionModel,
) -> ProcessorResult<serde_json::Value> {
    let plan_id = match &model.plan {
        PlanTerms::Catalog(plan_id) => plan_id,
        PlanTerms::Inline(_) => {
            return Err(ProcessorError::Unsupported("inline-priced subscriptions"));
        }
    };

    // The processor rejects start times in the past, so schedule slightly
    // ahead of now.
    let start_time = Utc::now() + Duration::minutes(10);

    let mut body = serde_json::Map::new();
    body.insert("plan_id".to_string(), json!(plan_id));
    body.insert(
        "start_time".to_string(),
        json!(start_time.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    if let Some(subscriber) = &model.subscriber {
        body.insert(
            "subscriber".to_string(),
            json!({
                "name": {
                    "given_name": subscriber.given_name,
                    "surname": subscriber.surname,
                },
                "email_address": subscriber.email,
            }),
        );
    }

    Ok(serde_json::Value::Object(body))
}

fn snapshot_from_detail(detail: SubscriptionDetail) -> SubscriptionSnapshot {
    let billing = detail.billing_info.unwrap_or_default();
    let cycles_completed = billing
        .cycle_executions
        .iter()
        .find(|cycle| cycle.tenure_type.as_deref() == Some("REGULAR"))
        .or_else(|| billing.cycle_executions.first())
        .and_then(|cycle| cycle.cycles_completed);
    let (amount, currency) = billing
        .last_payment
        .and_then(|payment| payment.amount)
        .map(|money| (money.value, money.currency_code))
        .unwrap_or((None, None));
    let status = detail
        .status
        .as_deref()
        .map(SubscriptionStatus::from_wallet)
        .unwrap_or_default();

    SubscriptionSnapshot {
        amount,
        currency,
        cycles_completed,
        created_at: detail.create_time,
        updated_at: detail.update_time,
        next_billing_time: billing.next_billing_time,
        failure_count: billing.failed_payments_count,
        ..SubscriptionSnapshot::bare(SubscriptionId(detail.id), status)
    }
}

#[async_trait]
impl SubscriptionProcessor for WalletClient {
    async fn acquire_credential(&self) -> ProcessorResult<ProcessorCredential> {
        let token = self.current_token().await?;
        Ok(ProcessorCredential::Bearer(token))
    }

    async fn create_payment_method(
        &self,
        _credential: &ProcessorCredential,
        _nonce: &PaymentNonce,
    ) -> ProcessorResult<PaymentMethodReference> {
        Err(ProcessorError::Unsupported("payment method exchange"))
    }

    async fn create_subscription(
        &self,
        credential: &ProcessorCredential,
        model: &CreateSubscriptionModel,
    ) -> ProcessorResult<CreatedSubscription> {
        // https://developer.paypal.com/docs/api/subscriptions/v1/#subscriptions_create
        let request_id = fresh_request_id("SUB");
        let body = subscription_request_body(model)?;
        let url = format!("{}/v1/billing/subscriptions", self.base_url);

        let resp = self
            .send_authorized(credential, "create subscription", |secret| {
                self.http
                    .post(&url)
                    .bearer_auth(secret)
                    .header("PayPal-Request-Id", request_id.as_str())
                    .json(&body)
            })
            .await?;
        let resp = Self::ensure_success(resp, "create subscription", None).await?;

        #[derive(Deserialize)]
        struct SubscriptionResp {
            id: String,
            status: Option<String>,
            #[serde(default)]
            links: Vec<HateoasLink>,
        }

        let parsed: SubscriptionResp = resp
            .json()
            .await
            .map_err(transport_error("create subscription"))?;
        let approval_url =
            approval_link(&parsed.links).ok_or_else(|| ProcessorError::Upstream {
                context: "create subscription",
                message: "approval link is missing from the response".to_string(),
                payload: None,
            })?;

        Ok(CreatedSubscription {
            id: SubscriptionId(parsed.id),
            approval_url: Some(approval_url),
            status: parsed
                .status
                .as_deref()
                .map(SubscriptionStatus::from_wallet)
                .unwrap_or_default(),
        })
    }

    async fn get_subscription(
        &self,
        credential: &ProcessorCredential,
        subscription_id: &SubscriptionId,
    ) -> ProcessorResult<SubscriptionSnapshot> {
        // https://developer.paypal.com/docs/api/subscriptions/v1/#subscriptions_get
        let url = format!(
            "{}/v1/billing/subscriptions/{}",
            self.base_url, subscription_id
        );

        let resp = self
            .send_authorized(credential, "find subscription", |secret| {
                self.http.get(&url).bearer_auth(secret)
            })
            .await?;
        let resp = Self::ensure_success(resp, "find subscription", Some(subscription_id)).await?;

        let parsed: SubscriptionDetail = resp
            .json()
            .await
            .map_err(transport_error("find subscription"))?;
        Ok(snapshot_from_detail(parsed))
    }

    async fn update_payment_method(
        &self,
        _credential: &ProcessorCredential,
        _subscription_id: &SubscriptionId,
        _nonce: &PaymentNonce,
    ) -> ProcessorResult<SubscriptionSnapshot> {
        Err(ProcessorError::Unsupported("payment method rotation"))
    }
}

#[async_trait]
impl PlanCatalog for WalletClient {
    async fn create_product(
        &self,
        credential: &ProcessorCredential,
        descriptor: &ProductDescriptor,
    ) -> ProcessorResult<ProductId> {
        // https://developer.paypal.com/docs/api/catalog-products/v1/#products_create
        let request_id = fresh_request_id("PRODUCT");
        let body = json!({
            "name": descriptor.name,
            "description": descriptor.description,
            "type": descriptor.kind,
            "category": descriptor.category,
        });
        let url = format!("{}/v1/catalogs/products", self.base_url);

        let resp = self
            .send_authorized(credential, "create product", |secret| {
                self.http
                    .post(&url)
                    .bearer_auth(secret)
                    .header("PayPal-Request-Id", request_id.as_str())
                    .json(&body)
            })
            .await?;
        let resp = Self::ensure_success(resp, "create product", None).await?;

        #[derive(Deserialize)]
        struct ProductResp {
            id: String,
        }

        let parsed: ProductResp = resp.json().await.map_err(transport_error("create product"))?;
        Ok(ProductId(parsed.id))
    }

    async fn create_plan(
        &self,
        credential: &ProcessorCredential,
        product_id: &ProductId,
        descriptor: &PlanDescriptor,
        pricing: &PricingTerms,
    ) -> ProcessorResult<PlanId> {
        // https://developer.paypal.com/docs/api/subscriptions/v1/#plans_create
        let request_id = fresh_request_id("PLAN");
        let body = plan_request_body(product_id, descriptor, pricing);
        let url = format!("{}/v1/billing/plans", self.base_url);

        let resp = self
            .send_authorized(credential, "create plan", |secret| {
                self.http
                    .post(&url)
                    .bearer_auth(secret)
                    .header("PayPal-Request-Id", request_id.as_str())
                    .json(&body)
            })
            .await?;
        let resp = Self::ensure_success(resp, "create plan", None).await?;

        #[derive(Deserialize)]
        struct PlanResp {
            id: String,
        }

        let parsed: PlanResp = resp.json().await.map_err(transport_error("create plan"))?;
        Ok(PlanId(parsed.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_model::{PlanSettings, ProductSettings, SubscriberSettings};
    use crate::domain::value_objects::billing::{BillingInterval, SubscriberInfo};

    fn sample_config() -> WalletConfig {
        WalletConfig {
            base_url: "https://wallet.test".to_string(),
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            product: ProductSettings {
                name: "Monthly Subscription".to_string(),
                description: "Monthly recurring payment for premium access".to_string(),
                kind: "SERVICE".to_string(),
                category: "SOFTWARE".to_string(),
            },
            plan: PlanSettings {
                name: "Monthly Premium Plan".to_string(),
                description: "Monthly subscription for $10".to_string(),
                price: "10.00".to_string(),
                currency: "USD".to_string(),
                interval_unit: "MONTH".to_string(),
                interval_count: 1,
                total_cycles: 0,
            },
            subscriber: SubscriberSettings {
                given_name: "John".to_string(),
                surname: "Doe".to_string(),
                email: "customer@example.com".to_string(),
            },
            timeout: 5,
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

    fn catalog_model() -> CreateSubscriptionModel {
        CreateSubscriptionModel {
            payment_method: None,
            plan: PlanTerms::Catalog(PlanId::from("P-5ML4271244454362")),
            subscriber: Some(SubscriberInfo {
                given_name: "John".to_string(),
                surname: "Doe".to_string(),
                email: "customer@example.com".to_string(),
            }),
            merchant_account_id: None,
            billing_day_of_month: None,
        }
    }

    #[test]
    fn plan_request_body_pins_a_regular_billing_cycle() {
        let body = plan_request_body(
            &ProductId::from("PROD-4XH24418"),
            &PlanDescriptor {
                name: "Monthly Premium Plan".to_string(),
                description: "Monthly subscription for $10".to_string(),
            },
            &sample_pricing(),
        );

        assert_eq!(body["product_id"], "PROD-4XH24418");
        assert_eq!(body["status"], "ACTIVE");
        let cycle = &body["billing_cycles"][0];
        assert_eq!(cycle["tenure_type"], "REGULAR");
        assert_eq!(cycle["sequence"], 1);
        assert_eq!(cycle["total_cycles"], 0);
        assert_eq!(cycle["frequency"]["interval_unit"], "MONTH");
        assert_eq!(cycle["frequency"]["interval_count"], 1);
        assert_eq!(cycle["pricing_scheme"]["fixed_price"]["value"], "10.00");
        assert_eq!(
            cycle["pricing_scheme"]["fixed_price"]["currency_code"],
            "USD"
        );

        let preferences = &body["payment_preferences"];
        assert_eq!(preferences["auto_bill_outstanding"], true);
        assert_eq!(preferences["setup_fee_failure_action"], "CONTINUE");
        assert_eq!(preferences["payment_failure_threshold"], 3);
    }

    #[test]
    fn subscription_request_body_schedules_a_near_future_start() {
        let body = subscription_request_body(&catalog_model()).unwrap();

        assert_eq!(body["plan_id"], "P-5ML4271244454362");
        let start_time =
            DateTime::parse_from_rfc3339(body["start_time"].as_str().unwrap()).unwrap();
        let offset = start_time.with_timezone(&Utc) - Utc::now();
        assert!(offset > Duration::minutes(9) && offset < Duration::minutes(11));

        let subscriber = &body["subscriber"];
        assert_eq!(subscriber["name"]["given_name"], "John");
        assert_eq!(subscriber["name"]["surname"], "Doe");
        assert_eq!(subscriber["email_address"], "customer@example.com");
    }

    #[test]
    fn subscription_request_body_omits_absent_subscriber() {
        let mut model = catalog_model();
        model.subscriber = None;

        let body = subscription_request_body(&model).unwrap();
        assert!(body.get("subscriber").is_none());
    }

    #[test]
    fn subscription_request_body_rejects_inline_terms() {
        let mut model = catalog_model();
        model.plan = PlanTerms::Inline(sample_pricing());

        let err = subscription_request_body(&model).unwrap_err();
        assert!(matches!(err, ProcessorError::Unsupported(_)));
    }

    #[test]
    fn approval_link_picks_the_approve_rel() {
        let links = vec![
            HateoasLink {
                rel: "self".to_string(),
                href: "https://wallet.test/v1/billing/subscriptions/I-1".to_string(),
            },
            HateoasLink {
                rel: "approve".to_string(),
                href: "https://wallet.test/approve?token=I-1".to_string(),
            },
            HateoasLink {
                rel: "edit".to_string(),
                href: "https://wallet.test/v1/billing/subscriptions/I-1".to_string(),
            },
        ];

        assert_eq!(
            approval_link(&links),
            Some("https://wallet.test/approve?token=I-1".to_string())
        );
        assert_eq!(approval_link(&[]), None);
    }

    #[test]
    fn request_ids_are_unique_per_call() {
        let first = fresh_request_id("SUB");
        let second = fresh_request_id("SUB");

        assert!(first.starts_with("SUB-"));
        assert_ne!(first, second);
    }

    #[test]
    fn snapshot_from_detail_maps_billing_info() {
        let detail: SubscriptionDetail = serde_json::from_value(serde_json::json!({
            "id": "I-BW452GLLEP1G",
            "status": "ACTIVE",
            "create_time": "2026-06-01T12:00:00Z",
            "update_time": "2026-08-15T08:30:00Z",
            "billing_info": {
                "next_billing_time": "2026-09-01T10:00:00Z",
                "failed_payments_count": 0,
                "cycle_executions": [
                    { "tenure_type": "TRIAL", "cycles_completed": 1 },
                    { "tenure_type": "REGULAR", "cycles_completed": 5 }
                ],
                "last_payment": {
                    "amount": { "value": "10.00", "currency_code": "USD" }
                }
            }
        }))
        .unwrap();

        let snapshot = snapshot_from_detail(detail);

        assert_eq!(snapshot.id, SubscriptionId::from("I-BW452GLLEP1G"));
        assert_eq!(snapshot.status, SubscriptionStatus::Active);
        assert_eq!(snapshot.cycles_completed, Some(5));
        assert_eq!(snapshot.amount, Some("10.00".to_string()));
        assert_eq!(snapshot.currency, Some("USD".to_string()));
        assert_eq!(snapshot.failure_count, Some(0));
        assert!(snapshot.next_billing_time.is_some());
        assert!(snapshot.payment_method_ref.is_none());
        assert!(snapshot.cycles_total.is_none());
    }

    #[tokio::test]
    async fn rejected_credential_exchange_surfaces_an_auth_error() {
        let mut config = sample_config();
        config.base_url = "http://127.0.0.1:9".to_string();
        let client = WalletClient::new(&config).unwrap();

        let err = client.acquire_credential().await.unwrap_err();
        assert!(matches!(err, ProcessorError::Auth(_)));
    }

    #[tokio::test]
    async fn payment_method_operations_are_unsupported() {
        let client = WalletClient::new(&sample_config()).unwrap();
        let credential =
            ProcessorCredential::Bearer(AccessToken::from_grant("token".to_string(), 3600));

        let err = client
            .create_payment_method(&credential, &PaymentNonce::from("fake-valid-nonce"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessorError::Unsupported(_)));

        let err = client
            .update_payment_method(
                &credential,
                &SubscriptionId::from("I-1"),
                &PaymentNonce::from("fake-valid-nonce"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessorError::Unsupported(_)));
    }

    #[tokio::test]
    async fn wallet_calls_require_a_bearer_credential() {
        let client = WalletClient::new(&sample_config()).unwrap();

        let err = client
            .create_product(
                &ProcessorCredential::MerchantKeys,
                &ProductDescriptor {
                    name: "Monthly Subscription".to_string(),
                    description: "Monthly recurring payment for premium access".to_string(),
                    kind: "SERVICE".to_string(),
                    category: "SOFTWARE".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessorError::Auth(_)));
    }
}
