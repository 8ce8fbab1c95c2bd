use anyhow::{Context, Result};

use crate::config::stage::Stage;

use super::config_model::{
    CardGatewayConfig, DotEnvyConfig, PlanSettings, ProductSettings, Server, SubscriberSettings,
    WalletConfig,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let stage = get_stage();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("SERVER_PORT is invalid")?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let card_gateway = CardGatewayConfig {
        base_url: std::env::var("CARD_GATEWAY_BASE_URL")
            .unwrap_or_else(|_| card_gateway_base_url(stage).to_string()),
        merchant_id: std::env::var("CARD_GATEWAY_MERCHANT_ID")
            .expect("CARD_GATEWAY_MERCHANT_ID is invalid"),
        public_key: std::env::var("CARD_GATEWAY_PUBLIC_KEY")
            .expect("CARD_GATEWAY_PUBLIC_KEY is invalid"),
        private_key: std::env::var("CARD_GATEWAY_PRIVATE_KEY")
            .expect("CARD_GATEWAY_PRIVATE_KEY is invalid"),
        merchant_account_id: std::env::var("CARD_GATEWAY_MERCHANT_ACCOUNT_ID").ok(),
        plan_price: std::env::var("CARD_GATEWAY_PLAN_PRICE")
            .unwrap_or_else(|_| "10.00".to_string()),
        plan_currency: std::env::var("CARD_GATEWAY_PLAN_CURRENCY")
            .unwrap_or_else(|_| "USD".to_string()),
        billing_day_of_month: std::env::var("CARD_GATEWAY_BILLING_DAY_OF_MONTH")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .context("CARD_GATEWAY_BILLING_DAY_OF_MONTH is invalid")?,
        total_cycles: std::env::var("CARD_GATEWAY_TOTAL_CYCLES")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .context("CARD_GATEWAY_TOTAL_CYCLES is invalid")?,
        timeout: std::env::var("CARD_GATEWAY_TIMEOUT")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .context("CARD_GATEWAY_TIMEOUT is invalid")?,
    };

    let wallet = WalletConfig {
        base_url: std::env::var("WALLET_BASE_URL")
            .unwrap_or_else(|_| wallet_base_url(stage).to_string()),
        client_id: std::env::var("WALLET_CLIENT_ID").expect("WALLET_CLIENT_ID is invalid"),
        client_secret: std::env::var("WALLET_CLIENT_SECRET")
            .expect("WALLET_CLIENT_SECRET is invalid"),
        product: ProductSettings {
            name: std::env::var("WALLET_PRODUCT_NAME")
                .unwrap_or_else(|_| "Monthly Subscription".to_string()),
            description: std::env::var("WALLET_PRODUCT_DESCRIPTION")
                .unwrap_or_else(|_| "Monthly recurring payment for premium access".to_string()),
            kind: std::env::var("WALLET_PRODUCT_TYPE").unwrap_or_else(|_| "SERVICE".to_string()),
            category: std::env::var("WALLET_PRODUCT_CATEGORY")
                .unwrap_or_else(|_| "SOFTWARE".to_string()),
        },
        plan: PlanSettings {
            name: std::env::var("WALLET_PLAN_NAME")
                .unwrap_or_else(|_| "Monthly Premium Plan".to_string()),
            description: std::env::var("WALLET_PLAN_DESCRIPTION")
                .unwrap_or_else(|_| "Monthly subscription for $10".to_string()),
            price: std::env::var("WALLET_PLAN_PRICE").unwrap_or_else(|_| "10.00".to_string()),
            currency: std::env::var("WALLET_PLAN_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            interval_unit: std::env::var("WALLET_PLAN_INTERVAL_UNIT")
                .unwrap_or_else(|_| "MONTH".to_string()),
            interval_count: std::env::var("WALLET_PLAN_INTERVAL_COUNT")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("WALLET_PLAN_INTERVAL_COUNT is invalid")?,
            total_cycles: std::env::var("WALLET_PLAN_TOTAL_CYCLES")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .context("WALLET_PLAN_TOTAL_CYCLES is invalid")?,
        },
        subscriber: SubscriberSettings {
            given_name: std::env::var("WALLET_SUBSCRIBER_GIVEN_NAME")
                .unwrap_or_else(|_| "John".to_string()),
            surname: std::env::var("WALLET_SUBSCRIBER_SURNAME")
                .unwrap_or_else(|_| "Doe".to_string()),
            email: std::env::var("WALLET_SUBSCRIBER_EMAIL")
                .unwrap_or_else(|_| "customer@example.com".to_string()),
        },
        timeout: std::env::var("WALLET_TIMEOUT")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .context("WALLET_TIMEOUT is invalid")?,
    };

    Ok(DotEnvyConfig {
        server,
        card_gateway,
        wallet,
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or("".to_string());
    Stage::try_from(stage_str.as_str()).unwrap_or_default()
}

fn card_gateway_base_url(stage: Stage) -> &'static str {
    match stage {
        Stage::Sandbox => "https://api.sandbox.braintreegateway.com",
        Stage::Production => "https://api.braintreegateway.com",
    }
}

fn wallet_base_url(stage: Stage) -> &'static str {
    match stage {
        Stage::Sandbox => "https://api-m.sandbox.paypal.com",
        Stage::Production => "https://api-m.paypal.com",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn set_env_vars() {
        unsafe {
            env::set_var("STAGE", "sandbox");
            env::set_var("CARD_GATEWAY_MERCHANT_ID", "merchant-id");
            env::set_var("CARD_GATEWAY_PUBLIC_KEY", "public-key");
            env::set_var("CARD_GATEWAY_PRIVATE_KEY", "private-key");
            env::set_var("WALLET_CLIENT_ID", "wallet-client-id");
            env::set_var("WALLET_CLIENT_SECRET", "wallet-client-secret");
        }
    }

    #[test]
    fn load_fills_defaults_for_optional_settings() {
        set_env_vars();

        let config = load().unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.body_limit, 10);
        assert_eq!(config.server.timeout, 30);

        assert_eq!(config.card_gateway.merchant_id, "merchant-id");
        assert_eq!(
            config.card_gateway.base_url,
            "https://api.sandbox.braintreegateway.com"
        );
        assert_eq!(config.card_gateway.plan_price, "10.00");
        assert_eq!(config.card_gateway.plan_currency, "USD");
        assert_eq!(config.card_gateway.billing_day_of_month, 1);
        assert_eq!(config.card_gateway.total_cycles, 0);

        assert_eq!(config.wallet.base_url, "https://api-m.sandbox.paypal.com");
        assert_eq!(config.wallet.product.name, "Monthly Subscription");
        assert_eq!(config.wallet.plan.name, "Monthly Premium Plan");
        assert_eq!(config.wallet.plan.interval_unit, "MONTH");
        assert_eq!(config.wallet.plan.interval_count, 1);
        assert_eq!(config.wallet.subscriber.given_name, "John");
        assert_eq!(config.wallet.subscriber.email, "customer@example.com");
    }
}
