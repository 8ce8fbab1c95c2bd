use std::sync::Arc;

use anyhow::Result;
use billing_bridge::{
    axum_http, config, observability,
    payments::{card_gateway_client::CardGatewayClient, wallet_client::WalletClient},
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Server exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    observability::init_observability("billing-bridge")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let card_gateway = Arc::new(CardGatewayClient::new(&dotenvy_env.card_gateway)?);
    let wallet = Arc::new(WalletClient::new(&dotenvy_env.wallet)?);

    axum_http::http_serve::start(dotenvy_env, card_gateway, wallet).await
}
