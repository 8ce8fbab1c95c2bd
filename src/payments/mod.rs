pub mod card_gateway_client;
mod upstream;
pub mod wallet_client;
