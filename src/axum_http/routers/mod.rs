pub mod card_gateway;
pub mod wallet;
