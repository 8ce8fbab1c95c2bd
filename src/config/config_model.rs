#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub card_gateway: CardGatewayConfig,
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct CardGatewayConfig {
    pub base_url: String,
    pub merchant_id: String,
    pub public_key: String,
    pub private_key: String,
    pub merchant_account_id: Option<String>,
    pub plan_price: String,
    pub plan_currency: String,
    pub billing_day_of_month: u8,
    pub total_cycles: u32,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub product: ProductSettings,
    pub plan: PlanSettings,
    pub subscriber: SubscriberSettings,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ProductSettings {
    pub name: String,
    pub description: String,
    pub kind: String,
    pub category: String,
}

#[derive(Debug, Clone)]
pub struct PlanSettings {
    pub name: String,
    pub description: String,
    pub price: String,
    pub currency: String,
    pub interval_unit: String,
    pub interval_count: u32,
    pub total_cycles: u32,
}

#[derive(Debug, Clone)]
pub struct SubscriberSettings {
    pub given_name: String,
    pub surname: String,
    pub email: String,
}
