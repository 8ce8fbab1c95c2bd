pub mod billing;
pub mod credentials;
pub mod enums;
pub mod subscriptions;
