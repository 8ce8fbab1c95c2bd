pub mod plan_setup;
pub mod subscriptions;
