use std::sync::Arc;

use crate::alerts::repository::SubscriptionRepository;
use crate::config::Config;
use crate::sms_client::SmsGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Injectable store so the alert core runs against an in-memory
    /// repository in tests and Postgres in production.
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub sms: Arc<dyn SmsGateway>,
    /// Kept for handlers that need runtime settings beyond the wired clients.
    #[allow(dead_code)]
    pub config: Config,
}
