//! Test doubles for the alert core.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::subscription::Subscription;
use crate::sms_client::{SmsError, SmsGateway, SmsReceipt};

use super::repository::SubscriptionRepository;

/// Mutex-backed repository mirroring the Postgres query semantics.
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    records: Mutex<Vec<Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn with(records: Vec<Subscription>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Subscription> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn all(&self) -> Vec<Subscription> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_by_user_and_phone(
        &self,
        user_id: &str,
        phone: &str,
    ) -> Result<Option<Subscription>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == user_id && s.phone == phone)
            .cloned())
    }

    async fn find_by_user_and_code(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<Option<Subscription>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == user_id && s.verification_code.as_deref() == Some(code))
            .cloned())
    }

    async fn find_active_verified_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|s| {
                s.is_actionable()
                    && s.notification_method.includes_sms()
                    && s.categories.iter().any(|c| c == category)
            })
            .cloned()
            .collect())
    }

    async fn save(&self, subscription: &Subscription) -> Result<(), AppError> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|s| s.id == subscription.id) {
            Some(existing) => *existing = subscription.clone(),
            None => records.push(subscription.clone()),
        }
        Ok(())
    }
}

/// Gateway double that records every accepted send and fails on demand.
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<(String, String)>>,
    fail_numbers: HashSet<String>,
    fail_all: bool,
}

impl RecordingGateway {
    /// Rejects every send.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Rejects sends to the given (already normalized) numbers only.
    pub fn failing_for(numbers: &[&str]) -> Self {
        Self {
            fail_numbers: numbers.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Every `(to, message)` pair the gateway accepted, in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsGateway for RecordingGateway {
    async fn send(&self, to: &str, message: &str) -> Result<SmsReceipt, SmsError> {
        if self.fail_all || self.fail_numbers.contains(to) {
            return Err(SmsError::Rejected("simulated gateway failure".to_string()));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push((to.to_string(), message.to_string()));
        let message_id = format!("msg-{}", sent.len());

        Ok(SmsReceipt {
            message_id: Some(message_id),
            status: "sent".to_string(),
        })
    }
}
