//! Subscribe operation: validate, merge-or-create, trigger verification.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::subscription::{NotificationFrequency, NotificationMethod, Subscription};
use crate::sms_client::SmsGateway;

use super::normalize_category;
use super::phone::normalize_phone;
use super::repository::SubscriptionRepository;
use super::verification::issue_code;

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    /// Opaque user key from the identity provider.
    pub user_id: String,
    pub phone: String,
    pub categories: Vec<String>,
    #[serde(default)]
    pub notification_method: NotificationMethod,
    #[serde(default)]
    pub notification_frequency: NotificationFrequency,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscribeOutcome {
    pub subscription_id: Uuid,
    pub verification_required: bool,
}

/// Creates a subscription for (user_id, phone) or merges new categories into
/// the existing one.
///
/// Validation happens before any persistence or gateway call. A merge that
/// adds nothing is `AlreadySubscribed` and persists nothing. Any create or
/// merge that leaves the phone unverified triggers a fresh verification code
/// (delivered over SMS for SMS-capable methods) before the request completes.
pub async fn subscribe(
    repo: &dyn SubscriptionRepository,
    gateway: &dyn SmsGateway,
    req: &SubscribeRequest,
) -> Result<SubscribeOutcome, AppError> {
    if req.categories.is_empty() {
        return Err(AppError::Validation(
            "Categories must be a non-empty array.".to_string(),
        ));
    }

    // Normalize and dedup, preserving first-seen order.
    let mut requested: Vec<String> = Vec::with_capacity(req.categories.len());
    for raw in &req.categories {
        let category = normalize_category(raw);
        if !category.is_empty() && !requested.contains(&category) {
            requested.push(category);
        }
    }
    if requested.is_empty() {
        return Err(AppError::Validation(
            "Categories must contain at least one non-blank name.".to_string(),
        ));
    }

    // Reject a malformed phone before touching storage or the gateway. The
    // stored phone stays raw; normalization is reapplied at send time.
    normalize_phone(&req.phone)?;

    let existing = repo.find_by_user_and_phone(&req.user_id, &req.phone).await?;

    let mut subscription = match existing {
        Some(mut sub) => {
            let new_categories: Vec<String> = requested
                .into_iter()
                .filter(|c| !sub.categories.contains(c))
                .collect();
            if new_categories.is_empty() {
                return Err(AppError::AlreadySubscribed);
            }
            sub.categories.extend(new_categories);
            sub
        }
        None => Subscription::new(
            req.user_id.clone(),
            req.phone.clone(),
            requested,
            req.notification_method,
            req.notification_frequency,
        ),
    };

    if subscription.is_phone_verified {
        repo.save(&subscription).await?;
        return Ok(SubscribeOutcome {
            subscription_id: subscription.id,
            verification_required: false,
        });
    }

    issue_code(repo, gateway, &mut subscription).await?;

    Ok(SubscribeOutcome {
        subscription_id: subscription.id,
        verification_required: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::testing::{InMemorySubscriptionRepository, RecordingGateway};
    use crate::models::subscription::STATUS_FAILED;

    fn request(categories: &[&str]) -> SubscribeRequest {
        SubscribeRequest {
            user_id: "user_1".to_string(),
            phone: "0911223344".to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            notification_method: NotificationMethod::Sms,
            notification_frequency: NotificationFrequency::Instant,
        }
    }

    #[tokio::test]
    async fn test_empty_categories_rejected_before_persistence() {
        let repo = InMemorySubscriptionRepository::default();
        let gateway = RecordingGateway::default();

        let result = subscribe(&repo, &gateway, &request(&[])).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(repo.all().is_empty());
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_blank_categories_rejected() {
        let repo = InMemorySubscriptionRepository::default();
        let gateway = RecordingGateway::default();

        let result = subscribe(&repo, &gateway, &request(&["  ", ""])).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(repo.all().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_phone_rejected_before_persistence() {
        let repo = InMemorySubscriptionRepository::default();
        let gateway = RecordingGateway::default();

        let mut req = request(&["engineering"]);
        req.phone = "12345".to_string();

        let result = subscribe(&repo, &gateway, &req).await;
        assert!(matches!(result, Err(AppError::InvalidPhoneFormat(_))));
        assert!(repo.all().is_empty());
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_first_subscribe_creates_record_and_sends_code() {
        let repo = InMemorySubscriptionRepository::default();
        let gateway = RecordingGateway::default();

        let outcome = subscribe(&repo, &gateway, &request(&[" Engineering ", "DESIGN"]))
            .await
            .unwrap();
        assert!(outcome.verification_required);

        let stored = repo.get(outcome.subscription_id).unwrap();
        assert_eq!(stored.categories, vec!["engineering", "design"]);
        assert!(!stored.is_phone_verified);
        assert!(!stored.is_active);
        let code = stored.verification_code.unwrap();

        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+251911223344");
        assert!(sent[0].1.contains(&code));
    }

    #[tokio::test]
    async fn test_resubscribing_same_categories_is_already_subscribed() {
        let repo = InMemorySubscriptionRepository::default();
        let gateway = RecordingGateway::default();

        subscribe(&repo, &gateway, &request(&["engineering"]))
            .await
            .unwrap();
        let result = subscribe(&repo, &gateway, &request(&["Engineering"])).await;

        assert!(matches!(result, Err(AppError::AlreadySubscribed)));
        assert_eq!(repo.all().len(), 1);
        // Only the first subscribe delivered a code.
        assert_eq!(gateway.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_set_merges_only_new_categories() {
        let repo = InMemorySubscriptionRepository::default();
        let gateway = RecordingGateway::default();

        let first = subscribe(&repo, &gateway, &request(&["engineering"]))
            .await
            .unwrap();
        let second = subscribe(&repo, &gateway, &request(&["engineering", "marketing"]))
            .await
            .unwrap();

        assert_eq!(first.subscription_id, second.subscription_id);
        let stored = repo.get(first.subscription_id).unwrap();
        assert_eq!(stored.categories, vec!["engineering", "marketing"]);
    }

    #[tokio::test]
    async fn test_merge_regenerates_code_while_unverified() {
        let repo = InMemorySubscriptionRepository::default();
        let gateway = RecordingGateway::default();

        let outcome = subscribe(&repo, &gateway, &request(&["engineering"]))
            .await
            .unwrap();

        subscribe(&repo, &gateway, &request(&["marketing"]))
            .await
            .unwrap();
        let stored = repo.get(outcome.subscription_id).unwrap();
        assert_eq!(gateway.sent().len(), 2);

        // The second delivery carries the currently stored code.
        let current_code = stored.verification_code.unwrap();
        assert!(gateway.sent()[1].1.contains(&current_code));
    }

    #[tokio::test]
    async fn test_merge_on_verified_record_needs_no_verification() {
        let repo = InMemorySubscriptionRepository::default();
        let gateway = RecordingGateway::default();

        let outcome = subscribe(&repo, &gateway, &request(&["engineering"]))
            .await
            .unwrap();
        let mut sub = repo.get(outcome.subscription_id).unwrap();
        sub.is_phone_verified = true;
        sub.is_active = true;
        sub.verification_code = None;
        repo.save(&sub).await.unwrap();

        let merged = subscribe(&repo, &gateway, &request(&["marketing"]))
            .await
            .unwrap();
        assert!(!merged.verification_required);
        // No second verification SMS for an already-verified phone.
        assert_eq!(gateway.sent().len(), 1);
        assert!(repo.get(outcome.subscription_id).unwrap().verification_code.is_none());
    }

    #[tokio::test]
    async fn test_gateway_failure_keeps_record_with_failed_status() {
        let repo = InMemorySubscriptionRepository::default();
        let gateway = RecordingGateway::failing();

        let result = subscribe(&repo, &gateway, &request(&["engineering"])).await;
        assert!(matches!(result, Err(AppError::Gateway(_))));

        let all = repo.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].sms_status, STATUS_FAILED);
        assert!(all[0].verification_code.is_some());
    }
}
