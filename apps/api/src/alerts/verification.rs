//! One-time-code phone verification.

use chrono::{Duration, Utc};
use rand::Rng;
use tracing::warn;

use crate::errors::AppError;
use crate::models::subscription::{Subscription, STATUS_FAILED};
use crate::sms_client::SmsGateway;

use super::phone::normalize_phone;
use super::repository::SubscriptionRepository;

/// Verification codes expire 24 hours after issuance.
pub const CODE_TTL_HOURS: i64 = 24;

/// Uniform 6-digit code. Values below 100000 never appear, so there is no
/// leading-zero truncation.
pub fn generate_code() -> String {
    rand::rng().random_range(100_000..=999_999).to_string()
}

/// Issues a fresh code on `subscription`, persists it, and — when the
/// notification method includes SMS — delivers it through the gateway.
///
/// Delivery failure is a soft-fail: the subscription is persisted with
/// `sms_status = failed` and the error surfaces to the caller. The record
/// stays unusable until a new code is requested.
pub async fn issue_code(
    repo: &dyn SubscriptionRepository,
    gateway: &dyn SmsGateway,
    subscription: &mut Subscription,
) -> Result<(), AppError> {
    let code = generate_code();
    subscription.verification_code = Some(code.clone());
    subscription.verification_expires = Some(Utc::now() + Duration::hours(CODE_TTL_HOURS));

    if !subscription.notification_method.includes_sms() {
        repo.save(subscription).await?;
        return Ok(());
    }

    let to = normalize_phone(&subscription.phone)?;
    let message = format!("Your verification code is: {code}\nExpires in 24 hours.");

    match gateway.send(&to, &message).await {
        Ok(receipt) => {
            subscription.sms_status = receipt.status;
            subscription.sms_message_id = receipt.message_id;
            repo.save(subscription).await?;
            Ok(())
        }
        Err(e) => {
            warn!("Verification SMS failed for subscription {}: {e}", subscription.id);
            subscription.sms_status = STATUS_FAILED.to_string();
            subscription.sms_message_id = None;
            repo.save(subscription).await?;
            Err(AppError::Gateway(e.to_string()))
        }
    }
}

/// Marks the subscription verified and active when `code` matches exactly.
///
/// Wrong, expired, and nonexistent codes all resolve to `InvalidCode` with
/// no state change. The code and its expiry are cleared on success, so a
/// code verifies at most once.
pub async fn verify_code(
    repo: &dyn SubscriptionRepository,
    user_id: &str,
    code: &str,
) -> Result<(), AppError> {
    let mut subscription = repo
        .find_by_user_and_code(user_id, code)
        .await?
        .ok_or(AppError::InvalidCode)?;

    // A stored-but-expired code behaves exactly like a wrong one.
    match subscription.verification_expires {
        Some(expires) if expires > Utc::now() => {}
        _ => return Err(AppError::InvalidCode),
    }

    subscription.is_phone_verified = true;
    subscription.is_active = true;
    subscription.verification_code = None;
    subscription.verification_expires = None;
    repo.save(&subscription).await?;

    Ok(())
}
