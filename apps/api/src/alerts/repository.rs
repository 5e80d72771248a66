use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::subscription::{Subscription, SubscriptionRow};

/// Storage abstraction for subscriptions, injected so the alert core can be
/// exercised against an in-memory repository in tests.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// The record a re-subscribe merges into, if one exists.
    async fn find_by_user_and_phone(
        &self,
        user_id: &str,
        phone: &str,
    ) -> Result<Option<Subscription>, AppError>;

    /// Exact-match lookup used by code verification. A cleared or
    /// never-issued code matches nothing.
    async fn find_by_user_and_code(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<Option<Subscription>, AppError>;

    /// Records eligible for SMS fan-out on `category`: active, phone
    /// verified, method includes SMS, and the category set contains the
    /// (already normalized) category.
    async fn find_active_verified_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Subscription>, AppError>;

    /// Upsert keyed by id.
    async fn save(&self, subscription: &Subscription) -> Result<(), AppError>;
}

/// PostgreSQL-backed repository over the `subscriptions` table.
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_user_and_phone(
        &self,
        user_id: &str,
        phone: &str,
    ) -> Result<Option<Subscription>, AppError> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as("SELECT * FROM subscriptions WHERE user_id = $1 AND phone = $2")
                .bind(user_id)
                .bind(phone)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Subscription::try_from)
            .transpose()
            .map_err(AppError::Internal)
    }

    async fn find_by_user_and_code(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<Option<Subscription>, AppError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            "SELECT * FROM subscriptions WHERE user_id = $1 AND verification_code = $2",
        )
        .bind(user_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Subscription::try_from)
            .transpose()
            .map_err(AppError::Internal)
    }

    async fn find_active_verified_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT * FROM subscriptions
            WHERE is_active
              AND is_phone_verified
              AND notification_method IN ('sms', 'both')
              AND $1 = ANY(categories)
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Subscription::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(AppError::Internal)
    }

    async fn save(&self, subscription: &Subscription) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions
                (id, user_id, phone, categories, notification_method,
                 notification_frequency, is_phone_verified, is_active,
                 verification_code, verification_expires, sms_status,
                 sms_message_id, subscribed_at, last_notified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO UPDATE SET
                categories = EXCLUDED.categories,
                notification_method = EXCLUDED.notification_method,
                notification_frequency = EXCLUDED.notification_frequency,
                is_phone_verified = EXCLUDED.is_phone_verified,
                is_active = EXCLUDED.is_active,
                verification_code = EXCLUDED.verification_code,
                verification_expires = EXCLUDED.verification_expires,
                sms_status = EXCLUDED.sms_status,
                sms_message_id = EXCLUDED.sms_message_id,
                last_notified_at = EXCLUDED.last_notified_at
            "#,
        )
        .bind(subscription.id)
        .bind(&subscription.user_id)
        .bind(&subscription.phone)
        .bind(&subscription.categories)
        .bind(subscription.notification_method.as_str())
        .bind(subscription.notification_frequency.as_str())
        .bind(subscription.is_phone_verified)
        .bind(subscription.is_active)
        .bind(&subscription.verification_code)
        .bind(subscription.verification_expires)
        .bind(&subscription.sms_status)
        .bind(&subscription.sms_message_id)
        .bind(subscription.subscribed_at)
        .bind(subscription.last_notified_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
