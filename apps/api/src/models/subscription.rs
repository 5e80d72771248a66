use std::str::FromStr;

use anyhow::{anyhow, Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Delivery status recorded before any send attempt has completed.
pub const STATUS_PENDING: &str = "pending";
/// Delivery status recorded when the gateway rejects or is unreachable.
pub const STATUS_FAILED: &str = "failed";

/// How the subscriber wants to be notified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMethod {
    #[default]
    Sms,
    Email,
    Both,
}

impl NotificationMethod {
    /// SMS fan-out only targets methods that include SMS delivery.
    pub fn includes_sms(self) -> bool {
        matches!(self, Self::Sms | Self::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
            Self::Both => "both",
        }
    }
}

impl FromStr for NotificationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "sms" => Ok(Self::Sms),
            "email" => Ok(Self::Email),
            "both" => Ok(Self::Both),
            other => Err(anyhow!("unknown notification method '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationFrequency {
    #[default]
    Instant,
    Daily,
    Weekly,
}

impl NotificationFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instant => "instant",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl FromStr for NotificationFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "instant" => Ok(Self::Instant),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(anyhow!("unknown notification frequency '{other}'")),
        }
    }
}

/// A phone-based job-alert subscription.
///
/// One record per (user_id, phone); re-subscribing merges categories into the
/// existing record. `user_id` is the opaque key issued by the external
/// identity provider. `phone` is stored exactly as the user supplied it;
/// normalization happens at validation and send time, never in storage.
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: String,
    pub phone: String,
    /// Trimmed, lower-cased, deduplicated; grows monotonically across
    /// subscribe calls.
    pub categories: Vec<String>,
    pub notification_method: NotificationMethod,
    pub notification_frequency: NotificationFrequency,
    pub is_phone_verified: bool,
    pub is_active: bool,
    pub verification_code: Option<String>,
    pub verification_expires: Option<DateTime<Utc>>,
    /// Gateway-reported delivery status for the most recent send attempt.
    pub sms_status: String,
    pub sms_message_id: Option<String>,
    pub subscribed_at: DateTime<Utc>,
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// A fresh, unverified, inactive record. The verification service fills
    /// in the code before the record is persisted.
    pub fn new(
        user_id: String,
        phone: String,
        categories: Vec<String>,
        notification_method: NotificationMethod,
        notification_frequency: NotificationFrequency,
    ) -> Self {
        Subscription {
            id: Uuid::new_v4(),
            user_id,
            phone,
            categories,
            notification_method,
            notification_frequency,
            is_phone_verified: false,
            is_active: false,
            verification_code: None,
            verification_expires: None,
            sms_status: STATUS_PENDING.to_string(),
            sms_message_id: None,
            subscribed_at: Utc::now(),
            last_notified_at: None,
        }
    }

    /// A subscription receives alerts only when verified AND active.
    pub fn is_actionable(&self) -> bool {
        self.is_phone_verified && self.is_active
    }
}

/// Raw database row. Enums are stored as lowercase text; conversion to the
/// typed `Subscription` happens at the repository edge.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: String,
    pub phone: String,
    pub categories: Vec<String>,
    pub notification_method: String,
    pub notification_frequency: String,
    pub is_phone_verified: bool,
    pub is_active: bool,
    pub verification_code: Option<String>,
    pub verification_expires: Option<DateTime<Utc>>,
    pub sms_status: String,
    pub sms_message_id: Option<String>,
    pub subscribed_at: DateTime<Utc>,
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = Error;

    fn try_from(row: SubscriptionRow) -> Result<Self, Error> {
        Ok(Subscription {
            id: row.id,
            user_id: row.user_id,
            phone: row.phone,
            categories: row.categories,
            notification_method: row.notification_method.parse()?,
            notification_frequency: row.notification_frequency.parse()?,
            is_phone_verified: row.is_phone_verified,
            is_active: row.is_active,
            verification_code: row.verification_code,
            verification_expires: row.verification_expires,
            sms_status: row.sms_status,
            sms_message_id: row.sms_message_id,
            subscribed_at: row.subscribed_at,
            last_notified_at: row.last_notified_at,
        })
    }
}
