//! Category-matched SMS fan-out for newly posted jobs.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::subscription::STATUS_FAILED;
use crate::sms_client::SmsGateway;

use super::normalize_category;
use super::phone::normalize_phone;
use super::repository::SubscriptionRepository;

/// A newly posted job, handed over by the job-posting workflow once the job
/// record is durably persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub location: String,
    pub category: String,
    pub deadline_days: i64,
}

/// Aggregate outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub successes: usize,
    pub failures: usize,
}

impl DispatchSummary {
    pub fn human_readable(&self) -> String {
        format!(
            "{} SMS sent successfully, {} failed",
            self.successes, self.failures
        )
    }
}

/// Notifies every actionable subscriber whose category set contains the
/// job's normalized category.
///
/// Subscribers are handled independently and sequentially; each one's
/// status/timestamp update is a unit, and no single failure aborts the
/// batch. Partial completion is an accepted terminal state.
pub async fn dispatch_job_alerts(
    repo: &dyn SubscriptionRepository,
    gateway: &dyn SmsGateway,
    job: &JobPosting,
) -> Result<DispatchSummary, AppError> {
    let deadline = Utc::now() + Duration::days(job.deadline_days);
    let deadline_display = deadline.format("%B %-d, %Y").to_string();
    let category = normalize_category(&job.category);

    let subscribers = repo.find_active_verified_by_category(&category).await?;
    info!(
        "Dispatching alert for '{}' ({category}) to {} subscriber(s)",
        job.title,
        subscribers.len()
    );

    let message = format!(
        "New job alert: {} in {} ({category}). Apply before {deadline_display}.",
        job.title, job.location
    );

    let mut summary = DispatchSummary::default();

    for mut subscription in subscribers {
        let send_result = match normalize_phone(&subscription.phone) {
            Ok(to) => gateway.send(&to, &message).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match send_result {
            Ok(receipt) => {
                subscription.sms_status = receipt.status;
                subscription.sms_message_id = receipt.message_id;
                subscription.last_notified_at = Some(Utc::now());
                match repo.save(&subscription).await {
                    Ok(()) => summary.successes += 1,
                    Err(e) => {
                        warn!(
                            "Sent alert but failed to persist subscription {}: {e}",
                            subscription.id
                        );
                        summary.failures += 1;
                    }
                }
            }
            Err(reason) => {
                warn!("Alert SMS failed for subscription {}: {reason}", subscription.id);
                subscription.sms_status = STATUS_FAILED.to_string();
                // Best effort; the batch keeps going either way.
                if let Err(e) = repo.save(&subscription).await {
                    warn!(
                        "Failed to record delivery failure for subscription {}: {e}",
                        subscription.id
                    );
                }
                summary.failures += 1;
            }
        }
    }

    info!("{}", summary.human_readable());
    Ok(summary)
}
