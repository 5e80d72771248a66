//! Job-alert core: phone-verified SMS subscriptions and the category-matched
//! fan-out triggered when a job is posted.

pub mod dispatcher;
pub mod handlers;
pub mod phone;
pub mod repository;
pub mod subscribe;
pub mod verification;

#[cfg(test)]
pub mod testing;

/// Trimmed, lower-cased category string — the matching key used at both
/// subscribe and dispatch time.
pub fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}
