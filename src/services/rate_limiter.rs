// src/services/rate_limiter.rs
// DOCUMENTATION: Throttle public form submissions per client
// PURPOSE: Keep review/claim/contact/listing forms from being flooded

use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter,
};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::DirectoryError;

/// Which public form a submission came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Review,
    Claim,
    Contact,
    Business,
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionKind::Review => "review",
            SubmissionKind::Claim => "claim",
            SubmissionKind::Contact => "contact",
            SubmissionKind::Business => "business",
        };
        f.write_str(name)
    }
}

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Keyed limiter: one bucket per (form, client address)
pub struct SubmissionLimiter {
    limiter: KeyedLimiter,
}

impl SubmissionLimiter {
    /// `per_minute` of 0 is treated as 1
    pub fn new(per_minute: u32) -> Self {
        let burst = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(burst)),
        }
    }

    pub fn check(&self, kind: SubmissionKind, client: &str) -> Result<(), DirectoryError> {
        let key = format!("{}:{}", kind, client);
        self.limiter.check_key(&key).map_err(|_| {
            log::warn!("Rate limit exceeded for {}", key);
            DirectoryError::RateLimitExceeded
        })
    }

    /// Forget buckets that have fully refilled
    pub fn shrink(&self) {
        self.limiter.retain_recent();
    }
}

/// Periodically drop idle client buckets
pub fn start_limiter_cleanup_task(limiter: Arc<SubmissionLimiter>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            limiter.shrink();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_reject() {
        let limiter = SubmissionLimiter::new(2);
        assert!(limiter.check(SubmissionKind::Review, "10.0.0.1").is_ok());
        assert!(limiter.check(SubmissionKind::Review, "10.0.0.1").is_ok());
        assert!(matches!(
            limiter.check(SubmissionKind::Review, "10.0.0.1"),
            Err(DirectoryError::RateLimitExceeded)
        ));
    }

    #[test]
    fn test_buckets_are_per_kind_and_client() {
        let limiter = SubmissionLimiter::new(1);
        assert!(limiter.check(SubmissionKind::Review, "10.0.0.1").is_ok());
        assert!(limiter.check(SubmissionKind::Contact, "10.0.0.1").is_ok());
        assert!(limiter.check(SubmissionKind::Review, "10.0.0.2").is_ok());
        assert!(limiter.check(SubmissionKind::Review, "10.0.0.1").is_err());
    }

    #[test]
    fn test_zero_quota_still_allows_one() {
        let limiter = SubmissionLimiter::new(0);
        assert!(limiter.check(SubmissionKind::Claim, "c").is_ok());
        assert!(limiter.check(SubmissionKind::Claim, "c").is_err());
    }
}
