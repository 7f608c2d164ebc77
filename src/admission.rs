use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::config::Config;
use crate::error::ClubsError;
use crate::token_bucket::TokenBucket;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed { remaining: u32 },
    Rejected { retry_after_secs: u64 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

/// Per-key token bucket limiter. Buckets are created full on first use and
/// live for the lifetime of the controller.
pub struct AdmissionController {
    capacity: u32,
    refill_rate: f64,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl AdmissionController {
    pub fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            capacity,
            refill_rate,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.bucket_capacity(), config.rate_limit as f64)
    }

    /// Consumes one token for `api_key`, returning whether the request may
    /// proceed.
    pub fn admit(&self, api_key: &str) -> Result<bool, ClubsError> {
        Ok(self.check_at(api_key, Instant::now())?.is_allowed())
    }

    pub fn check(&self, api_key: &str) -> Result<Admission, ClubsError> {
        self.check_at(api_key, Instant::now())
    }

    pub fn check_at(&self, api_key: &str, now: Instant) -> Result<Admission, ClubsError> {
        let mut buckets = self.buckets.lock()
            .map_err(|_| ClubsError::Internal("Failed to acquire lock on buckets".to_string()))?;

        let bucket = buckets
            .entry(api_key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity, self.refill_rate, now));

        if bucket.consume_at(1, now) {
            return Ok(Admission::Allowed {
                remaining: bucket.available_tokens_at(now),
            });
        }

        let wait = bucket.time_until_available_at(1, now).unwrap_or_default();
        let retry_after_secs = (wait.as_secs_f64().ceil() as u64).max(1);
        tracing::debug!(retry_after_secs, "Admission rejected");
        Ok(Admission::Rejected { retry_after_secs })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn tracked_keys(&self) -> usize {
        self.buckets.lock().map(|b| b.len()).unwrap_or(0)
    }
}
