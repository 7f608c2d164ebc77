use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub clubs: usize,
    pub index_pending: u64,
    pub tracked_keys: usize,
}

impl HealthResponse {
    pub fn healthy(clubs: usize, index_pending: u64, tracked_keys: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            clubs,
            index_pending,
            tracked_keys,
        }
    }
}
