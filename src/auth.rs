//! API key authentication.

use axum::http::HeaderMap;
use std::collections::HashSet;

use crate::error::ClubsError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The set of keys the service accepts.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    keys: HashSet<String>,
}

impl ApiKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(Into::into)
                .filter(|k: &String| !k.trim().is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the presented key if it is one of ours.
    pub fn authenticate<'a>(&self, headers: &'a HeaderMap) -> Result<&'a str, ClubsError> {
        let key = extract_api_key(headers).ok_or(ClubsError::Unauthorized)?;
        if self.keys.contains(key) {
            Ok(key)
        } else {
            Err(ClubsError::Unauthorized)
        }
    }
}

pub fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
}
