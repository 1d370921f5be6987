//! CacheEntry - 取得済みリモート文書とその取得時刻
//!
//! `document` が `None` でも `fetched_at` は記録されます（negative cache）。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Raw fetched document; validated per candidate on read.
    pub document: Option<Value>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(document: Option<Value>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            document,
            fetched_at,
        }
    }

    /// Age at `now`. Negative when the clock went backwards.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::TimeDelta {
        now.signed_duration_since(self.fetched_at)
    }

    /// `now - fetched_at < ttl`
    ///
    /// A `fetched_at` in the future counts as fresh until the clock catches up.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.age(now).num_milliseconds() < ttl_ms
    }
}
