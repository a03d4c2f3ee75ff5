/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Durable rate cache used for offline fallback
//!
//! The surrounding application owns the actual key-value store; this module
//! only needs get/set-by-key from it through [`KeyValueStore`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fx_core::{CurrencyPair, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Key-value store interface injected by the application shell.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
  /// Get a stored value by key.
  async fn get(&self, key: &str) -> Result<Option<String>>;

  /// Store a value, replacing any previous one.
  async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store, for tests and shells without persistence
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
  async fn get(&self, key: &str) -> Result<Option<String>> {
    Ok(self.entries.lock().get(key).cloned())
  }

  async fn set(&self, key: &str, value: &str) -> Result<()> {
    self.entries.lock().insert(key.to_string(), value.to_string());
    Ok(())
  }
}

/// Last realized rate for one ordered currency pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateCacheEntry {
  /// Target units per source unit
  pub rate: f64,
  pub last_updated: DateTime<Utc>,
}

impl RateCacheEntry {
  /// Age of this entry in a coarse unit, e.g. `"2 hours"`.
  pub fn age_description(&self, now: DateTime<Utc>) -> String {
    describe_age(now.signed_duration_since(self.last_updated))
  }
}

/// Render a duration as whole minutes, hours or days with correct plurals.
pub fn describe_age(age: Duration) -> String {
  let minutes = age.num_minutes().max(0);
  if minutes < 60 {
    return plural(minutes, "minute");
  }
  let hours = minutes / 60;
  if hours < 24 {
    return plural(hours, "hour");
  }
  plural(hours / 24, "day")
}

fn plural(n: i64, unit: &str) -> String {
  if n == 1 {
    format!("{} {}", n, unit)
  } else {
    format!("{} {}s", n, unit)
  }
}

/// Persisted map of `"{from}-{to}"` to [`RateCacheEntry`], stored as one JSON document.
#[derive(Clone)]
pub struct RateCache {
  store: Arc<dyn KeyValueStore>,
  key: String,
}

impl RateCache {
  /// Store key used when none is given
  pub const DEFAULT_KEY: &'static str = "lastExchangeRates";

  pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
    Self::with_key(store, Self::DEFAULT_KEY)
  }

  pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
    Self { store, key: key.into() }
  }

  /// Overwrite the entry for `pair`.
  pub async fn record(&self, pair: &CurrencyPair, rate: f64, at: DateTime<Utc>) -> Result<()> {
    if !rate.is_finite() || rate <= 0.0 {
      warn!(pair = %pair, rate, "Refusing to cache unusable rate");
      return Ok(());
    }

    let mut entries = self.load().await?;
    entries.insert(pair.key(), RateCacheEntry { rate, last_updated: at });
    self.store.set(&self.key, &serde_json::to_string(&entries)?).await?;

    debug!(pair = %pair, rate, "Cached exchange rate");
    Ok(())
  }

  /// Entry for the exact ordered pair, if one was ever recorded.
  pub async fn lookup(&self, pair: &CurrencyPair) -> Result<Option<RateCacheEntry>> {
    Ok(self.load().await?.remove(&pair.key()))
  }

  // A document that no longer parses is treated as empty and will be replaced on the next record.
  async fn load(&self) -> Result<HashMap<String, RateCacheEntry>> {
    let Some(raw) = self.store.get(&self.key).await? else {
      return Ok(HashMap::new());
    };
    match serde_json::from_str(&raw) {
      Ok(entries) => Ok(entries),
      Err(e) => {
        warn!(key = %self.key, error = %e, "Discarding unreadable rate cache");
        Ok(HashMap::new())
      }
    }
  }
}

impl std::fmt::Debug for RateCache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RateCache").field("key", &self.key).finish()
  }
}
