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

//! Configuration for the fx converter core
//!
//! The core never reads the environment itself; shells build a [`Config`]
//! however they like and hand it to the transport and controller.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration struct for the converter core
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
  /// Per-attempt request timeout in milliseconds
  pub timeout_ms: u64,

  /// Total attempts for one request, first try included
  pub max_attempts: u32,

  /// Base delay for exponential backoff in milliseconds
  pub retry_base_delay_ms: u64,

  /// Lifetime of cached GET responses in seconds
  pub cache_ttl_secs: u64,

  /// Debounce window for controller input in milliseconds
  pub debounce_ms: u64,

  /// User agent header value
  pub user_agent: String,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      timeout_ms: crate::DEFAULT_TIMEOUT_MS,
      max_attempts: crate::DEFAULT_MAX_ATTEMPTS,
      retry_base_delay_ms: crate::DEFAULT_RETRY_BASE_DELAY_MS,
      cache_ttl_secs: crate::DEFAULT_CACHE_TTL_SECS,
      debounce_ms: crate::DEFAULT_DEBOUNCE_MS,
      user_agent: crate::DEFAULT_USER_AGENT.to_string(),
    }
  }
}

impl Config {
  /// Builder: set timeout_ms
  pub fn with_timeout_ms(mut self, ms: u64) -> Self {
    self.timeout_ms = ms;
    self
  }

  /// Builder: set max_attempts
  pub fn with_max_attempts(mut self, attempts: u32) -> Self {
    self.max_attempts = attempts;
    self
  }

  /// Builder: set retry_base_delay_ms
  pub fn with_retry_base_delay_ms(mut self, ms: u64) -> Self {
    self.retry_base_delay_ms = ms;
    self
  }

  /// Builder: set cache_ttl_secs
  pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
    self.cache_ttl_secs = secs;
    self
  }

  /// Builder: set debounce_ms
  pub fn with_debounce_ms(mut self, ms: u64) -> Self {
    self.debounce_ms = ms;
    self
  }

  /// Reject settings the transport cannot work with.
  pub fn validate(&self) -> Result<()> {
    if self.max_attempts == 0 {
      return Err(Error::Config("max_attempts must be at least 1".to_string()));
    }
    if self.timeout_ms == 0 {
      return Err(Error::Config("timeout_ms must be non-zero".to_string()));
    }
    Ok(())
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_millis(self.timeout_ms)
  }

  pub fn cache_ttl(&self) -> Duration {
    Duration::from_secs(self.cache_ttl_secs)
  }

  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }

  /// Delay to wait before retry number `retry` (1-based): `base * 2^(retry-1)`.
  pub fn backoff_delay(&self, retry: u32) -> Duration {
    let factor = 2_u64.saturating_pow(retry.saturating_sub(1));
    Duration::from_millis(self.retry_base_delay_ms.saturating_mul(factor))
  }
}
