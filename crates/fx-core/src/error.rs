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

use thiserror::Error;

/// The main error type for fx-* crates
#[derive(Error, Debug)]
pub enum Error {
  /// A single HTTP attempt ran past the configured bound
  #[error("Request timeout after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  /// Non-2xx HTTP status
  #[error("HTTP {status}: {body}")]
  Http { status: u16, body: String },

  /// Connection, DNS or body transfer failure
  #[error("Network error: {0}")]
  Network(String),

  /// Response body did not have the shape the provider promises
  #[error("Invalid response format from {api_source}: {message}")]
  MalformedResponse { api_source: String, message: String },

  /// Provider answered with an empty rates mapping
  #[error("No exchange rates available for {0}")]
  NoRatesAvailable(String),

  /// Every provider in one sweep failed
  #[error("All currency providers failed: {}", summarize(.attempts))]
  AllProvidersFailed { attempts: Vec<ProviderFailure> },

  /// Amount is not a positive finite number
  #[error("Invalid amount: {0}")]
  InvalidAmount(String),

  /// Configuration error
  #[error("Configuration error: {0}")]
  Config(String),

  /// Serialization/Deserialization error
  #[error("Serialization error: {0}")]
  Serde(#[from] serde_json::Error),

  /// Durable key-value store failure
  #[error("Store error: {0}")]
  Store(String),
}

/// One provider's failure inside a sweep
#[derive(Debug)]
pub struct ProviderFailure {
  pub provider: String,
  pub error: Error,
}

fn summarize(attempts: &[ProviderFailure]) -> String {
  attempts.iter().map(|a| format!("{}: {}", a.provider, a.error)).collect::<Vec<_>>().join(", ")
}

/// Coarse classification used to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
  Network,
  Timeout,
  NotFound,
  RateLimited,
  Other,
}

impl FailureKind {
  // Higher wins when several providers failed for different reasons.
  fn precedence(self) -> u8 {
    match self {
      FailureKind::RateLimited => 4,
      FailureKind::Timeout => 3,
      FailureKind::NotFound => 2,
      FailureKind::Network => 1,
      FailureKind::Other => 0,
    }
  }
}

impl Error {
  /// Classify this error for user messaging.
  ///
  /// An aggregated sweep failure reports the most specific kind among its
  /// attempts, so a sweep where one provider was rate limited and the others
  /// were unreachable reads as rate limited.
  pub fn failure_kind(&self) -> FailureKind {
    match self {
      Error::Timeout { .. } => FailureKind::Timeout,
      Error::Network(_) => FailureKind::Network,
      Error::Http { status: 404, .. } => FailureKind::NotFound,
      Error::Http { status: 429, .. } => FailureKind::RateLimited,
      Error::Http { status, .. } if *status >= 500 => FailureKind::Network,
      Error::Http { .. } => FailureKind::Other,
      Error::AllProvidersFailed { attempts } => attempts
        .iter()
        .map(|a| a.error.failure_kind())
        .max_by_key(|k| k.precedence())
        .unwrap_or(FailureKind::Other),
      Error::MalformedResponse { .. }
      | Error::NoRatesAvailable(_)
      | Error::InvalidAmount(_)
      | Error::Config(_)
      | Error::Serde(_)
      | Error::Store(_) => FailureKind::Other,
    }
  }

  /// Whether the transport may try this request again.
  ///
  /// 401 and 404 are final; every other HTTP status, network failure and
  /// timeout is retried.
  pub fn is_retryable(&self) -> bool {
    match self {
      Error::Http { status, .. } => !matches!(status, 401 | 404),
      Error::Timeout { .. } | Error::Network(_) => true,
      _ => false,
    }
  }
}

/// Result type alias for fx-* crates
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  fn failure(provider: &str, error: Error) -> ProviderFailure {
    ProviderFailure { provider: provider.to_string(), error }
  }

  #[test]
  fn test_retry_policy() {
    assert!(!Error::Http { status: 404, body: String::new() }.is_retryable());
    assert!(!Error::Http { status: 401, body: String::new() }.is_retryable());
    assert!(Error::Http { status: 503, body: String::new() }.is_retryable());
    assert!(Error::Timeout { timeout_ms: 10 }.is_retryable());
    assert!(Error::Network("reset".to_string()).is_retryable());
    assert!(!Error::MalformedResponse { api_source: "x".into(), message: "y".into() }.is_retryable());
  }

  #[test]
  fn test_aggregate_kind_prefers_most_specific() {
    let err = Error::AllProvidersFailed {
      attempts: vec![
        failure("a", Error::Network("refused".to_string())),
        failure("b", Error::Http { status: 429, body: String::new() }),
        failure("c", Error::Timeout { timeout_ms: 5000 }),
      ],
    };
    assert_eq!(err.failure_kind(), FailureKind::RateLimited);

    let err = Error::AllProvidersFailed {
      attempts: vec![
        failure("a", Error::MalformedResponse { api_source: "a".into(), message: "m".into() }),
        failure("b", Error::Http { status: 404, body: String::new() }),
      ],
    };
    assert_eq!(err.failure_kind(), FailureKind::NotFound);
  }

  #[test]
  fn test_aggregate_display_lists_each_provider() {
    let err = Error::AllProvidersFailed {
      attempts: vec![
        failure("frankfurter.app", Error::Timeout { timeout_ms: 5000 }),
        failure("exchangerate-api", Error::Http { status: 500, body: "boom".to_string() }),
      ],
    };
    let text = err.to_string();
    assert!(text.contains("frankfurter.app: Request timeout after 5000ms"));
    assert!(text.contains("exchangerate-api: HTTP 500: boom"));
  }
}
