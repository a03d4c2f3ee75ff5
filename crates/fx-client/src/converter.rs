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

//! Conversion controller
//!
//! Sits between a UI shell and [`CurrencyService`]: validates input, debounces
//! bursts of changes, discards outcomes of superseded requests, records
//! realized rates, and falls back to the last cached rate when every
//! provider is down.

use crate::rate_store::RateCache;
use crate::service::CurrencyService;
use chrono::{DateTime, Utc};
use fx_core::{
  format_amount, supported_currencies, Config, ConversionRequest, ConversionResult, Currency, Error,
  FailureKind,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Raw input as the UI holds it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionInput {
  pub amount: String,
  pub from: Option<Currency>,
  pub to: Option<Currency>,
}

impl ConversionInput {
  pub fn new(amount: impl Into<String>, from: Option<Currency>, to: Option<Currency>) -> Self {
    Self { amount: amount.into(), from, to }
  }

  /// Same amount with source and target exchanged
  pub fn swapped(&self) -> Self {
    Self { amount: self.amount.clone(), from: self.to, to: self.from }
  }
}

/// Where the controller settled for the latest input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
  Idle,
  Converting,
  Success,
  Fallback,
  Failed,
}

/// Whether live data was reachable, and when rates were last refreshed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiStatus {
  pub online: bool,
  pub last_update: Option<DateTime<Utc>>,
}

/// What the UI renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionView {
  pub converted_amount: String,
  pub is_loading: bool,
  pub error: Option<String>,
  pub phase: Phase,
  pub status: ApiStatus,
}

impl Default for ConversionView {
  fn default() -> Self {
    Self {
      converted_amount: format_amount(0.0),
      is_loading: false,
      error: None,
      phase: Phase::Idle,
      status: ApiStatus { online: true, last_update: None },
    }
  }
}

/// Plain-language message for a failure with no cached rate to fall back on.
pub fn failure_message(kind: FailureKind) -> &'static str {
  match kind {
    FailureKind::Network => "Unable to fetch current rates. Please check your internet connection.",
    FailureKind::Timeout => "Request timed out. Please try again.",
    FailureKind::NotFound => "Currency conversion service unavailable. Please try again later.",
    FailureKind::RateLimited => "Rate limit exceeded. Please try again in a few minutes.",
    FailureKind::Other => "Unable to convert currency. Please try again.",
  }
}

enum Validation {
  Settled(ConversionView),
  Ready(ConversionRequest),
}

/// Debounced, stale-safe conversion controller
pub struct CurrencyConverter {
  service: Arc<CurrencyService>,
  rates: RateCache,
  debounce: Duration,
  generation: AtomicU64,
  last_input: Mutex<Option<ConversionInput>>,
  view: watch::Sender<ConversionView>,
}

impl CurrencyConverter {
  pub fn new(service: Arc<CurrencyService>, rates: RateCache, config: &Config) -> Self {
    let (view, _) = watch::channel(ConversionView::default());
    Self {
      service,
      rates,
      debounce: config.debounce(),
      generation: AtomicU64::new(0),
      last_input: Mutex::new(None),
      view,
    }
  }

  /// The static currency catalog, for populating selectors
  pub fn supported_currencies() -> &'static [Currency] {
    supported_currencies()
  }

  /// Receive every published view
  pub fn subscribe(&self) -> watch::Receiver<ConversionView> {
    self.view.subscribe()
  }

  /// The most recently published view
  pub fn view(&self) -> ConversionView {
    self.view.borrow().clone()
  }

  /// Handle an input change.
  ///
  /// Inputs that need no network settle immediately. Otherwise the call waits
  /// out the debounce window and only proceeds if no newer input arrived in
  /// the meantime. Returns `None` when this input was superseded, either
  /// before firing or while its request was in flight.
  #[instrument(skip(self), fields(amount = %input.amount))]
  pub async fn convert(&self, input: ConversionInput) -> Option<ConversionView> {
    let generation = self.begin(&input);

    let request = match self.validate(&input) {
      Validation::Settled(view) => return Some(self.publish(view)),
      Validation::Ready(request) => request,
    };

    tokio::time::sleep(self.debounce).await;
    if self.is_superseded(generation) {
      debug!("Input superseded before debounce elapsed");
      return None;
    }

    self.run(generation, request).await
  }

  /// Re-run the last input immediately, skipping the debounce window.
  pub async fn retry(&self) -> Option<ConversionView> {
    let input = self.last_input.lock().clone()?;
    self.convert_now(input).await
  }

  /// Like [`convert`](Self::convert) without the debounce window, for
  /// one-shot callers that have no burst of input to coalesce.
  #[instrument(skip(self), fields(amount = %input.amount))]
  pub async fn convert_now(&self, input: ConversionInput) -> Option<ConversionView> {
    let generation = self.begin(&input);

    match self.validate(&input) {
      Validation::Settled(view) => Some(self.publish(view)),
      Validation::Ready(request) => self.run(generation, request).await,
    }
  }

  fn begin(&self, input: &ConversionInput) -> u64 {
    *self.last_input.lock() = Some(input.clone());
    self.generation.fetch_add(1, Ordering::SeqCst) + 1
  }

  fn is_superseded(&self, generation: u64) -> bool {
    self.generation.load(Ordering::SeqCst) != generation
  }

  fn validate(&self, input: &ConversionInput) -> Validation {
    let status = self.view().status;
    let settle = |converted_amount: String, phase: Phase| {
      Validation::Settled(ConversionView {
        converted_amount,
        is_loading: false,
        error: None,
        phase,
        status: status.clone(),
      })
    };

    let (Some(from), Some(to)) = (input.from, input.to) else {
      return settle(format_amount(0.0), Phase::Idle);
    };

    let request = match ConversionRequest::parse(&input.amount, from.code, to.code) {
      Ok(request) => request,
      Err(e) => {
        debug!(error = %e, "Ignoring input");
        return settle(format_amount(0.0), Phase::Idle);
      }
    };

    if request.pair.is_identity() {
      return settle(format_amount(request.amount), Phase::Success);
    }

    Validation::Ready(request)
  }

  async fn run(&self, generation: u64, request: ConversionRequest) -> Option<ConversionView> {
    self.view.send_modify(|view| {
      view.is_loading = true;
      view.error = None;
      view.phase = Phase::Converting;
    });

    let outcome = self.service.convert(&request).await;
    if self.is_superseded(generation) {
      debug!(pair = %request.pair, "Discarding outcome of superseded request");
      return None;
    }

    let view = match outcome {
      Ok(result) => self.on_success(&request, result).await,
      Err(e) => self.on_failure(&request, e).await,
    };

    if self.is_superseded(generation) {
      return None;
    }
    Some(self.publish(view))
  }

  async fn on_success(&self, request: &ConversionRequest, result: ConversionResult) -> ConversionView {
    let now = Utc::now();
    info!(pair = %request.pair, provider = result.provider, "Conversion succeeded");

    if let Err(e) = self.rates.record(&request.pair, result.rate(request.amount), now).await {
      warn!(error = %e, "Failed to persist exchange rate");
    }

    ConversionView {
      converted_amount: format_amount(result.converted_amount),
      is_loading: false,
      error: None,
      phase: Phase::Success,
      status: ApiStatus { online: true, last_update: Some(now) },
    }
  }

  async fn on_failure(&self, request: &ConversionRequest, err: Error) -> ConversionView {
    error!(pair = %request.pair, error = %err, "Currency conversion failed");

    let cached = match self.rates.lookup(&request.pair).await {
      Ok(entry) => entry,
      Err(e) => {
        warn!(error = %e, "Rate cache unavailable");
        None
      }
    };

    match cached {
      Some(entry) => {
        let age = entry.age_description(Utc::now());
        info!(pair = %request.pair, rate = entry.rate, age = %age, "Using cached rate");
        ConversionView {
          converted_amount: format_amount(request.amount * entry.rate),
          is_loading: false,
          error: Some(format!("Using cached rates from {} ago (offline mode)", age)),
          phase: Phase::Fallback,
          status: ApiStatus { online: false, last_update: Some(entry.last_updated) },
        }
      }
      None => ConversionView {
        converted_amount: format_amount(0.0),
        is_loading: false,
        error: Some(failure_message(err.failure_kind()).to_string()),
        phase: Phase::Failed,
        status: ApiStatus { online: false, last_update: None },
      },
    }
  }

  fn publish(&self, view: ConversionView) -> ConversionView {
    self.view.send_replace(view.clone());
    view
  }
}

impl std::fmt::Debug for CurrencyConverter {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CurrencyConverter")
      .field("debounce", &self.debounce)
      .field("generation", &self.generation.load(Ordering::SeqCst))
      .field("rates", &self.rates)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::providers::ProviderRegistry;
  use crate::rate_store::MemoryStore;
  use crate::transport::Transport;
  use wiremock::matchers::method;
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn usd() -> Option<Currency> {
    Currency::find("USD")
  }

  fn eur() -> Option<Currency> {
    Currency::find("EUR")
  }

  // Every provider points at `server`; tests that expect no traffic mount expect(0).
  async fn offline_converter(server: &MockServer) -> CurrencyConverter {
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(500)).expect(0).mount(server).await;
    let config = Config::default().with_debounce_ms(1).with_max_attempts(1);
    let transport = Arc::new(Transport::new(config.clone()).unwrap());
    let registry = ProviderRegistry::new(
      crate::providers::Provider::ALL
        .iter()
        .map(|p| crate::providers::ProviderDescriptor::new(*p).with_base_url(server.uri()))
        .collect(),
    )
    .unwrap();
    let service = Arc::new(CurrencyService::new(transport, registry));
    CurrencyConverter::new(service, RateCache::new(Arc::new(MemoryStore::new())), &config)
  }

  #[tokio::test]
  async fn test_same_currency_settles_without_network() {
    let server = MockServer::start().await;
    let converter = offline_converter(&server).await;

    let view = converter.convert(ConversionInput::new("10.456", usd(), usd())).await.unwrap();

    assert_eq!(view.converted_amount, "10.46");
    assert_eq!(view.error, None);
    assert_eq!(view.phase, Phase::Success);
    assert_eq!(converter.view(), view);
  }

  #[tokio::test]
  async fn test_invalid_amounts_settle_at_zero_without_error() {
    let server = MockServer::start().await;
    let converter = offline_converter(&server).await;

    for amount in ["", "0", "-3", "abc", "1e999"] {
      let view = converter.convert(ConversionInput::new(amount, usd(), eur())).await.unwrap();
      assert_eq!(view.converted_amount, "0.00", "amount '{}'", amount);
      assert_eq!(view.error, None);
      assert_eq!(view.phase, Phase::Idle);
    }

    let view = converter.convert(ConversionInput::new("5", None, eur())).await.unwrap();
    assert_eq!(view.converted_amount, "0.00");
  }

  #[tokio::test]
  async fn test_retry_without_input_does_nothing() {
    let server = MockServer::start().await;
    let converter = offline_converter(&server).await;
    assert!(converter.retry().await.is_none());
  }

  #[test]
  fn test_swapped_input() {
    let input = ConversionInput::new("5", usd(), eur());
    let swapped = input.swapped();
    assert_eq!(swapped.from, eur());
    assert_eq!(swapped.to, usd());
    assert_eq!(swapped.amount, "5");
  }

  #[test]
  fn test_failure_messages_are_distinct() {
    let kinds = [
      FailureKind::Network,
      FailureKind::Timeout,
      FailureKind::NotFound,
      FailureKind::RateLimited,
      FailureKind::Other,
    ];
    let mut messages: Vec<_> = kinds.iter().map(|k| failure_message(*k)).collect();
    messages.dedup();
    assert_eq!(messages.len(), kinds.len());
    assert!(failure_message(FailureKind::Timeout).contains("timed out"));
  }
}
