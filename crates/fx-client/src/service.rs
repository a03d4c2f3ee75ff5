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

//! Conversion orchestrator
//!
//! Routes each request to the provider that last succeeded, then falls back to
//! a round-robin sweep over the registry. Routing state lives for the life of
//! the service and is never persisted.

use crate::providers::{ProviderDescriptor, ProviderRegistry};
use crate::transport::{RequestOptions, Transport};
use fx_core::{ConversionRequest, ConversionResult, Error, ProviderFailure, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Process-lifetime endpoint routing state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutingState {
  /// Provider that answered the most recent successful call
  pub last_successful: Option<usize>,
  /// Where the next sweep starts
  pub cursor: usize,
}

/// Multi-provider exchange-rate service
pub struct CurrencyService {
  transport: Arc<Transport>,
  registry: ProviderRegistry,
  routing: Mutex<RoutingState>,
}

impl CurrencyService {
  pub fn new(transport: Arc<Transport>, registry: ProviderRegistry) -> Self {
    Self { transport, registry, routing: Mutex::new(RoutingState::default()) }
  }

  /// Convert `request.amount` from `request.pair.from` into `request.pair.to`.
  ///
  /// # Errors
  ///
  /// Returns [`Error::AllProvidersFailed`] only when every provider failed in
  /// one sweep; the sticky-provider attempt that precedes the sweep is not
  /// part of the aggregate.
  #[instrument(skip(self), fields(pair = %request.pair, amount = request.amount))]
  pub async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResult> {
    let pair = &request.pair;
    self
      .route(move |descriptor| async move {
        let url = descriptor.conversion_url(request.amount, &pair.from, &pair.to);
        let response = self.transport.get(&url, &RequestOptions::default()).await?;
        let converted_amount = descriptor.provider.parse_conversion(&response.data, &pair.to, request.amount)?;
        Ok::<_, Error>(ConversionResult { converted_amount, provider: descriptor.name() })
      })
      .await
  }

  /// Full rates table for `base`, following the same routing policy as [`convert`](Self::convert).
  #[instrument(skip(self))]
  pub async fn exchange_rates(&self, base: &str) -> Result<HashMap<String, f64>> {
    self
      .route(move |descriptor| async move {
        let response = self.transport.get(&descriptor.rates_url(base), &RequestOptions::default()).await?;
        descriptor.provider.parse_rates(&response.data, base)
      })
      .await
  }

  /// Snapshot of the routing state
  pub fn routing_state(&self) -> RoutingState {
    *self.routing.lock()
  }

  async fn route<'a, T, F, Fut>(&'a self, call: F) -> Result<T>
  where
    F: Fn(&'a ProviderDescriptor) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
  {
    let total = self.registry.len();

    // The sticky provider is retried on every call even while degraded; a
    // failure here does not move the cursor or clear the preference.
    let sticky = self.routing.lock().last_successful;
    if let Some(index) = sticky {
      if let Some(descriptor) = self.registry.get(index) {
        match call(descriptor).await {
          Ok(value) => {
            debug!(provider = descriptor.name(), "Last successful provider answered");
            return Ok(value);
          }
          Err(e) => warn!(provider = descriptor.name(), error = %e, "Last successful provider failed"),
        }
      }
    }

    // A full sweep visits every index once, so a failed sweep leaves the
    // cursor back at `start`. The cursor is only advanced while it still
    // holds this sweep's last write; an overlapping call that moved it wins.
    let start = self.routing.lock().cursor;
    let mut expected = start;
    let mut attempts = Vec::with_capacity(total);

    for step in 0..total {
      let index = (start + step) % total;
      let Some(descriptor) = self.registry.get(index) else { continue };

      let outcome = call(descriptor).await;
      let next = (index + 1) % total;
      let mut routing = self.routing.lock();
      if routing.cursor == expected {
        routing.cursor = next;
      }
      expected = next;

      match outcome {
        Ok(value) => {
          routing.last_successful = Some(index);
          info!(provider = descriptor.name(), "Provider succeeded");
          return Ok(value);
        }
        Err(e) => {
          warn!(provider = descriptor.name(), error = %e, "Provider failed");
          attempts.push(ProviderFailure { provider: descriptor.name().to_string(), error: e });
        }
      }
    }

    Err(Error::AllProvidersFailed { attempts })
  }
}

impl std::fmt::Debug for CurrencyService {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CurrencyService")
      .field("registry", &self.registry)
      .field("routing", &self.routing_state())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::providers::Provider;
  use fx_core::test_utils::assert_rate_eq;
  use fx_core::Config;
  use serde_json::json;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  // One mock server per provider so each can be failed independently.
  async fn service_with(servers: &[&MockServer]) -> CurrencyService {
    let config = Config::default().with_max_attempts(1).with_retry_base_delay_ms(1).with_cache_ttl_secs(0);
    let transport = Arc::new(Transport::new(config).unwrap());
    let descriptors = Provider::ALL
      .iter()
      .zip(servers)
      .map(|(provider, server)| ProviderDescriptor::new(*provider).with_base_url(server.uri()))
      .collect();
    CurrencyService::new(transport, ProviderRegistry::new(descriptors).unwrap())
  }

  async fn failing(server: &MockServer, status: u16) {
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(status)).mount(server).await;
  }

  fn request() -> ConversionRequest {
    ConversionRequest::new(10.0, "USD", "EUR").unwrap()
  }

  #[tokio::test]
  async fn test_first_provider_success_becomes_sticky() {
    let host = MockServer::start().await;
    let frank = MockServer::start().await;
    let er = MockServer::start().await;
    Mock::given(path("/convert"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "result": 9.2})))
      .mount(&host)
      .await;

    let service = service_with(&[&host, &frank, &er]).await;
    let result = service.convert(&request()).await.unwrap();

    assert_rate_eq(result.converted_amount, 9.2);
    assert_eq!(result.provider, "exchangerate.host");
    assert_eq!(service.routing_state(), RoutingState { last_successful: Some(0), cursor: 1 });
  }

  #[tokio::test]
  async fn test_sticky_provider_is_tried_first() {
    let host = MockServer::start().await;
    let frank = MockServer::start().await;
    let er = MockServer::start().await;
    failing(&host, 500).await;
    failing(&frank, 500).await;
    Mock::given(path("/latest/USD"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rates": {"EUR": 0.92}})))
      .expect(2)
      .mount(&er)
      .await;

    let service = service_with(&[&host, &frank, &er]).await;
    service.convert(&request()).await.unwrap();
    assert_eq!(service.routing_state(), RoutingState { last_successful: Some(2), cursor: 0 });

    host.reset().await;
    frank.reset().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(500)).expect(0).mount(&host).await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(500)).expect(0).mount(&frank).await;

    let result = service.convert(&request()).await.unwrap();
    assert_eq!(result.provider, "exchangerate-api");
    assert_eq!(service.routing_state().cursor, 0);
  }

  #[tokio::test]
  async fn test_failed_sweep_restores_cursor() {
    let host = MockServer::start().await;
    let frank = MockServer::start().await;
    let er = MockServer::start().await;
    failing(&host, 503).await;
    failing(&frank, 404).await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rates": {}})))
      .mount(&er)
      .await;

    let service = service_with(&[&host, &frank, &er]).await;
    let err = service.convert(&request()).await.unwrap_err();

    match err {
      Error::AllProvidersFailed { attempts } => {
        let names: Vec<_> = attempts.iter().map(|a| a.provider.as_str()).collect();
        assert_eq!(names, ["exchangerate.host", "frankfurter.app", "exchangerate-api"]);
        assert!(matches!(attempts[1].error, Error::Http { status: 404, .. }));
        assert!(matches!(attempts[2].error, Error::MalformedResponse { .. }));
      }
      other => panic!("Expected AllProvidersFailed, got {:?}", other),
    }
    assert_eq!(service.routing_state(), RoutingState { last_successful: None, cursor: 0 });
  }

  #[tokio::test]
  async fn test_failed_sweep_from_later_cursor_returns_to_it() {
    let host = MockServer::start().await;
    let frank = MockServer::start().await;
    let er = MockServer::start().await;
    failing(&host, 500).await;
    Mock::given(path("/latest"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rates": {"EUR": 9.2}})))
      .up_to_n_times(1)
      .mount(&frank)
      .await;
    failing(&frank, 502).await;
    failing(&er, 503).await;

    let service = service_with(&[&host, &frank, &er]).await;
    service.convert(&request()).await.unwrap();
    assert_eq!(service.routing_state(), RoutingState { last_successful: Some(1), cursor: 2 });

    let err = service.convert(&request()).await.unwrap_err();
    match err {
      Error::AllProvidersFailed { attempts } => {
        let names: Vec<_> = attempts.iter().map(|a| a.provider.as_str()).collect();
        assert_eq!(names, ["exchangerate-api", "exchangerate.host", "frankfurter.app"]);
      }
      other => panic!("Expected AllProvidersFailed, got {:?}", other),
    }
    assert_eq!(service.routing_state(), RoutingState { last_successful: Some(1), cursor: 2 });
  }

  #[tokio::test]
  async fn test_overlapping_success_keeps_its_cursor() {
    let host = MockServer::start().await;
    let frank = MockServer::start().await;
    let er = MockServer::start().await;
    failing(&host, 500).await;
    failing(&frank, 500).await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(500).set_delay(std::time::Duration::from_millis(200)))
      .mount(&er)
      .await;

    let service = Arc::new(service_with(&[&host, &frank, &er]).await);
    let sweeping = {
      let service = Arc::clone(&service);
      tokio::spawn(async move { service.convert(&request()).await })
    };

    // While the sweep waits on the slow provider, another call moves the cursor.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    service.routing.lock().cursor = 1;

    assert!(sweeping.await.unwrap().is_err());
    assert_eq!(service.routing_state().cursor, 1);
  }

  #[tokio::test]
  async fn test_sweep_starts_at_cursor() {
    let host = MockServer::start().await;
    let frank = MockServer::start().await;
    let er = MockServer::start().await;
    failing(&host, 500).await;
    Mock::given(path("/latest"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rates": {"EUR": 9.2}})))
      .mount(&frank)
      .await;

    let service = service_with(&[&host, &frank, &er]).await;
    let result = service.convert(&request()).await.unwrap();
    assert_eq!(result.provider, "frankfurter.app");
    assert_eq!(service.routing_state(), RoutingState { last_successful: Some(1), cursor: 2 });
  }

  #[tokio::test]
  async fn test_exchange_rates_follow_routing() {
    let host = MockServer::start().await;
    let frank = MockServer::start().await;
    let er = MockServer::start().await;
    Mock::given(path("/latest"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rates": {}})))
      .mount(&host)
      .await;
    Mock::given(path("/latest"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rates": {"EUR": 0.92, "GBP": 0.79}})))
      .mount(&frank)
      .await;

    let service = service_with(&[&host, &frank, &er]).await;
    let rates = service.exchange_rates("USD").await.unwrap();

    assert_eq!(rates.len(), 2);
    assert_eq!(service.routing_state().last_successful, Some(1));
  }
}
