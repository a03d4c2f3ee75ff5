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

//! HTTP transport layer for exchange-rate provider requests

use fx_core::{Config, Error, Result};
use parking_lot::Mutex;
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

/// Decoded response from a provider
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
  pub data: Value,
  pub status: u16,
  pub headers: HashMap<String, String>,
}

/// Per-call request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
  /// Extra request headers, merged over the defaults
  pub headers: HashMap<String, String>,
}

impl RequestOptions {
  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.insert(name.into(), value.into());
    self
  }
}

#[derive(Debug)]
struct CachedResponse {
  response: HttpResponse,
  stored_at: Instant,
}

/// HTTP transport with per-attempt timeout, bounded retry with exponential
/// backoff, and a URL-keyed cache of successful GET responses.
pub struct Transport {
  client: Client,
  config: Config,
  cache: Mutex<HashMap<String, CachedResponse>>,
}

impl Transport {
  /// Create a new transport instance
  pub fn new(config: Config) -> Result<Self> {
    config.validate()?;

    let client = Client::builder()
      .user_agent(config.user_agent.clone())
      .build()
      .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Self { client, config, cache: Mutex::new(HashMap::new()) })
  }

  /// GET `url`, answering from the response cache when a fresh entry exists.
  #[instrument(skip(self, options), fields(url = %url))]
  pub async fn get(&self, url: &str, options: &RequestOptions) -> Result<HttpResponse> {
    if let Some(response) = self.cache_lookup(url) {
      debug!("Serving response from cache");
      return Ok(response);
    }

    let response = self.request(Method::GET, url, None, options).await?;

    let ttl = self.config.cache_ttl();
    let mut cache = self.cache.lock();
    cache.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    cache.insert(url.to_string(), CachedResponse { response: response.clone(), stored_at: Instant::now() });
    drop(cache);

    Ok(response)
  }

  /// POST a JSON body to `url`. Never cached.
  #[instrument(skip(self, body, options), fields(url = %url))]
  pub async fn post(&self, url: &str, body: &Value, options: &RequestOptions) -> Result<HttpResponse> {
    self.request(Method::POST, url, Some(body), options).await
  }

  async fn request(
    &self,
    method: Method,
    url: &str,
    body: Option<&Value>,
    options: &RequestOptions,
  ) -> Result<HttpResponse> {
    let url = Url::parse(url).map_err(|e| Error::Config(format!("Invalid URL {}: {}", url, e)))?;
    let headers = self.merged_headers(&method, options);

    let mut attempt = 0;
    let mut last_error = None;

    while attempt < self.config.max_attempts {
      if attempt > 0 {
        let delay = self.config.backoff_delay(attempt);
        warn!("Retrying request in {}ms (attempt {})", delay.as_millis(), attempt + 1);
        tokio::time::sleep(delay).await;
      }
      attempt += 1;

      match self.send_once(method.clone(), &url, body, &headers).await {
        Ok(response) => {
          debug!(status = response.status, attempt, "Request successful");
          return Ok(response);
        }
        Err(e) if !e.is_retryable() => {
          warn!(attempt, error = %e, "Request failed, not retrying");
          return Err(e);
        }
        Err(e) => {
          warn!(attempt, error = %e, "Request failed");
          last_error = Some(e);
        }
      }
    }

    Err(last_error.unwrap_or_else(|| Error::Network("Request failed after retries".to_string())))
  }

  async fn send_once(
    &self,
    method: Method,
    url: &Url,
    body: Option<&Value>,
    headers: &BTreeMap<String, String>,
  ) -> Result<HttpResponse> {
    let mut builder = self.client.request(method, url.clone());
    for (name, value) in headers {
      builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = body {
      builder = builder.body(body.to_string());
    }

    let exchange = async {
      let response = builder.send().await.map_err(network_error)?;
      let status = response.status().as_u16();
      let headers: HashMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();
      let text = response.text().await.map_err(network_error)?;
      Ok::<_, Error>((status, headers, text))
    };

    let (status, headers, text) = tokio::time::timeout(self.config.timeout(), exchange)
      .await
      .map_err(|_| Error::Timeout { timeout_ms: self.config.timeout_ms })??;

    if !(200..300).contains(&status) {
      return Err(Error::Http { status, body: text });
    }

    let data = serde_json::from_str(&text).map_err(|e| Error::MalformedResponse {
      api_source: url.host_str().unwrap_or("unknown").to_string(),
      message: format!("body is not JSON: {}", e),
    })?;

    Ok(HttpResponse { data, status, headers })
  }

  fn merged_headers(&self, method: &Method, options: &RequestOptions) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("accept".to_string(), "application/json".to_string());
    if *method == Method::POST {
      headers.insert("content-type".to_string(), "application/json".to_string());
    }
    for (name, value) in &options.headers {
      headers.insert(name.to_ascii_lowercase(), value.clone());
    }
    headers
  }

  // Expired entries are dropped here rather than by a sweeper.
  fn cache_lookup(&self, url: &str) -> Option<HttpResponse> {
    let mut cache = self.cache.lock();
    match cache.get(url) {
      Some(entry) if entry.stored_at.elapsed() < self.config.cache_ttl() => {
        Some(entry.response.clone())
      }
      Some(_) => {
        debug!(url, "Evicting expired cache entry");
        cache.remove(url);
        None
      }
      None => None,
    }
  }

  /// Number of responses currently held, fresh or not yet evicted
  pub fn cached_entries(&self) -> usize {
    self.cache.lock().len()
  }

  /// Drop every cached response
  pub fn clear_cache(&self) {
    self.cache.lock().clear();
  }
}

fn network_error(e: reqwest::Error) -> Error {
  Error::Network(e.to_string())
}

impl std::fmt::Debug for Transport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Transport")
      .field("config", &self.config)
      .field("cached_entries", &self.cached_entries())
      .finish()
  }
}
