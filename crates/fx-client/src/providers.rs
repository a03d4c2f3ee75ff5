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

//! Exchange-rate provider registry
//!
//! Each [`Provider`] variant knows its default endpoint, how to build request
//! paths, and how to normalize its JSON contract into a converted amount or a
//! rates mapping. Nothing outside this module looks at provider identity.

use fx_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// The fixed set of supported exchange-rate APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Provider {
  /// Returns a direct converted `result`, or a rates mapping
  ExchangeRateHost,
  /// Returns `rates[to]` already scaled by the requested amount
  Frankfurter,
  /// Returns the full per-unit rates table for the source currency
  OpenExchangeRates,
}

impl Provider {
  /// Default sweep order
  pub const ALL: [Provider; 3] =
    [Provider::ExchangeRateHost, Provider::Frankfurter, Provider::OpenExchangeRates];

  pub fn name(&self) -> &'static str {
    match self {
      Provider::ExchangeRateHost => "exchangerate.host",
      Provider::Frankfurter => "frankfurter.app",
      Provider::OpenExchangeRates => "exchangerate-api",
    }
  }

  pub fn default_base_url(&self) -> &'static str {
    match self {
      Provider::ExchangeRateHost => "https://api.exchangerate.host",
      Provider::Frankfurter => "https://api.frankfurter.app",
      Provider::OpenExchangeRates => "https://open.er-api.com/v6",
    }
  }

  /// Request path for converting `amount` of `from` into `to`
  pub fn conversion_path(&self, amount: f64, from: &str, to: &str) -> String {
    match self {
      Provider::ExchangeRateHost => format!("/convert?from={}&to={}&amount={}", from, to, amount),
      Provider::Frankfurter => format!("/latest?amount={}&from={}&to={}", amount, from, to),
      Provider::OpenExchangeRates => format!("/latest/{}", from),
    }
  }

  /// Request path for the full rates table of `base`
  pub fn rates_path(&self, base: &str) -> String {
    match self {
      Provider::ExchangeRateHost => format!("/latest?base={}", base),
      Provider::Frankfurter => format!("/latest?from={}", base),
      Provider::OpenExchangeRates => format!("/latest/{}", base),
    }
  }

  /// Extract the converted amount from a conversion response.
  ///
  /// # Errors
  ///
  /// Returns [`Error::MalformedResponse`] when the expected fields are
  /// missing, the rates mapping lacks `to`, or the value is not a finite
  /// positive number.
  pub fn parse_conversion(&self, data: &Value, to: &str, amount: f64) -> Result<f64> {
    let envelope = self.envelope(data)?;

    let converted = match self {
      Provider::ExchangeRateHost => {
        if envelope.success == Some(true) && envelope.result.is_some() {
          self.number(envelope.result.as_ref())?
        } else {
          let rates = self.non_empty_rates(&envelope)?;
          // Best guess: the requested currency if listed, else the first entry in document order.
          let rate = rates.get(to).or_else(|| rates.values().next());
          self.number(rate)? * amount
        }
      }
      Provider::Frankfurter => {
        let rates = self.non_empty_rates(&envelope)?;
        self.number(Some(self.target_rate(rates, to)?))?
      }
      Provider::OpenExchangeRates => {
        let rates = self.non_empty_rates(&envelope)?;
        self.number(Some(self.target_rate(rates, to)?))? * amount
      }
    };

    self.positive(converted)
  }

  /// Extract the rates table from a rates response.
  ///
  /// # Errors
  ///
  /// [`Error::MalformedResponse`] when there is no `rates` object,
  /// [`Error::NoRatesAvailable`] when it holds no numeric entries.
  pub fn parse_rates(&self, data: &Value, base: &str) -> Result<HashMap<String, f64>> {
    let envelope = self.envelope(data)?;
    let rates = envelope.rates.ok_or_else(|| self.malformed("missing rates mapping"))?;

    let table: HashMap<String, f64> = rates
      .into_iter()
      .filter_map(|(code, value)| value.as_f64().filter(|v| v.is_finite() && *v > 0.0).map(|v| (code, v)))
      .collect();

    if table.is_empty() {
      return Err(Error::NoRatesAvailable(base.to_string()));
    }
    Ok(table)
  }

  fn envelope(&self, data: &Value) -> Result<RatesEnvelope> {
    RatesEnvelope::deserialize(data).map_err(|e| self.malformed(&e.to_string()))
  }

  fn non_empty_rates<'a>(&self, envelope: &'a RatesEnvelope) -> Result<&'a Map<String, Value>> {
    match &envelope.rates {
      Some(rates) if !rates.is_empty() => Ok(rates),
      Some(_) => Err(self.malformed("empty rates mapping")),
      None => Err(self.malformed("missing rates mapping")),
    }
  }

  fn target_rate<'a>(&self, rates: &'a Map<String, Value>, to: &str) -> Result<&'a Value> {
    rates.get(to).ok_or_else(|| self.malformed(&format!("rates mapping has no entry for {}", to)))
  }

  fn number(&self, value: Option<&Value>) -> Result<f64> {
    value.and_then(Value::as_f64).ok_or_else(|| self.malformed("value is not numeric"))
  }

  fn positive(&self, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
      Ok(value)
    } else {
      Err(self.malformed(&format!("{} is not a finite positive number", value)))
    }
  }

  fn malformed(&self, message: &str) -> Error {
    Error::MalformedResponse { api_source: self.name().to_string(), message: message.to_string() }
  }
}

impl std::fmt::Display for Provider {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// Superset of the fields any provider returns
#[derive(Debug, Deserialize)]
struct RatesEnvelope {
  #[serde(default)]
  success: Option<bool>,
  #[serde(default)]
  result: Option<Value>,
  #[serde(default)]
  rates: Option<Map<String, Value>>,
}

/// A provider bound to a concrete endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDescriptor {
  pub provider: Provider,
  pub base_url: String,
}

impl ProviderDescriptor {
  pub fn new(provider: Provider) -> Self {
    Self { provider, base_url: provider.default_base_url().to_string() }
  }

  /// Point this provider somewhere other than its public endpoint
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into().trim_end_matches('/').to_string();
    self
  }

  pub fn name(&self) -> &'static str {
    self.provider.name()
  }

  pub fn conversion_url(&self, amount: f64, from: &str, to: &str) -> String {
    format!("{}{}", self.base_url, self.provider.conversion_path(amount, from, to))
  }

  pub fn rates_url(&self, base: &str) -> String {
    format!("{}{}", self.base_url, self.provider.rates_path(base))
  }
}

/// Ordered, non-empty list of providers. Order defines the sweep sequence.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
  descriptors: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
  /// # Errors
  ///
  /// Returns [`Error::Config`] if `descriptors` is empty.
  pub fn new(descriptors: Vec<ProviderDescriptor>) -> Result<Self> {
    if descriptors.is_empty() {
      return Err(Error::Config("provider registry must not be empty".to_string()));
    }
    Ok(Self { descriptors })
  }

  pub fn len(&self) -> usize {
    self.descriptors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.descriptors.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&ProviderDescriptor> {
    self.descriptors.get(index)
  }

  pub fn iter(&self) -> impl Iterator<Item = &ProviderDescriptor> {
    self.descriptors.iter()
  }
}

impl Default for ProviderRegistry {
  fn default() -> Self {
    Self { descriptors: Provider::ALL.iter().map(|p| ProviderDescriptor::new(*p)).collect() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use fx_core::test_utils::assert_rate_eq;
  use serde_json::json;

  #[test]
  fn test_paths() {
    assert_eq!(
      Provider::ExchangeRateHost.conversion_path(10.0, "USD", "EUR"),
      "/convert?from=USD&to=EUR&amount=10"
    );
    assert_eq!(
      Provider::Frankfurter.conversion_path(2.5, "USD", "EUR"),
      "/latest?amount=2.5&from=USD&to=EUR"
    );
    assert_eq!(Provider::OpenExchangeRates.conversion_path(1.0, "GBP", "JPY"), "/latest/GBP");
    assert_eq!(Provider::Frankfurter.rates_path("CHF"), "/latest?from=CHF");
  }

  #[test]
  fn test_exchangerate_host_direct_result() {
    let data = json!({"success": true, "result": 9.2});
    let value = Provider::ExchangeRateHost.parse_conversion(&data, "EUR", 10.0).unwrap();
    assert_rate_eq(value, 9.2);
  }

  #[test]
  fn test_exchangerate_host_first_rate_fallback() {
    let data = json!({"success": false, "rates": {"GBP": 0.8}});
    let value = Provider::ExchangeRateHost.parse_conversion(&data, "EUR", 10.0).unwrap();
    assert_rate_eq(value, 8.0);
  }

  #[test]
  fn test_exchangerate_host_fallback_keeps_document_order() {
    let data = json!({"success": false, "rates": {"GBP": 0.8, "AUD": 1.5}});
    let value = Provider::ExchangeRateHost.parse_conversion(&data, "EUR", 10.0).unwrap();
    assert_rate_eq(value, 8.0);
  }

  #[test]
  fn test_frankfurter_returns_scaled_amount() {
    let data = json!({"amount": 10.0, "base": "USD", "rates": {"EUR": 9.2}});
    let value = Provider::Frankfurter.parse_conversion(&data, "EUR", 10.0).unwrap();
    assert_rate_eq(value, 9.2);
  }

  #[test]
  fn test_open_exchange_rates_multiplies_by_amount() {
    let data = json!({"result": "success", "rates": {"EUR": 0.92, "GBP": 0.79}});
    let value = Provider::OpenExchangeRates.parse_conversion(&data, "EUR", 10.0).unwrap();
    assert_rate_eq(value, 9.2);
  }

  #[test]
  fn test_empty_rates_is_malformed() {
    let data = json!({"rates": {}});
    for provider in Provider::ALL {
      let err = provider.parse_conversion(&data, "EUR", 10.0).unwrap_err();
      assert!(matches!(err, Error::MalformedResponse { .. }), "{} gave {:?}", provider, err);
    }
  }

  #[test]
  fn test_missing_target_and_bad_values() {
    let data = json!({"rates": {"GBP": 0.79}});
    assert!(matches!(
      Provider::Frankfurter.parse_conversion(&data, "EUR", 1.0),
      Err(Error::MalformedResponse { .. })
    ));

    let data = json!({"rates": {"EUR": 0}});
    assert!(Provider::OpenExchangeRates.parse_conversion(&data, "EUR", 1.0).is_err());

    let data = json!({"rates": {"EUR": -1.5}});
    assert!(Provider::Frankfurter.parse_conversion(&data, "EUR", 1.0).is_err());

    let data = json!({"rates": {"EUR": "0.9"}});
    assert!(Provider::Frankfurter.parse_conversion(&data, "EUR", 1.0).is_err());

    let data = json!(["not", "an", "object"]);
    assert!(Provider::ExchangeRateHost.parse_conversion(&data, "EUR", 1.0).is_err());
  }

  #[test]
  fn test_parse_rates() {
    let data = json!({"base": "USD", "rates": {"EUR": 0.92, "JPY": 150.1}});
    let rates = Provider::Frankfurter.parse_rates(&data, "USD").unwrap();
    assert_eq!(rates.len(), 2);
    assert_rate_eq(rates["JPY"], 150.1);

    let err = Provider::OpenExchangeRates.parse_rates(&json!({"rates": {}}), "USD").unwrap_err();
    assert!(matches!(err, Error::NoRatesAvailable(ref base) if base == "USD"));

    let err = Provider::OpenExchangeRates.parse_rates(&json!({"error": "x"}), "USD").unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
  }

  #[test]
  fn test_registry() {
    assert!(matches!(ProviderRegistry::new(vec![]), Err(Error::Config(_))));

    let registry = ProviderRegistry::default();
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.get(1).unwrap().name(), "frankfurter.app");

    let local = ProviderDescriptor::new(Provider::OpenExchangeRates).with_base_url("http://127.0.0.1:9/");
    assert_eq!(local.rates_url("USD"), "http://127.0.0.1:9/latest/USD");
  }
}
