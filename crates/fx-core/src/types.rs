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

//! Currency catalog and conversion value types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A currency the converter offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Currency {
  /// ISO 4217 code, unique within the catalog
  pub code: &'static str,
  pub symbol: &'static str,
  pub name: &'static str,
  pub flag: &'static str,
}

const CURRENCIES: [Currency; 10] = [
  Currency { code: "USD", symbol: "$", name: "US Dollar", flag: "🇺🇸" },
  Currency { code: "EUR", symbol: "€", name: "Euro", flag: "🇪🇺" },
  Currency { code: "GBP", symbol: "£", name: "British Pound", flag: "🇬🇧" },
  Currency { code: "JPY", symbol: "¥", name: "Japanese Yen", flag: "🇯🇵" },
  Currency { code: "CAD", symbol: "$", name: "Canadian Dollar", flag: "🇨🇦" },
  Currency { code: "AUD", symbol: "$", name: "Australian Dollar", flag: "🇦🇺" },
  Currency { code: "EGP", symbol: "£", name: "Egyptian Pound", flag: "🇪🇬" },
  Currency { code: "SAR", symbol: "﷼", name: "Saudi Riyal", flag: "🇸🇦" },
  Currency { code: "CHF", symbol: "₣", name: "Swiss Franc", flag: "🇨🇭" },
  Currency { code: "CNY", symbol: "¥", name: "Chinese Yuan", flag: "🇨🇳" },
];

/// The static currency catalog, in display order.
pub fn supported_currencies() -> &'static [Currency] {
  &CURRENCIES
}

impl Currency {
  /// Look up a catalog entry by code, case-insensitively.
  pub fn find(code: &str) -> Option<Currency> {
    CURRENCIES.iter().copied().find(|c| c.code.eq_ignore_ascii_case(code.trim()))
  }

  /// Catalog entries other than `excluded`, for populating the opposite selector.
  pub fn options_excluding(excluded: Option<&Currency>) -> Vec<Currency> {
    CURRENCIES.iter().copied().filter(|c| Some(c.code) != excluded.map(|e| e.code)).collect()
  }
}

impl std::fmt::Display for Currency {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.code)
  }
}

/// Ordered (from, to) pair; `USD-EUR` and `EUR-USD` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
  pub from: String,
  pub to: String,
}

impl CurrencyPair {
  pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
    Self { from: from.into(), to: to.into() }
  }

  /// Key used by the persisted rate cache, `"{from}-{to}"`.
  pub fn key(&self) -> String {
    format!("{}-{}", self.from, self.to)
  }

  pub fn is_identity(&self) -> bool {
    self.from == self.to
  }
}

impl std::fmt::Display for CurrencyPair {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}-{}", self.from, self.to)
  }
}

/// A validated request for one conversion attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
  pub amount: f64,
  pub pair: CurrencyPair,
}

impl ConversionRequest {
  /// Build a request from a numeric amount.
  ///
  /// # Errors
  ///
  /// Returns [`Error::InvalidAmount`] unless `amount` is finite and positive.
  pub fn new(amount: f64, from: &str, to: &str) -> Result<Self> {
    if !amount.is_finite() || amount <= 0.0 {
      return Err(Error::InvalidAmount(amount.to_string()));
    }
    Ok(Self { amount, pair: CurrencyPair::new(from, to) })
  }

  /// Build a request from raw user input such as `"12.50"`.
  pub fn parse(amount: &str, from: &str, to: &str) -> Result<Self> {
    let trimmed = amount.trim();
    let value: f64 =
      trimmed.parse().map_err(|_| Error::InvalidAmount(format!("'{}' is not a number", trimmed)))?;
    Self::new(value, from, to)
  }
}

/// Outcome of one successful provider call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
  pub converted_amount: f64,
  pub provider: &'static str,
}

impl ConversionResult {
  /// Converted units per source unit.
  pub fn rate(&self, amount: f64) -> f64 {
    self.converted_amount / amount
  }
}

/// Render an amount the way the converter displays it, two decimals.
pub fn format_amount(value: f64) -> String {
  format!("{:.2}", value)
}
