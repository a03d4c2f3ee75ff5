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

//! # fx-core
//!
//! Shared building blocks for the fx currency converter: configuration,
//! the error taxonomy, the static currency catalog and the request/result
//! value types that flow between the transport, the provider registry and
//! the conversion controller.

pub mod config;
pub mod error;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::Config;
pub use error::{Error, FailureKind, ProviderFailure, Result};
pub use types::{
  format_amount, supported_currencies, ConversionRequest, ConversionResult, Currency, CurrencyPair,
};

/// Per-attempt HTTP timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Total HTTP attempts per request, first try included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Base delay for exponential backoff between attempts
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Lifetime of a cached GET response
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;

/// Quiescence window before the controller issues a conversion
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// User agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("fx-client/", env!("CARGO_PKG_VERSION"));
