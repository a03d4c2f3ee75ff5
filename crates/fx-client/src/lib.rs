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

//! # fx-client
//!
//! Exchange-rate retrieval for the fx currency converter.
//!
//! ## Features
//!
//! - **Resilient transport**: per-attempt timeout, bounded retry with
//!   exponential backoff, short-lived GET response cache
//! - **Three providers**: divergent JSON contracts normalized in one place
//! - **Sticky failover**: the last provider that worked is tried first, then a
//!   round-robin sweep covers the rest
//! - **Offline fallback**: realized rates are persisted through an injected
//!   key-value store and reused, with a staleness notice, when every provider
//!   is down
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fx_client::{
//!   ConversionInput, CurrencyConverter, CurrencyService, MemoryStore, ProviderRegistry, RateCache,
//!   Transport,
//! };
//! use fx_core::{Config, Currency};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let transport = Arc::new(Transport::new(config.clone())?);
//!     let service = Arc::new(CurrencyService::new(transport, ProviderRegistry::default()));
//!     let rates = RateCache::new(Arc::new(MemoryStore::new()));
//!     let converter = CurrencyConverter::new(service, rates, &config);
//!
//!     let input = ConversionInput::new("10", Currency::find("USD"), Currency::find("EUR"));
//!     if let Some(view) = converter.convert(input).await {
//!         println!("{} {:?}", view.converted_amount, view.error);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod converter;
pub mod providers;
pub mod rate_store;
pub mod service;
pub mod transport;

pub use converter::{ApiStatus, ConversionInput, ConversionView, CurrencyConverter, Phase};
pub use fx_core::{Config, Currency, Error, Result};
pub use providers::{Provider, ProviderDescriptor, ProviderRegistry};
pub use rate_store::{KeyValueStore, MemoryStore, RateCache, RateCacheEntry};
pub use service::{CurrencyService, RoutingState};
pub use transport::{HttpResponse, RequestOptions, Transport};
