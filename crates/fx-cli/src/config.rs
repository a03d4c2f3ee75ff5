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

use anyhow::{Context, Result};
use fx_core::Config as CoreConfig;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
  pub core: CoreConfig,
  pub rate_store_path: PathBuf,
}

impl Config {
  pub fn from_env() -> Result<Self> {
    let defaults = CoreConfig::default();

    let core = CoreConfig {
      timeout_ms: parse_var("FX_TIMEOUT_MS", defaults.timeout_ms)?,
      max_attempts: parse_var("FX_MAX_ATTEMPTS", defaults.max_attempts)?,
      retry_base_delay_ms: parse_var("FX_RETRY_DELAY_MS", defaults.retry_base_delay_ms)?,
      cache_ttl_secs: parse_var("FX_CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
      debounce_ms: parse_var("FX_DEBOUNCE_MS", defaults.debounce_ms)?,
      user_agent: defaults.user_agent,
    };
    core.validate().context("Invalid FX_* settings")?;

    let rate_store_path =
      env::var("FX_RATE_STORE").map(PathBuf::from).unwrap_or_else(|_| default_store_path());

    Ok(Self { core, rate_store_path })
  }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
  match env::var(name) {
    Ok(raw) => raw.trim().parse().ok().with_context(|| format!("Invalid {}: '{}'", name, raw)),
    Err(_) => Ok(default),
  }
}

fn default_store_path() -> PathBuf {
  env::var("HOME")
    .map(|home| PathBuf::from(home).join(".fx-rates.json"))
    .unwrap_or_else(|_| PathBuf::from(".fx-rates.json"))
}
