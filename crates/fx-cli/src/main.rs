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

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use fx_client::{
  ConversionInput, CurrencyConverter, CurrencyService, Phase, ProviderRegistry, RateCache, Transport,
};
use fx_core::Currency;
use std::sync::Arc;
use tracing::debug;

mod config;
mod store;

use store::FileStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "fx")]
#[command(propagate_version = true)]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Verbose output
  #[arg(short, long, global = true)]
  verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Convert an amount between two currencies
  Convert {
    amount: String,
    from: String,
    to: String,
  },
  /// Show the full rates table for a base currency
  Rates {
    #[arg(default_value = "USD")]
    base: String,
  },
  /// List supported currencies
  Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
  // Load environment variables
  dotenv().ok();

  let cli = Cli::parse();

  let log_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt().with_env_filter(log_level).init();

  let config = config::Config::from_env()?;
  debug!(?config, "Loaded configuration");

  let transport = Arc::new(Transport::new(config.core.clone()).context("Failed to create transport")?);
  let service = Arc::new(CurrencyService::new(transport, ProviderRegistry::default()));

  match cli.command {
    Commands::Convert { amount, from, to } => {
      let from = lookup(&from)?;
      let to = lookup(&to)?;
      let rates = RateCache::new(Arc::new(FileStore::new(&config.rate_store_path)));
      let converter = CurrencyConverter::new(service, rates, &config.core);

      let view = converter
        .convert_now(ConversionInput::new(amount.clone(), Some(from), Some(to)))
        .await
        .context("Conversion was superseded")?;

      println!("{} {} = {}{} {}", amount, from.code, to.symbol, view.converted_amount, to.code);
      if let Some(message) = view.error {
        eprintln!("{}", message);
      }
      if view.phase == Phase::Failed {
        std::process::exit(1);
      }
    }
    Commands::Rates { base } => {
      let base = lookup(&base)?;
      let rates = service.exchange_rates(base.code).await?;
      let mut codes: Vec<_> = rates.keys().collect();
      codes.sort();
      for code in codes {
        println!("{:<4} {:>14.6}", code, rates[code]);
      }
    }
    Commands::Currencies => {
      for currency in CurrencyConverter::supported_currencies() {
        println!("{} {:<4} {:<3} {}", currency.flag, currency.code, currency.symbol, currency.name);
      }
    }
  }

  Ok(())
}

fn lookup(code: &str) -> Result<Currency> {
  match Currency::find(code) {
    Some(currency) => Ok(currency),
    None => bail!("Unsupported currency: {}", code),
  }
}
