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

//! JSON-file key-value store backing the persisted rate cache

use async_trait::async_trait;
use fx_client::KeyValueStore;
use fx_core::{Error, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// All keys live in one JSON object on disk.
#[derive(Debug)]
pub struct FileStore {
  path: PathBuf,
  lock: Mutex<()>,
}

impl FileStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), lock: Mutex::new(()) }
  }

  async fn read_all(&self) -> Result<Map<String, Value>> {
    match tokio::fs::read_to_string(&self.path).await {
      Ok(raw) if raw.trim().is_empty() => Ok(Map::new()),
      Ok(raw) => Ok(serde_json::from_str(&raw)?),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
      Err(e) => Err(Error::Store(format!("{}: {}", self.path.display(), e))),
    }
  }
}

#[async_trait]
impl KeyValueStore for FileStore {
  async fn get(&self, key: &str) -> Result<Option<String>> {
    let _guard = self.lock.lock().await;
    let entries = self.read_all().await?;
    Ok(entries.get(key).and_then(Value::as_str).map(str::to_string))
  }

  async fn set(&self, key: &str, value: &str) -> Result<()> {
    let _guard = self.lock.lock().await;
    let mut entries = self.read_all().await?;
    entries.insert(key.to_string(), Value::String(value.to_string()));

    let body = serde_json::to_string_pretty(&entries)?;
    tokio::fs::write(&self.path, body)
      .await
      .map_err(|e| Error::Store(format!("{}: {}", self.path.display(), e)))
  }
}
