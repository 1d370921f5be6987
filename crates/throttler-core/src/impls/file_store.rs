//! JsonFileStore - 単一 JSON ファイルに保存する KeyValueStore
//!
//! - open 時にファイル全体を読み込む（壊れていれば空として扱う）
//! - `set` のたびに一時ファイルへ書いて rename（途中でクラッシュしても旧内容が残る）

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::ports::{KeyValueStore, StoreError};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// ファイルを開く（無ければ空のストア）
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => parse_entries(&path, &bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "state file not found, starting empty");
                Map::new()
            }
            Err(err) => return Err(StoreError::Io(err)),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn parse_entries(path: &Path, bytes: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(entries)) => entries,
        Ok(_) => {
            warn!(path = %path.display(), "state file is not a JSON object, starting empty");
            Map::new()
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "state file is corrupt, starting empty");
            Map::new()
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        // Lock is held across the write so concurrent sets hit disk in order.
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);

        let bytes = serde_json::to_vec_pretty(&next)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        *entries = next;
        Ok(())
    }
}
