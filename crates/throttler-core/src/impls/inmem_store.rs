//! InMemoryStore - テスト・ephemeral 実行用の KeyValueStore
//!
//! # 学習ポイント
//! - tokio::sync::Mutex による async-safe な排他制御
//! - 書き込み失敗の注入（永続化失敗時の振る舞いをテストするため）

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::ports::{KeyValueStore, StoreError};

/// InMemoryStore はプロセス内だけで値を保持する
///
/// # 使用例
/// ```ignore
/// let store = InMemoryStore::new();
/// store.set("key", json!({"a": 1})).await?;
/// assert_eq!(store.get("key").await?, Some(json!({"a": 1})));
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, Value>>,
    writable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            writable: AtomicBool::new(true),
        }
    }

    /// 初期値付きで作成
    pub fn with_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
            writable: AtomicBool::new(true),
        }
    }

    /// `false` の間、`set` は `StoreError::Unavailable` を返す
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::SeqCst);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        if !self.writable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("write rejected for key={key}")));
        }
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
