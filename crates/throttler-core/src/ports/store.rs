//! KeyValueStore port - 永続化の抽象化
//!
//! プロセス再起動をまたいで残る JSON key-value ストアです。
//! トランザクションは仮定しません（キー単位の last-write-wins のみ）。
//!
//! # 実装
//! - **InMemoryStore**: テスト・ephemeral 実行用
//! - **JsonFileStore**: 本番用（単一 JSON ファイル）

use async_trait::async_trait;
use serde_json::Value;

/// StoreError はストア操作のエラー
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// KeyValueStore は JSON 値を key ごとに保存
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数の candidate チェックから同時に使う）
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 値を取得（無ければ `None`）
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// 値を保存（上書き）
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}
