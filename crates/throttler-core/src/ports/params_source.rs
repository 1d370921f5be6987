//! ParamsSource port - リモート gating params の取得
//!
//! ここは「1 回のネットワーク取得」だけを表します。
//! 重複排除（single-flight）と TTL は `app::config_cache` の責務です。
//!
//! # 実装
//! - **HttpParamsSource**: reqwest による HTTP GET

use async_trait::async_trait;
use serde_json::Value;

/// FetchError は取得失敗（呼び出し側では「params なし」に縮退）
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected http status {0}")]
    Status(u16),

    #[error("response body is not JSON: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ParamsSource: Send + Sync {
    /// リモート文書を 1 回取得する
    async fn fetch(&self) -> Result<Value, FetchError>;

    /// ログ用の説明（URL など）
    fn describe(&self) -> String {
        "params source".to_string()
    }
}
