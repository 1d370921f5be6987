//! Installer port - 実際のインストール機構（外部）
//!
//! この crate はインストールの完了・成否を観測しません。
//! `resolve_install` が `None` を返した場合もリトライはしません。

use async_trait::async_trait;

use crate::domain::CandidateId;

/// Mime type passed to every install resolution.
pub const INSTALL_MIME_TYPE: &str = "application/x-xpinstall";

/// 解決済みのインストール。`install()` で非同期にインストールを開始する
pub trait InstallHandle: Send {
    fn install(self: Box<Self>);
}

#[async_trait]
pub trait Installer: Send + Sync {
    /// 既にインストール済みか
    async fn is_installed(&self, candidate: &CandidateId) -> bool;

    /// URL とハッシュからインストールを解決する（失敗時は `None`）
    async fn resolve_install(
        &self,
        url: &str,
        mime_type: &str,
        expected_hash: &str,
    ) -> Option<Box<dyn InstallHandle>>;
}
