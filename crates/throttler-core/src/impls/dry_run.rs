//! DryRunInstaller - 何もインストールしない Installer
//!
//! 解決とインストール開始をログに出すだけです。CLI のデフォルト。

use async_trait::async_trait;
use tracing::info;

use crate::domain::CandidateId;
use crate::ports::{InstallHandle, Installer};

#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunInstaller;

struct DryRunInstall {
    url: String,
    expected_hash: String,
}

impl InstallHandle for DryRunInstall {
    fn install(self: Box<Self>) {
        info!(url = %self.url, hash = %self.expected_hash, "dry-run: install started");
    }
}

#[async_trait]
impl Installer for DryRunInstaller {
    async fn is_installed(&self, _candidate: &CandidateId) -> bool {
        false
    }

    async fn resolve_install(
        &self,
        url: &str,
        mime_type: &str,
        expected_hash: &str,
    ) -> Option<Box<dyn InstallHandle>> {
        info!(%url, %mime_type, %expected_hash, "dry-run: resolving install");
        Some(Box::new(DryRunInstall {
            url: url.to_string(),
            expected_hash: expected_hash.to_string(),
        }))
    }
}
