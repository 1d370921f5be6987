//! IdleLoop - 起動時と idle 通知ごとにチェックを走らせる
//!
//! # フロー
//! 1. 起動時に 1 回 `run_check()`
//! 2. idle 通知を受け取るたびに `run_check()`
//! 3. 通知チャネルが閉じたら終了
//!
//! 通知元（ホストの idle イベント、タイマーなど）はこの crate の外側です。

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::orchestrator::InstallOrchestrator;

/// idle 通知を送る側
pub type IdleNotifier = mpsc::Sender<()>;

pub struct IdleLoop {
    orchestrator: Arc<InstallOrchestrator>,
    notifications: mpsc::Receiver<()>,
}

impl IdleLoop {
    pub fn new(orchestrator: Arc<InstallOrchestrator>, notifications: mpsc::Receiver<()>) -> Self {
        Self {
            orchestrator,
            notifications,
        }
    }

    /// 通知チャネルと IdleLoop を作る
    pub fn channel(orchestrator: Arc<InstallOrchestrator>, capacity: usize) -> (IdleNotifier, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(orchestrator, rx))
    }

    /// 通知チャネルが閉じるまで回る。実行したチェック回数を返す
    pub async fn run(mut self) -> usize {
        info!("running startup install check");
        let report = self.orchestrator.run_check().await;
        debug!(installs_started = report.installs_started(), "startup check finished");
        let mut checks = 1;

        while self.notifications.recv().await.is_some() {
            info!("idle notification received, running install check");
            let report = self.orchestrator.run_check().await;
            debug!(installs_started = report.installs_started(), "idle check finished");
            checks += 1;
        }

        info!(checks, "idle notifications closed, stopping");
        checks
    }
}
