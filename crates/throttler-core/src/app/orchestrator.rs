//! InstallOrchestrator - 全 candidate のチェックとインストール起動
//!
//! # フロー（candidate ごと、順不同・互いに独立）
//! 1. Installer::is_installed() なら skip（状態には触れない）
//! 2. CohortEvaluator::evaluate() で判定
//! 3. Install なら Installer::resolve_install() → InstallHandle::install()
//!
//! 解決に失敗しても triggered は true のまま（リトライしない）。
//! 1 candidate のエラーや panic が他の candidate のチェックを止めることはありません。

use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::evaluator::CohortEvaluator;
use crate::domain::{Candidate, CandidateId, Decision, Lifecycle, SkipReason, ThrottlerError};
use crate::ports::{INSTALL_MIME_TYPE, Installer};

/// 1 candidate のチェック結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    Skipped { reason: SkipReason },
    InstallStarted { url: String },
    /// Triggered, but the install mechanism could not resolve the URL.
    InstallUnresolved { url: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateReport {
    pub candidate: CandidateId,
    #[serde(flatten)]
    pub outcome: CheckOutcome,
}

/// `run_check()` 1 回分の結果（candidate id 順）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckReport {
    pub candidates: Vec<CandidateReport>,
}

impl CheckReport {
    pub fn outcome(&self, candidate: &CandidateId) -> Option<&CheckOutcome> {
        self.candidates
            .iter()
            .find(|report| &report.candidate == candidate)
            .map(|report| &report.outcome)
    }

    pub fn installs_started(&self) -> usize {
        self.candidates
            .iter()
            .filter(|report| matches!(report.outcome, CheckOutcome::InstallStarted { .. }))
            .count()
    }
}

/// status 表示用の candidate 状態
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateStatus {
    pub candidate: CandidateId,
    pub install_url: String,
    pub lifecycle: Lifecycle,
    pub randomizer: Option<f64>,
}

pub struct InstallOrchestrator {
    candidates: Arc<[Candidate]>,
    evaluator: Arc<CohortEvaluator>,
    installer: Arc<dyn Installer>,
}

impl InstallOrchestrator {
    pub fn new(
        candidates: Vec<Candidate>,
        evaluator: Arc<CohortEvaluator>,
        installer: Arc<dyn Installer>,
    ) -> Self {
        Self {
            candidates: candidates.into(),
            evaluator,
            installer,
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn evaluator(&self) -> &CohortEvaluator {
        &self.evaluator
    }

    /// 全 candidate を並行にチェックする
    pub async fn run_check(&self) -> CheckReport {
        let mut tasks = JoinSet::new();
        for candidate in self.candidates.iter().cloned() {
            let evaluator = Arc::clone(&self.evaluator);
            let installer = Arc::clone(&self.installer);
            tasks.spawn(async move {
                let outcome = check_candidate(&evaluator, installer.as_ref(), &candidate).await;
                CandidateReport {
                    candidate: candidate.id,
                    outcome,
                }
            });
        }

        let mut reports = Vec::with_capacity(self.candidates.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(err) => warn!(error = %err, "candidate check task aborted"),
            }
        }

        // panic した task は id が分からないので、結果の無い candidate を Failed で埋める
        for candidate in self.candidates.iter() {
            if !reports.iter().any(|report| report.candidate == candidate.id) {
                let error = ThrottlerError::CheckAborted(format!("no result for {}", candidate.id));
                reports.push(CandidateReport {
                    candidate: candidate.id.clone(),
                    outcome: CheckOutcome::Failed {
                        error: error.to_string(),
                    },
                });
            }
        }

        reports.sort_by(|a, b| a.candidate.cmp(&b.candidate));
        CheckReport {
            candidates: reports,
        }
    }

    /// candidate ごとのライフサイクル状態
    ///
    /// # Errors
    /// ストアの読み取りに失敗した場合
    pub async fn status(&self) -> Result<Vec<CandidateStatus>, ThrottlerError> {
        let mut statuses = Vec::with_capacity(self.candidates.len());
        for candidate in self.candidates.iter() {
            let state = self.evaluator.states().load(&candidate.id).await?;
            statuses.push(CandidateStatus {
                candidate: candidate.id.clone(),
                install_url: candidate.install_url.clone(),
                lifecycle: Lifecycle::of(state.as_ref()),
                randomizer: state.map(|s| s.randomizer),
            });
        }
        Ok(statuses)
    }
}

async fn check_candidate(
    evaluator: &CohortEvaluator,
    installer: &dyn Installer,
    candidate: &Candidate,
) -> CheckOutcome {
    info!(candidate = %candidate.id, "checking candidate");

    if installer.is_installed(&candidate.id).await {
        info!(candidate = %candidate.id, "candidate already installed");
        return CheckOutcome::Skipped {
            reason: SkipReason::AlreadyInstalled,
        };
    }

    let decision = match evaluator.evaluate(candidate).await {
        Ok(decision) => decision,
        Err(err) => {
            warn!(candidate = %candidate.id, error = %err, "candidate evaluation failed");
            return CheckOutcome::Failed {
                error: err.to_string(),
            };
        }
    };

    match decision {
        Decision::Skip(reason) => {
            info!(candidate = %candidate.id, %reason, "candidate not selected");
            CheckOutcome::Skipped { reason }
        }
        Decision::Install { url, hash } => {
            info!(candidate = %candidate.id, %url, "resolving install");
            match installer.resolve_install(&url, INSTALL_MIME_TYPE, &hash).await {
                Some(handle) => {
                    info!(candidate = %candidate.id, "installing candidate");
                    handle.install();
                    CheckOutcome::InstallStarted { url }
                }
                None => {
                    warn!(candidate = %candidate.id, %url, "install could not be resolved");
                    CheckOutcome::InstallUnresolved { url }
                }
            }
        }
    }
}
