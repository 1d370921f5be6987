//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - ports を Arc<dyn ...> で注入し、シングルトンを作らない

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::candidate_states::CandidateStates;
use super::config_cache::{CachePolicy, ConfigCache};
use super::evaluator::CohortEvaluator;
use super::idle_loop::IdleLoop;
use super::orchestrator::InstallOrchestrator;
use crate::domain::{Candidate, CandidateId};
use crate::ports::{
    Clock, Installer, KeyValueStore, LocaleSource, ParamsSource, Randomizer, SystemClock, ThreadRandom,
};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .store(store)
///     .params_source(source)
///     .installer(installer)
///     .locale(locale)
///     .candidate(Candidate::new("addon@example", "https://host/addon.xpi?src=x"))
///     .build()?;
/// app.orchestrator().run_check().await;
/// ```
///
/// # Fail-fast 設計
/// - 必須 port（store / params_source / installer / locale）が無ければ BuildError
/// - candidate が空、id の重複、空の id / URL も BuildError
/// - clock と randomizer は省略時 SystemClock / ThreadRandom
pub struct AppBuilder {
    store: Option<Arc<dyn KeyValueStore>>,
    params_source: Option<Arc<dyn ParamsSource>>,
    installer: Option<Arc<dyn Installer>>,
    locale: Option<Arc<dyn LocaleSource>>,
    clock: Arc<dyn Clock>,
    randomizer: Arc<dyn Randomizer>,
    policy: CachePolicy,
    candidates: Vec<Candidate>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing port: {0}. It must be provided before build().")]
    MissingPort(&'static str),

    #[error("No candidates configured.")]
    NoCandidates,

    #[error("Duplicate candidate id: {0}")]
    DuplicateCandidate(CandidateId),

    #[error("Candidate {0:?} has an empty id or install url.")]
    InvalidCandidate(CandidateId),
}

impl AppBuilder {
    /// 新しい AppBuilder を作成
    pub fn new() -> Self {
        Self {
            store: None,
            params_source: None,
            installer: None,
            locale: None,
            clock: Arc::new(SystemClock),
            randomizer: Arc::new(ThreadRandom),
            policy: CachePolicy::default(),
            candidates: Vec::new(),
        }
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn params_source(mut self, source: Arc<dyn ParamsSource>) -> Self {
        self.params_source = Some(source);
        self
    }

    pub fn installer(mut self, installer: Arc<dyn Installer>) -> Self {
        self.installer = Some(installer);
        self
    }

    pub fn locale(mut self, locale: Arc<dyn LocaleSource>) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn randomizer(mut self, randomizer: Arc<dyn Randomizer>) -> Self {
        self.randomizer = randomizer;
        self
    }

    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn candidate(mut self, candidate: Candidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn candidates(mut self, candidates: impl IntoIterator<Item = Candidate>) -> Self {
        self.candidates.extend(candidates);
        self
    }

    /// AppBuilder を構築して App を生成
    ///
    /// # 検証
    /// - 必須 port がそろっているか
    /// - candidate が 1 つ以上、id が一意、id と URL が空でないか
    pub fn build(self) -> Result<App, BuildError> {
        let store = self.store.ok_or(BuildError::MissingPort("store"))?;
        let params_source = self.params_source.ok_or(BuildError::MissingPort("params_source"))?;
        let installer = self.installer.ok_or(BuildError::MissingPort("installer"))?;
        let locale = self.locale.ok_or(BuildError::MissingPort("locale"))?;

        if self.candidates.is_empty() {
            return Err(BuildError::NoCandidates);
        }
        let mut seen = HashSet::new();
        for candidate in &self.candidates {
            if candidate.id.as_str().trim().is_empty() || candidate.install_url.trim().is_empty() {
                return Err(BuildError::InvalidCandidate(candidate.id.clone()));
            }
            if !seen.insert(&candidate.id) {
                return Err(BuildError::DuplicateCandidate(candidate.id.clone()));
            }
        }

        let cache = Arc::new(ConfigCache::new(
            params_source,
            Arc::clone(&store),
            self.clock,
            self.policy,
        ));
        let states = CandidateStates::new(store, self.randomizer);
        let evaluator = Arc::new(CohortEvaluator::new(cache, states, locale));
        let orchestrator = Arc::new(InstallOrchestrator::new(self.candidates, evaluator, installer));

        Ok(App { orchestrator })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// App は構築済みの throttler
pub struct App {
    orchestrator: Arc<InstallOrchestrator>,
}

impl App {
    pub fn orchestrator(&self) -> &Arc<InstallOrchestrator> {
        &self.orchestrator
    }

    /// idle 通知で駆動される IdleLoop を作る
    pub fn idle_loop(&self, notifications: mpsc::Receiver<()>) -> IdleLoop {
        IdleLoop::new(Arc::clone(&self.orchestrator), notifications)
    }
}
