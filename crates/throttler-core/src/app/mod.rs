//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **ConfigCache**: TTL 付きキャッシュ + single-flight 取得
//! - **CandidateStates**: candidate 状態の永続化
//! - **CohortEvaluator**: cohort 判定と trigger
//! - **InstallOrchestrator**: 全 candidate のチェック
//! - **IdleLoop**: 起動時 + idle 通知ごとのチェック

pub mod builder;
pub mod candidate_states;
pub mod config_cache;
pub mod evaluator;
pub mod idle_loop;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testing;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::candidate_states::{CANDIDATE_KEY_PREFIX, CandidateStates, candidate_key};
pub use self::config_cache::{CACHE_ENTRY_KEY, CachePolicy, ConfigCache, DEFAULT_CACHE_TTL};
pub use self::evaluator::CohortEvaluator;
pub use self::idle_loop::{IdleLoop, IdleNotifier};
pub use self::orchestrator::{
    CandidateReport, CandidateStatus, CheckOutcome, CheckReport, InstallOrchestrator,
};
