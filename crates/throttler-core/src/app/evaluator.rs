//! CohortEvaluator - candidate ごとの判定と trigger の永続化
//!
//! # フロー
//! 1. candidate 単位のロックを取る（同じ candidate の評価は直列化）
//! 2. CandidateState を読み込む（無ければ初期化）
//! 3. triggered なら params を取りに行かずに `already decided`
//! 4. ConfigCache から params を取得し、`domain::decide` で判定
//! 5. Install なら `triggered = true` をインストール前に保存する
//!
//! 判定を決めた読み取りと triggered の書き込みは同じロックの中で行われるため、
//! 同一 candidate を同時に評価しても Install は高々 1 回です。

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::candidate_states::CandidateStates;
use super::config_cache::ConfigCache;
use crate::domain::{Candidate, CandidateId, Decision, SkipReason, ThrottlerError, decide};
use crate::ports::LocaleSource;

pub struct CohortEvaluator {
    cache: Arc<ConfigCache>,
    states: CandidateStates,
    locale: Arc<dyn LocaleSource>,
    locks: Mutex<HashMap<CandidateId, Arc<Mutex<()>>>>,
}

impl CohortEvaluator {
    pub fn new(cache: Arc<ConfigCache>, states: CandidateStates, locale: Arc<dyn LocaleSource>) -> Self {
        Self {
            cache,
            states,
            locale,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn states(&self) -> &CandidateStates {
        &self.states
    }

    /// candidate を評価する
    ///
    /// # Errors
    /// 状態の読み込み・初期化・trigger の保存に失敗した場合。
    /// このとき Install は返さない。
    pub async fn evaluate(&self, candidate: &Candidate) -> Result<Decision, ThrottlerError> {
        let lock = self.candidate_lock(&candidate.id).await;
        let _guard = lock.lock().await;

        let mut state = self.states.load_or_init(&candidate.id).await?;
        if state.triggered {
            debug!(candidate = %candidate.id, "candidate previously triggered install");
            return Ok(Decision::Skip(SkipReason::AlreadyDecided));
        }

        let params = self.cache.get_params(&candidate.id).await;
        if let Some(params) = &params {
            debug!(candidate = %candidate.id, ?params, "using gating params");
        }
        let locale = self.locale.locale();
        let decision = decide(candidate, &state, params.as_ref(), locale.as_deref());

        if decision.is_install() {
            state.triggered = true;
            self.states
                .save(&candidate.id, &state)
                .await
                .map_err(|source| ThrottlerError::PersistState {
                    candidate: candidate.id.clone(),
                    source,
                })?;
            info!(candidate = %candidate.id, "candidate selected, install triggered");
        }

        Ok(decision)
    }

    async fn candidate_lock(&self, candidate: &CandidateId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(
            locks
                .entry(candidate.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config_cache::CachePolicy;
    use crate::app::testing::ScriptedSource;
    use crate::impls::{InMemoryStore, StaticLocale};
    use crate::ports::{FixedRandom, KeyValueStore, Randomizer, SystemClock, ThreadRandom};
    use serde_json::{Value, json};

    fn document(threshold: f64) -> Value {
        json!({ "distribution": "d1", "hash": "h1", "localeRegex": "en", "threshold": threshold })
    }

    fn candidate() -> Candidate {
        Candidate::new("addon@test", "https://host/addon.xpi?src=t")
    }

    struct Fixture {
        source: Arc<ScriptedSource>,
        store: Arc<InMemoryStore>,
        evaluator: Arc<CohortEvaluator>,
    }

    fn fixture(source: ScriptedSource, randomizer: Arc<dyn Randomizer>, locale: &str) -> Fixture {
        fixture_with_policy(source, randomizer, locale, CachePolicy::default())
    }

    fn fixture_with_policy(
        source: ScriptedSource,
        randomizer: Arc<dyn Randomizer>,
        locale: &str,
        policy: CachePolicy,
    ) -> Fixture {
        let source = Arc::new(source);
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(ConfigCache::new(
            source.clone(),
            store.clone(),
            Arc::new(SystemClock),
            policy,
        ));
        let evaluator = Arc::new(CohortEvaluator::new(
            cache,
            CandidateStates::new(store.clone(), randomizer),
            Arc::new(StaticLocale::new(locale)),
        ));
        Fixture {
            source,
            store,
            evaluator,
        }
    }

    #[tokio::test]
    async fn test_install_is_returned_once_then_already_decided() {
        let fx = fixture(ScriptedSource::ok(document(1.0)), Arc::new(FixedRandom::new(0.4)), "en-GB");

        let first = fx.evaluator.evaluate(&candidate()).await.unwrap();
        assert_eq!(
            first,
            Decision::Install {
                url: "https://host/addon.xpi?src=t-d1".to_string(),
                hash: "h1".to_string(),
            }
        );

        for _ in 0..3 {
            let next = fx.evaluator.evaluate(&candidate()).await.unwrap();
            assert_eq!(next, Decision::Skip(SkipReason::AlreadyDecided));
        }
        assert_eq!(fx.source.calls(), 1);

        let stored = fx.store.get("throttler.candidate.addon@test").await.unwrap().unwrap();
        assert_eq!(stored["triggered"], json!(true));
    }

    #[tokio::test]
    async fn test_randomizer_is_stable_across_evaluations() {
        let fx = fixture(ScriptedSource::ok(document(0.0)), Arc::new(ThreadRandom), "en-US");

        fx.evaluator.evaluate(&candidate()).await.unwrap();
        let first = fx.evaluator.states().load(&candidate().id).await.unwrap().unwrap();
        fx.evaluator.evaluate(&candidate()).await.unwrap();
        let second = fx.evaluator.states().load(&candidate().id).await.unwrap().unwrap();

        assert_eq!(first.randomizer, second.randomizer);
    }

    #[tokio::test]
    async fn test_excluded_host_is_reevaluated_against_new_threshold() {
        let fx = fixture_with_policy(
            ScriptedSource::sequence(vec![Ok(document(0.5)), Ok(document(0.9))]),
            Arc::new(FixedRandom::new(0.7)),
            "en-US",
            CachePolicy {
                ttl: std::time::Duration::ZERO,
                ..CachePolicy::default()
            },
        );

        let decision = fx.evaluator.evaluate(&candidate()).await.unwrap();
        assert_eq!(decision, Decision::Skip(SkipReason::ExcludedByRandomDraw));

        // 除外は固定されない: 閾値が上がれば次のチェックで選ばれる
        let decision = fx.evaluator.evaluate(&candidate()).await.unwrap();
        assert!(decision.is_install());
        assert_eq!(fx.source.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_hash_is_no_params_for_every_candidate() {
        let fx = fixture(
            ScriptedSource::ok(json!({ "distribution": "d1", "localeRegex": "en", "threshold": 1.0 })),
            Arc::new(FixedRandom::new(0.1)),
            "en-US",
        );
        let other = Candidate::new("other@test", "https://host/other.xpi?src=t");

        assert_eq!(
            fx.evaluator.evaluate(&candidate()).await.unwrap(),
            Decision::Skip(SkipReason::NoParams)
        );
        assert_eq!(
            fx.evaluator.evaluate(&other).await.unwrap(),
            Decision::Skip(SkipReason::NoParams)
        );
        assert_eq!(fx.source.calls(), 1);
    }

    #[tokio::test]
    async fn test_locale_excluded() {
        let fx = fixture(ScriptedSource::ok(document(1.0)), Arc::new(FixedRandom::new(0.1)), "fr");
        assert_eq!(
            fx.evaluator.evaluate(&candidate()).await.unwrap(),
            Decision::Skip(SkipReason::LocaleExcluded)
        );
    }

    #[tokio::test]
    async fn test_trigger_persist_failure_prevents_install() {
        let fx = fixture(ScriptedSource::ok(document(1.0)), Arc::new(FixedRandom::new(0.1)), "en");
        // 状態を先に初期化してから書き込みを止める
        fx.evaluator.states().load_or_init(&candidate().id).await.unwrap();
        fx.store.set_writable(false);

        let err = fx.evaluator.evaluate(&candidate()).await.unwrap_err();
        assert!(matches!(err, ThrottlerError::PersistState { .. }));

        let state = fx.evaluator.states().load(&candidate().id).await.unwrap().unwrap();
        assert!(!state.triggered);
    }

    #[tokio::test]
    async fn test_concurrent_evaluations_install_at_most_once() {
        let fx = fixture(ScriptedSource::ok(document(1.0)), Arc::new(FixedRandom::new(0.1)), "en");

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..6 {
            let evaluator = Arc::clone(&fx.evaluator);
            tasks.spawn(async move { evaluator.evaluate(&candidate()).await.unwrap() });
        }
        let mut installs = 0;
        while let Some(decision) = tasks.join_next().await {
            if decision.unwrap().is_install() {
                installs += 1;
            }
        }
        assert_eq!(installs, 1);
        assert_eq!(fx.source.calls(), 1);
    }
}
