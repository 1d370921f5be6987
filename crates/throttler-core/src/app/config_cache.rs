//! ConfigCache - TTL 付きキャッシュ + single-flight 取得
//!
//! # フロー
//! 1. キャッシュが新鮮（`now - fetched_at < ttl`）なら即座に返す（「params なし」も含む）
//! 2. 取得中（in-flight）なら、その結果を待つ
//! 3. どちらでもなければ取得を開始する（プロセス全体で同時に 1 リクエストまで）
//! 4. 取得完了時: キャッシュとストアを更新 → in-flight を解除 → 待機者全員に同じ値を返す
//!
//! # 学習ポイント
//! - tokio::sync::Mutex で「キャッシュ + in-flight マーカー」をまとめて保護
//! - tokio::sync::watch で 1 つの結果を複数の待機者へ配る
//! - 取得は tokio::spawn した task で走るため、呼び出し側が drop されても最後まで完了する

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::domain::{CacheEntry, CandidateId, GatingParams};
use crate::ports::{Clock, KeyValueStore, ParamsSource};

/// Store key of the persisted CacheEntry.
pub const CACHE_ENTRY_KEY: &str = "throttler.cache";

/// 24h
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// CachePolicy はキャッシュの振る舞いを決める
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,

    /// 取得失敗（ネットワークエラー・非 JSON）も negative entry として TTL の間キャッシュするか
    pub cache_failed_fetches: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            cache_failed_fetches: true,
        }
    }
}

/// 取得完了時に待機者へ配る値
#[derive(Debug, Clone)]
struct Resolved {
    document: Option<Value>,
}

type Flight = watch::Receiver<Option<Resolved>>;

#[derive(Default)]
struct CacheState {
    /// ストアからの読み込みを済ませたか
    loaded: bool,
    entry: Option<CacheEntry>,
    in_flight: Option<Flight>,
}

/// ConfigCache は ParamsSource を TTL と single-flight で包む
///
/// # 使用例
/// ```ignore
/// let cache = ConfigCache::new(source, store, clock, CachePolicy::default());
/// let params = cache.get_params(&candidate_id).await;
/// ```
pub struct ConfigCache {
    source: Arc<dyn ParamsSource>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    policy: CachePolicy,
    state: Arc<Mutex<CacheState>>,
}

impl ConfigCache {
    pub fn new(
        source: Arc<dyn ParamsSource>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            source,
            store,
            clock,
            policy,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// candidate 用に検証済みの GatingParams を返す
    pub async fn get_params(&self, candidate: &CandidateId) -> Option<GatingParams> {
        let document = self.get_document().await?;
        GatingParams::select(&document, candidate)
    }

    /// リモート文書（未検証）を返す。取得失敗や negative cache は `None`
    pub async fn get_document(&self) -> Option<Value> {
        let mut flight = {
            let mut state = self.state.lock().await;
            self.load_persisted(&mut state).await;

            let now = self.clock.now();
            if let Some(entry) = &state.entry
                && entry.is_fresh(now, self.policy.ttl)
            {
                debug!(age_ms = entry.age(now).num_milliseconds(), "reusing cached gating params");
                return entry.document.clone();
            }

            match state.in_flight.clone() {
                Some(flight) => {
                    debug!("waiting for in-flight gating params fetch");
                    flight
                }
                None => {
                    let flight = self.start_fetch();
                    state.in_flight = Some(flight.clone());
                    flight
                }
            }
        };

        let resolved = flight
            .wait_for(Option::is_some)
            .await
            .map(|resolved| (*resolved).clone());
        match resolved {
            Ok(resolved) => resolved.and_then(|resolved| resolved.document),
            Err(_) => {
                // 取得 task が panic した: 次の呼び出しで再取得できるよう in-flight を外す
                warn!("gating params fetch ended without a result");
                let mut state = self.state.lock().await;
                if state
                    .in_flight
                    .as_ref()
                    .is_some_and(|current| current.same_channel(&flight))
                {
                    state.in_flight = None;
                }
                None
            }
        }
    }

    /// 最初の呼び出しでだけストアからキャッシュを読み込む
    async fn load_persisted(&self, state: &mut CacheState) {
        if state.loaded {
            return;
        }
        state.loaded = true;

        match self.store.get(CACHE_ENTRY_KEY).await {
            Ok(Some(value)) => match serde_json::from_value::<CacheEntry>(value) {
                Ok(entry) => state.entry = Some(entry),
                Err(err) => warn!(error = %err, "ignoring corrupt cached gating params"),
            },
            Ok(None) => {}
            Err(err) => warn!(error = %err, "failed to read cached gating params"),
        }
    }

    /// 取得 task を起動し、その結果を受け取る Receiver を返す
    ///
    /// 呼び出し側は state のロックを保持していること
    fn start_fetch(&self) -> Flight {
        let (tx, rx) = watch::channel(None);
        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let state = Arc::clone(&self.state);
        let cache_failures = self.policy.cache_failed_fetches;

        info!(source = %source.describe(), "fetching new gating params");
        tokio::spawn(async move {
            let (document, cacheable) = match source.fetch().await {
                Ok(document) => (Some(document), true),
                Err(err) => {
                    warn!(error = %err, "gating params fetch failed");
                    (None, cache_failures)
                }
            };

            let mut state = state.lock().await;
            if cacheable {
                let entry = CacheEntry::new(document.clone(), clock.now());
                match serde_json::to_value(&entry) {
                    Ok(value) => {
                        if let Err(err) = store.set(CACHE_ENTRY_KEY, value).await {
                            warn!(error = %err, "failed to persist gating params");
                        }
                    }
                    Err(err) => warn!(error = %err, "failed to serialize gating params"),
                }
                state.entry = Some(entry);
            }
            state.in_flight = None;
            tx.send_replace(Some(Resolved { document }));
        });
        rx
    }
}
