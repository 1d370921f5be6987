//! CandidateStates - CandidateState の永続化（ストアとの接着剤）
//!
//! - キー: `throttler.candidate.<candidate id>`
//! - 壊れた値は「前回の状態なし」として扱い、新しく初期化する
//! - 読み取り自体の失敗はエラーとして返す（triggered を誤って上書きしないため）

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{CandidateId, CandidateState};
use crate::ports::{KeyValueStore, Randomizer, StoreError};

pub const CANDIDATE_KEY_PREFIX: &str = "throttler.candidate.";

pub fn candidate_key(candidate: &CandidateId) -> String {
    format!("{CANDIDATE_KEY_PREFIX}{candidate}")
}

pub struct CandidateStates {
    store: Arc<dyn KeyValueStore>,
    randomizer: Arc<dyn Randomizer>,
}

impl CandidateStates {
    pub fn new(store: Arc<dyn KeyValueStore>, randomizer: Arc<dyn Randomizer>) -> Self {
        Self { store, randomizer }
    }

    /// 保存済みの状態。未初期化・破損なら `None`
    pub async fn load(&self, candidate: &CandidateId) -> Result<Option<CandidateState>, StoreError> {
        let Some(value) = self.store.get(&candidate_key(candidate)).await? else {
            return Ok(None);
        };
        match serde_json::from_value::<CandidateState>(value) {
            Ok(state) => Ok(Some(state)),
            Err(err) => {
                warn!(candidate = %candidate, error = %err, "corrupt candidate state, reinitializing");
                Ok(None)
            }
        }
    }

    /// 保存済みの状態を返す。無ければ randomizer を 1 回だけ引いて保存する
    pub async fn load_or_init(&self, candidate: &CandidateId) -> Result<CandidateState, StoreError> {
        if let Some(state) = self.load(candidate).await? {
            return Ok(state);
        }

        let state = CandidateState::fresh(self.randomizer.draw());
        info!(candidate = %candidate, randomizer = state.randomizer, "initializing candidate state");
        self.save(candidate, &state).await?;
        Ok(state)
    }

    pub async fn save(&self, candidate: &CandidateId, state: &CandidateState) -> Result<(), StoreError> {
        let value = serde_json::to_value(state)?;
        self.store.set(&candidate_key(candidate), value).await
    }
}
