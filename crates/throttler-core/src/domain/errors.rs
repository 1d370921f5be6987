//! Errors - ドメインエラー
//!
//! どのエラーも 1 candidate の評価に閉じ込められ、run 全体を止めることはありません。

use thiserror::Error;

use super::candidate::CandidateId;
use crate::ports::StoreError;

#[derive(Debug, Error)]
pub enum ThrottlerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to persist state for candidate={candidate}: {source}")]
    PersistState {
        candidate: CandidateId,
        #[source]
        source: StoreError,
    },

    #[error("candidate check aborted: {0}")]
    CheckAborted(String),
}
