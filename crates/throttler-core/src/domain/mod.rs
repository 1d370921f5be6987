//! Domain model (candidates, gating params, cache entries, decisions).
//!
//! ここには I/O を持ち込みません。ports / app 層から使われる純粋な型と関数だけを置きます。

pub mod cache_entry;
pub mod candidate;
pub mod decision;
pub mod errors;
pub mod params;

pub use cache_entry::CacheEntry;
pub use candidate::{Candidate, CandidateId, CandidateState, Lifecycle};
pub use decision::{Decision, SkipReason, decide};
pub use errors::ThrottlerError;
pub use params::{GatingParams, REQUIRED_PARAMS};
