//! Candidate model: what may be installed, and what this host remembers about it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a Candidate (stable add-on id, e.g. `"jid1-b6xdDZ3ld1nExQ@jetpack"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A feature/add-on eligible for gated installation.
///
/// `install_url` is the base URL; the remote `distribution` is appended as
/// `"-{distribution}"`, so hosted URLs are expected to end in a query param.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub install_url: String,
}

impl Candidate {
    pub fn new(id: impl Into<CandidateId>, install_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            install_url: install_url.into(),
        }
    }
}

impl From<String> for CandidateId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Per-candidate state persisted on this host.
///
/// - `randomizer` is drawn once in `[0, 1)` and never redrawn.
/// - `triggered` flips to `true` when an install is attempted and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateState {
    pub randomizer: f64,
    pub triggered: bool,
}

impl CandidateState {
    pub fn fresh(randomizer: f64) -> Self {
        Self {
            randomizer,
            triggered: false,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.triggered {
            Lifecycle::Triggered
        } else {
            Lifecycle::Pending
        }
    }
}

/// Candidate lifecycle: `Uninitialized -> Pending -> Triggered` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Uninitialized,
    Pending,
    Triggered,
}

impl Lifecycle {
    pub fn of(state: Option<&CandidateState>) -> Self {
        state.map_or(Lifecycle::Uninitialized, CandidateState::lifecycle)
    }
}
