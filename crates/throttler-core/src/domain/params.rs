//! GatingParams - リモートから配布される cohort パラメータ
//!
//! リモート文書は 2 つの形を受け付けます:
//! - フラットな GatingParams オブジェクト（全 candidate 共通）
//! - candidate id をキーにしたオブジェクト（`{ "<id>": { ...params } }`）
//!
//! 必須フィールドが 1 つでも欠けていれば「params なし」と同じ扱いです。

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::candidate::CandidateId;

/// Fields that must be present and non-null.
pub const REQUIRED_PARAMS: [&str; 4] = ["distribution", "hash", "localeRegex", "threshold"];

/// Validated gating parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatingParams {
    pub distribution: String,
    pub hash: String,
    pub locale_regex: String,
    pub threshold: f64,
}

impl GatingParams {
    /// Picks the params object for `candidate` out of a fetched document and validates it.
    ///
    /// Returns `None` when any required field is missing, null, or of the wrong type.
    pub fn select(document: &Value, candidate: &CandidateId) -> Option<Self> {
        let object = match document.get(candidate.as_str()) {
            Some(keyed @ Value::Object(_)) => keyed,
            _ => document,
        };
        Self::validate(object, candidate)
    }

    fn validate(object: &Value, candidate: &CandidateId) -> Option<Self> {
        let mut complete = true;
        for param in REQUIRED_PARAMS {
            if object.get(param).is_none_or(Value::is_null) {
                warn!(candidate = %candidate, param, "missing gating param");
                complete = false;
            }
        }
        if !complete {
            return None;
        }

        match serde_json::from_value::<GatingParams>(object.clone()) {
            Ok(params) => Some(params),
            Err(err) => {
                warn!(candidate = %candidate, error = %err, "malformed gating params");
                None
            }
        }
    }

    /// `^{localeRegex}` compiled case-insensitively.
    pub fn locale_pattern(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&format!("^{}", self.locale_regex))
            .case_insensitive(true)
            .build()
    }

    /// Install URL for a candidate base URL: `"{base}-{distribution}"`.
    pub fn install_url(&self, base_url: &str) -> String {
        format!("{}-{}", base_url, self.distribution)
    }
}
