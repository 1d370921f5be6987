//! Decision model: whether a candidate should be installed on this host.
//!
//! `decide` is a pure function of the candidate, its persisted state, the
//! gating params and the host locale. Persisting the trigger and calling the
//! installer are left to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use super::candidate::{Candidate, CandidateState};
use super::params::GatingParams;

/// Why a candidate was not installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The install mechanism reports the candidate as already present.
    AlreadyInstalled,
    /// An install attempt was made earlier; the positive decision is locked in.
    AlreadyDecided,
    /// No usable params (fetch failed, or payload incomplete/malformed).
    NoParams,
    /// Host locale does not match `^localeRegex`.
    LocaleExcluded,
    /// Persisted randomizer is above the threshold.
    ExcludedByRandomDraw,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::AlreadyInstalled => "already installed",
            SkipReason::AlreadyDecided => "already decided",
            SkipReason::NoParams => "no params",
            SkipReason::LocaleExcluded => "locale excluded",
            SkipReason::ExcludedByRandomDraw => "excluded by random draw",
        };
        f.write_str(reason)
    }
}

/// The outcome of evaluating one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Skip(SkipReason),
    Install { url: String, hash: String },
}

impl Decision {
    pub fn is_install(&self) -> bool {
        matches!(self, Decision::Install { .. })
    }
}

/// Evaluates the cohort gates in order, short-circuiting on the first failure.
pub fn decide(
    candidate: &Candidate,
    state: &CandidateState,
    params: Option<&GatingParams>,
    locale: Option<&str>,
) -> Decision {
    if state.triggered {
        return Decision::Skip(SkipReason::AlreadyDecided);
    }

    let Some(params) = params else {
        return Decision::Skip(SkipReason::NoParams);
    };

    // An uncompilable localeRegex makes the params unusable.
    let pattern = match params.locale_pattern() {
        Ok(pattern) => pattern,
        Err(err) => {
            warn!(candidate = %candidate.id, locale_regex = %params.locale_regex, error = %err, "invalid localeRegex");
            return Decision::Skip(SkipReason::NoParams);
        }
    };

    debug!(candidate = %candidate.id, ?locale, locale_regex = %params.locale_regex, "checking locale");
    if !locale.is_some_and(|locale| pattern.is_match(locale)) {
        return Decision::Skip(SkipReason::LocaleExcluded);
    }

    debug!(candidate = %candidate.id, randomizer = state.randomizer, threshold = params.threshold, "checking random draw");
    if state.randomizer > params.threshold {
        return Decision::Skip(SkipReason::ExcludedByRandomDraw);
    }

    Decision::Install {
        url: params.install_url(&candidate.install_url),
        hash: params.hash.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn candidate() -> Candidate {
        Candidate::new("addon@test", "https://host/addon.xpi?src=t")
    }

    fn params(threshold: f64) -> GatingParams {
        GatingParams {
            distribution: "d1".to_string(),
            hash: "h1".to_string(),
            locale_regex: "en".to_string(),
            threshold,
        }
    }

    #[test]
    fn triggered_state_is_already_decided_even_without_params() {
        let state = CandidateState {
            randomizer: 0.0,
            triggered: true,
        };
        let decision = decide(&candidate(), &state, None, Some("en-US"));
        assert_eq!(decision, Decision::Skip(SkipReason::AlreadyDecided));
    }

    #[test]
    fn absent_params_skip() {
        let decision = decide(&candidate(), &CandidateState::fresh(0.1), None, Some("en-US"));
        assert_eq!(decision, Decision::Skip(SkipReason::NoParams));
    }

    #[rstest]
    #[case::matching_region("en-US", None)]
    #[case::bare_language("en", None)]
    #[case::other_language("fr", Some(SkipReason::LocaleExcluded))]
    fn locale_gate(#[case] locale: &str, #[case] skipped: Option<SkipReason>) {
        let decision = decide(
            &candidate(),
            &CandidateState::fresh(0.1),
            Some(&params(1.0)),
            Some(locale),
        );
        match skipped {
            Some(reason) => assert_eq!(decision, Decision::Skip(reason)),
            None => assert!(decision.is_install()),
        }
    }

    #[test]
    fn missing_locale_is_excluded() {
        let decision = decide(&candidate(), &CandidateState::fresh(0.1), Some(&params(1.0)), None);
        assert_eq!(decision, Decision::Skip(SkipReason::LocaleExcluded));
    }

    #[rstest]
    #[case::below(0.3, true)]
    #[case::equal(0.5, true)]
    #[case::above(0.7, false)]
    fn threshold_gate(#[case] randomizer: f64, #[case] passes: bool) {
        let decision = decide(
            &candidate(),
            &CandidateState::fresh(randomizer),
            Some(&params(0.5)),
            Some("en-US"),
        );
        if passes {
            assert!(decision.is_install());
        } else {
            assert_eq!(decision, Decision::Skip(SkipReason::ExcludedByRandomDraw));
        }
    }

    #[test]
    fn invalid_locale_regex_counts_as_no_params() {
        let mut broken = params(1.0);
        broken.locale_regex = "(en".to_string();
        let decision = decide(&candidate(), &CandidateState::fresh(0.1), Some(&broken), Some("en"));
        assert_eq!(decision, Decision::Skip(SkipReason::NoParams));
    }

    #[test]
    fn install_carries_url_and_hash() {
        let decision = decide(
            &candidate(),
            &CandidateState::fresh(0.99),
            Some(&params(1.0)),
            Some("en-GB"),
        );
        assert_eq!(
            decision,
            Decision::Install {
                url: "https://host/addon.xpi?src=t-d1".to_string(),
                hash: "h1".to_string(),
            }
        );
    }

    #[test]
    fn skip_reasons_display_as_plain_text() {
        assert_eq!(SkipReason::AlreadyDecided.to_string(), "already decided");
        assert_eq!(SkipReason::ExcludedByRandomDraw.to_string(), "excluded by random draw");
    }
}
