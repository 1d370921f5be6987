//! app 層のテスト用 fake（ParamsSource / Installer）

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::CandidateId;
use crate::ports::{FetchError, InstallHandle, Installer, ParamsSource};

/// 決められた応答を順に返す ParamsSource（最後の応答は繰り返す）
pub(crate) struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Value, String>>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedSource {
    pub(crate) fn ok(document: Value) -> Self {
        Self::sequence(vec![Ok(document)])
    }

    pub(crate) fn sequence(responses: Vec<Result<Value, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(20),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParamsSource for ScriptedSource {
    async fn fetch(&self) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let response = {
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.pop_front()
            } else {
                responses.front().cloned()
            }
        };
        match response {
            Some(Ok(document)) => Ok(document),
            Some(Err(message)) => Err(FetchError::Transport(message)),
            None => Err(FetchError::Transport("no scripted response".to_string())),
        }
    }
}

/// 解決・インストール開始を記録する Installer
#[derive(Default)]
pub(crate) struct RecordingInstaller {
    installed: Mutex<HashSet<CandidateId>>,
    unresolvable: bool,
    panic_on: Option<CandidateId>,
    resolutions: Mutex<Vec<(String, String, String)>>,
    started: Arc<AtomicUsize>,
}

impl RecordingInstaller {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn unresolvable() -> Self {
        Self {
            unresolvable: true,
            ..Self::default()
        }
    }

    /// `candidate` の is_installed で panic する
    pub(crate) fn panicking_on(candidate: impl Into<CandidateId>) -> Self {
        Self {
            panic_on: Some(candidate.into()),
            ..Self::default()
        }
    }

    pub(crate) fn mark_installed(&self, candidate: &CandidateId) {
        self.installed.lock().unwrap().insert(candidate.clone());
    }

    pub(crate) fn resolutions(&self) -> Vec<(String, String, String)> {
        self.resolutions.lock().unwrap().clone()
    }

    pub(crate) fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

struct RecordingHandle {
    started: Arc<AtomicUsize>,
}

impl InstallHandle for RecordingHandle {
    fn install(self: Box<Self>) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Installer for RecordingInstaller {
    async fn is_installed(&self, candidate: &CandidateId) -> bool {
        if self.panic_on.as_ref() == Some(candidate) {
            panic!("installer crashed for {candidate}");
        }
        self.installed.lock().unwrap().contains(candidate)
    }

    async fn resolve_install(
        &self,
        url: &str,
        mime_type: &str,
        expected_hash: &str,
    ) -> Option<Box<dyn InstallHandle>> {
        self.resolutions.lock().unwrap().push((
            url.to_string(),
            mime_type.to_string(),
            expected_hash.to_string(),
        ));
        if self.unresolvable {
            return None;
        }
        Some(Box::new(RecordingHandle {
            started: Arc::clone(&self.started),
        }))
    }
}
