//! HttpParamsSource - HTTP GET でリモート gating params を取得する

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::ports::{FetchError, ParamsSource};

/// Default location of the hosted params document.
pub const DEFAULT_PARAMS_URL: &str = "https://people.mozilla.org/~elee/testpilot-throttler.json";

pub struct HttpParamsSource {
    url: String,
    client: reqwest::Client,
}

impl HttpParamsSource {
    /// タイムアウト付きの client を作成
    ///
    /// # Errors
    /// HTTP client を初期化できない場合
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ParamsSource for HttpParamsSource {
    async fn fetch(&self) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
