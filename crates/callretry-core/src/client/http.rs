//! Curl-backed todo client.
//!
//! One GET per call with connect and total timeouts; no retrying here.

use super::error::ClientError;
use super::TodoClient;
use crate::config::ClientConfig;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct CurlTodoClient {
    base_url: Url,
    connect_timeout: Duration,
    timeout: Duration,
}

impl CurlTodoClient {
    pub fn new(mut base_url: Url) -> Self {
        // Url::join replaces the last segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(cfg: &ClientConfig) -> anyhow::Result<Self> {
        Ok(Self::new(cfg.base_url()?).with_timeouts(cfg.connect_timeout(), cfg.timeout()))
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn todo_url(&self, id: u64) -> Result<Url, ClientError> {
        self.base_url
            .join(&format!("todos/{id}"))
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))
    }

    fn get_json(&self, url: &Url) -> Result<serde_json::Value, ClientError> {
        let mut body = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        let mut list = curl::easy::List::new();
        list.append("Accept: application/json")?;
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        if !(200..300).contains(&status) {
            return Err(ClientError::Http {
                status,
                url: url.to_string(),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

impl TodoClient for CurlTodoClient {
    fn todo(&self, id: u64) -> Result<serde_json::Value, ClientError> {
        let url = self.todo_url(id)?;
        tracing::debug!(%url, "GET todo");
        self.get_json(&url)
    }
}
