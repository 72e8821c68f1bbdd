//! Mirror-node REST boundary.
//!
//! One shared HTTP client for the whole process, and a thin typed GET helper
//! that maps HTTP 404 to "entity absent" instead of an error. Retrying is the
//! caller's business; this layer issues exactly one request per call.

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;

use crate::config::Config;

static HTTP: OnceLock<reqwest::Client> = OnceLock::new();

fn http_client() -> &'static reqwest::Client {
    HTTP.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .expect("reqwest client")
    })
}

/// Cheap-to-clone handle on one mirror-node REST endpoint.
#[derive(Clone, Debug)]
pub struct MirrorClient {
    base_url: String,
    timeout: Duration,
}

impl MirrorClient {
    pub fn new(cfg: &Config) -> Self {
        Self::with_base_url(&cfg.mirror_base_url, cfg.request_timeout_ms)
    }

    pub fn with_base_url(base_url: &str, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues a single GET against the mirror node.
    ///
    /// - 2xx resolves to `Ok(Some(parsed))`
    /// - 404 resolves to `Ok(None)` - the entity does not exist
    /// - any other status, or a transport failure, is an error
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let url = format!("{}/{}", self.base_url, path);
        log::debug!("[mirror] GET {url}");

        let response = http_client()
            .get(&url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            log::debug!("[mirror] 404 {path}");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(anyhow!("mirror node error ({status}) on {path}: {body}"));
        }

        let parsed = response.json::<T>().await?;
        Ok(Some(parsed))
    }
}
