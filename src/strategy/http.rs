// src/strategy/http.rs
//! reqwest-backed strategy covering the direct call and every relay variant.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::headers::{self, HeaderMode, SharedRng};
use super::{Deadline, SourceStrategy};
use crate::config::StrategyDescriptor;
use crate::error::FetchError;

/// How a relay wraps the upstream body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    /// Body is the upstream JSON as-is.
    #[default]
    None,
    /// Body is `{ "contents": "<upstream body as a string>" }`.
    Contents,
}

impl Envelope {
    pub fn open(self, body: Value) -> Result<Value, FetchError> {
        match self {
            Envelope::None => Ok(body),
            Envelope::Contents => match body.get("contents") {
                Some(Value::String(inner)) => Ok(serde_json::from_str(inner)?),
                _ => Err(FetchError::ParseFailure(
                    "relay envelope missing contents".to_string(),
                )),
            },
        }
    }
}

/// Fill `{target}` / `{target_encoded}` in a URL template.
pub fn expand_url(template: &str, target: &str) -> String {
    template
        .replace("{target_encoded}", &urlencoding::encode(target))
        .replace("{target}", target)
}

/// Client shared by all strategies. Idle connections are not kept, so each
/// attempt's connection lives only as long as that attempt. Traffic goes
/// through the configured relays only; ambient proxy env vars are ignored.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .connect_timeout(Duration::from_secs(4))
        .build()
        .context("building reqwest client")
}

pub struct HttpStrategy {
    name: String,
    url: String,
    headers: HeaderMode,
    envelope: Envelope,
    timeout: Duration,
    client: Client,
    rng: SharedRng,
}

impl HttpStrategy {
    pub fn from_descriptor(
        descriptor: &StrategyDescriptor,
        target: &str,
        client: Client,
        rng: SharedRng,
    ) -> Self {
        Self {
            name: descriptor.name.clone(),
            url: expand_url(&descriptor.url, target),
            headers: descriptor.headers,
            envelope: descriptor.envelope,
            timeout: Duration::from_millis(descriptor.timeout_ms),
            client,
            rng,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    fn request_headers(&self) -> HeaderMap {
        headers::headers_for(self.headers, &self.rng)
    }
}

#[async_trait]
impl SourceStrategy for HttpStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, deadline: &Deadline) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(&self.url)
            .headers(self.request_headers())
            .timeout(deadline.remaining())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = resp.bytes().await?;
        let parsed: Value = serde_json::from_slice(&body)?;
        self.envelope.open(parsed)
    }
}
