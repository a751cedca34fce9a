use crate::common::defs::LOCALHOST;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::ser::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::trace;

pub const READY_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// Blocking json client for the engine's control port.
/// NOTE: Requests other than `is_ready` have no timeout. A stalled engine stalls the caller.
#[derive(Debug)]
pub struct Client {
    base_url: String,
    api_url: String,
    client: reqwest::blocking::Client,
}

impl Client {
    pub fn new(port: u16) -> Result<Self> {
        Self::with_host(LOCALHOST, port)
    }

    pub fn with_host(host: &str, port: u16) -> Result<Self> {
        let host = if host == "localhost" { LOCALHOST } else { host };
        let base_url = format!("http://{host}:{port}");
        let api_url = format!("{base_url}/v1/");

        Ok(Self {
            base_url,
            api_url,
            client: reqwest::blocking::Client::builder()
                .timeout(None::<Duration>)
                .build()?,
        })
    }

    pub fn make_api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Single check used while waiting for a freshly launched engine. Unlike other requests it gives up
    /// after `READY_CHECK_TIMEOUT`, since a loading engine may accept connections without answering.
    pub fn is_ready(&self) -> bool {
        let url = self.make_api_url("");
        match self.client.get(&url).timeout(READY_CHECK_TIMEOUT).send() {
            Ok(res) => res.status().is_success(),
            Err(_) => false,
        }
    }

    pub fn http_get(&self, path: &str) -> Result<Value> {
        let url = self.make_api_url(path);
        trace!(%url, "GET");
        let res = self
            .client
            .get(&url)
            .headers(Self::construct_common_headers())
            .send()?;
        Self::into_json(&url, res)
    }

    pub fn http_post<T: Serialize>(&self, path: &str, body: &HashMap<&str, T>) -> Result<Value> {
        let url = self.make_api_url(path);
        trace!(%url, "POST");
        let res = self
            .client
            .post(&url)
            .headers(Self::construct_common_headers())
            .json(body)
            .send()?;
        Self::into_json(&url, res)
    }

    fn into_json(url: &str, res: reqwest::blocking::Response) -> Result<Value> {
        let status = res.status();
        if !status.is_success() {
            return Err(Error::Protocol(format!("{url} answered {status}")));
        }
        let text = res.text()?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn construct_common_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}
