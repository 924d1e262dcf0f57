use anyhow::{Result, anyhow};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, CONNECTION, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

/// Source of media bytes for the download pool.
pub trait MediaSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct MediaFetcher {
    client: Client,
}

impl MediaFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        // reqwest in this project is built without default features (no gzip decoder).
        // Request identity encoding so the returned bytes are directly usable.
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).unwrap_or(HeaderValue::from_static("Mozilla/5.0")),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl MediaSource for MediaFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if url.trim().is_empty() {
            return Err(anyhow!("empty media url"));
        }
        let resp = self.client.get(url).send()?;
        let resp = resp.error_for_status()?;
        let bytes = resp.bytes()?;
        Ok(bytes.to_vec())
    }
}
