use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, CONNECTION, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::debug;

use crate::base_system::context::Config;
use crate::download::models::RipError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36";

/// One HTTP round trip per page. Any failure is a transport error.
pub trait PageFetcher {
    fn fetch_page(&self, target: &str) -> Result<String, RipError>;
}

#[derive(Debug, Clone)]
pub struct TumblrWebConfig {
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for TumblrWebConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&Config> for TumblrWebConfig {
    fn from(cfg: &Config) -> Self {
        let user_agent = if cfg.user_agent.trim().is_empty() {
            DEFAULT_USER_AGENT.to_string()
        } else {
            cfg.user_agent.trim().to_string()
        };
        Self {
            request_timeout: Duration::from_secs(cfg.request_timeout.max(1)),
            user_agent,
        }
    }
}

pub struct TumblrWebNetwork {
    client: Client,
}

impl TumblrWebNetwork {
    pub fn new(config: TumblrWebConfig) -> Result<Self, RipError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        default_headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        // API 有时返回 text/html 包装的 JSON，这里不限定 content-type
        default_headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or(HeaderValue::from_static("Mozilla/5.0")),
        );

        let client = Client::builder()
            .default_headers(default_headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RipError::Transport(format!("http client init failed: {e}")))?;

        Ok(Self { client })
    }
}

impl PageFetcher for TumblrWebNetwork {
    fn fetch_page(&self, target: &str) -> Result<String, RipError> {
        let resp = self
            .client
            .get(target)
            .send()
            .map_err(|e| RipError::Transport(e.without_url().to_string()))?;

        debug!("页面响应状态: {}", resp.status().as_u16());

        let resp = resp
            .error_for_status()
            .map_err(|e| RipError::Transport(e.without_url().to_string()))?;

        resp.text()
            .map_err(|e| RipError::Transport(e.without_url().to_string()))
    }
}
