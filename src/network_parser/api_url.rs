//! Content API 请求地址拼接（纯字符串，不发请求）。

use std::fmt;

use crate::base_system::context::Config;
use crate::download::models::{AlbumScope, PaginationCursor, RipError};

pub const API_KEY_ENV: &str = "TUMBLR_AUTH";

/// API 认证 key。Debug 输出时打码。
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, RipError> {
        let key = key.into();
        let key = key.trim();
        if key.is_empty() {
            return Err(RipError::Configuration(
                "Could not find tumblr authentication key in configuration".to_string(),
            ));
        }
        Ok(Self(key.to_string()))
    }

    /// Environment value wins over the config file when it is non-empty.
    pub fn resolve(configured: &str, env_value: Option<String>) -> Result<Self, RipError> {
        match env_value.filter(|v| !v.trim().is_empty()) {
            Some(v) => Self::new(v),
            None => Self::new(configured),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, RipError> {
        Self::resolve(&cfg.tumblr_auth, std::env::var(API_KEY_ENV).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 日志里隐藏 key。
    pub fn mask(&self, text: &str) -> String {
        text.replace(&self.0, "***")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

fn normalize_root(api_root: &str) -> &str {
    api_root.trim().trim_end_matches('/')
}

/// Build the request target for one page.
///
/// Post scope addresses a single post by id; cursor offset and media type are not used.
pub fn api_request_url(
    api_root: &str,
    scope: &AlbumScope,
    cursor: PaginationCursor,
    api_key: &ApiKey,
) -> String {
    let root = normalize_root(api_root);
    match scope {
        AlbumScope::Post { blog, post_id } => format!(
            "{}/blog/{}.tumblr.com/posts?id={}&api_key={}",
            root,
            blog,
            post_id,
            api_key.as_str()
        ),
        AlbumScope::Subdomain { blog } | AlbumScope::Tag { blog, .. } => {
            let mut url = format!(
                "{}/blog/{}.tumblr.com/posts/{}?api_key={}&offset={}",
                root,
                blog,
                cursor.media_type.as_str(),
                api_key.as_str(),
                cursor.offset
            );
            if let AlbumScope::Tag { tag, .. } = scope {
                url.push_str("&tag=");
                url.push_str(tag);
            }
            url
        }
    }
}
