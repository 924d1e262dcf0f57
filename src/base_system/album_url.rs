//! 博客链接解析：判断是整站、标签页还是单篇文章。

use regex::Regex;
use reqwest::Url;
use std::sync::OnceLock;

use crate::download::models::{AlbumScope, DOMAIN, RipError};

static RE_TAGGED: OnceLock<Regex> = OnceLock::new();
static RE_POST: OnceLock<Regex> = OnceLock::new();
static RE_SUBDOMAIN: OnceLock<Regex> = OnceLock::new();

const EXPECTED_FORMAT: &str = "Expected format: http://user.tumblr.com[/tagged/tag|/post/postno]";

fn re_tagged() -> &'static Regex {
    RE_TAGGED.get_or_init(|| {
        Regex::new(r"^https?://([a-zA-Z0-9\-]+)\.tumblr\.com/tagged/([a-zA-Z0-9\-_]+).*$")
            .expect("compile RE_TAGGED")
    })
}

fn re_post() -> &'static Regex {
    RE_POST.get_or_init(|| {
        Regex::new(r"^https?://([a-zA-Z0-9\-]+)\.tumblr\.com/post/([0-9]+).*$")
            .expect("compile RE_POST")
    })
}

fn re_subdomain() -> &'static Regex {
    // host must end right after the domain: `x.tumblr.com.evil.net` is rejected
    RE_SUBDOMAIN.get_or_init(|| {
        Regex::new(r"^https?://([a-zA-Z0-9\-]+)\.tumblr\.com(?:[/?#].*)?$")
            .expect("compile RE_SUBDOMAIN")
    })
}

/// `-` 变 `+`，`_` 变 `%20`，与 API 的 tag 参数格式一致。
pub fn normalize_tag(raw: &str) -> String {
    raw.replace('-', "+").replace('_', "%20")
}

/// Classify a blog URL. Patterns are tried in order tag, post, subdomain; first match wins.
pub fn classify(url: &str) -> Result<AlbumScope, RipError> {
    let url = url.trim();

    if let Some(caps) = re_tagged().captures(url) {
        return Ok(AlbumScope::Tag {
            blog: caps[1].to_string(),
            tag: normalize_tag(&caps[2]),
        });
    }

    if let Some(caps) = re_post().captures(url) {
        return Ok(AlbumScope::Post {
            blog: caps[1].to_string(),
            post_id: caps[2].to_string(),
        });
    }

    if let Some(caps) = re_subdomain().captures(url) {
        return Ok(AlbumScope::Subdomain {
            blog: caps[1].to_string(),
        });
    }

    Err(RipError::MalformedInput(format!(
        "{} (got {})",
        EXPECTED_FORMAT, url
    )))
}

/// Quick host check before classification.
pub fn can_rip(url: &str) -> bool {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.ends_with(DOMAIN)))
        .unwrap_or(false)
}
