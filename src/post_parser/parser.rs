//! 单页 API 响应解析：提取图片/视频地址并给出是否继续翻页。

use reqwest::Url;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::download::models::{ExtractionOutcome, PageSignal};

pub struct PostParser;

impl PostParser {
    /// Never fails: malformed content degrades into a stop signal or a skipped item.
    pub fn extract(raw: &str, scope_is_post: bool) -> ExtractionOutcome {
        let json: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                error!("tumblr 返回的 JSON 无法解析: {} | body: {}", e, preview(raw));
                return ExtractionOutcome::stop();
            }
        };

        let Some(response) = json.get("response") else {
            error!("tumblr 返回的 JSON 缺少 response 字段: {}", preview(raw));
            return ExtractionOutcome::stop();
        };

        let Some(posts) = response.get("posts").and_then(Value::as_array) else {
            error!("tumblr 返回的 response 缺少 posts 数组: {}", preview(raw));
            return ExtractionOutcome::stop();
        };

        if posts.is_empty() {
            info!("返回 0 条 post，停止翻页");
            return ExtractionOutcome::stop();
        }

        let mut urls = Vec::new();
        for post in posts {
            if let Some(photos) = post.get("photos") {
                collect_photos(photos, &mut urls);
            } else if let Some(video) = post.get("video_url") {
                match parse_media_url(video) {
                    Some(url) => urls.push(url),
                    None => {
                        error!("解析视频地址失败，跳过本页剩余内容: {}", post);
                        // single post scope must still terminate after one page
                        let signal = if scope_is_post {
                            PageSignal::Stop
                        } else {
                            PageSignal::Continue
                        };
                        return ExtractionOutcome { urls, signal };
                    }
                }
            }

            if scope_is_post {
                return ExtractionOutcome {
                    urls,
                    signal: PageSignal::Stop,
                };
            }
        }

        ExtractionOutcome {
            urls,
            signal: PageSignal::Continue,
        }
    }
}

fn collect_photos(photos: &Value, out: &mut Vec<Url>) {
    let Some(photos) = photos.as_array() else {
        warn!("photos 字段不是数组，已跳过: {}", photos);
        return;
    };
    for photo in photos {
        let url = photo
            .get("original_size")
            .and_then(|s| s.get("url"))
            .and_then(parse_media_url);
        match url {
            Some(url) => out.push(url),
            None => warn!("解析图片失败，已跳过: {}", photo),
        }
    }
}

fn parse_media_url(value: &Value) -> Option<Url> {
    Url::parse(value.as_str()?.trim()).ok()
}

fn preview(raw: &str) -> String {
    const MAX: usize = 300;
    if raw.len() <= MAX {
        return raw.to_string();
    }
    let mut end = MAX;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &raw[..end])
}
