//! 抓取相关的数据模型定义。
//!
//! 包含抓取范围（AlbumScope）、媒体类型、分页游标、单页解析结果、错误类型与抓取汇总。

use reqwest::Url;
use thiserror::Error;

/// 平台域名（host 后缀，大小写敏感）。
pub const DOMAIN: &str = "tumblr.com";
/// 下载目录前缀使用的站点名。
pub const HOST: &str = "tumblr";
/// API 单页条数，offset 以此步进。
pub const PAGE_SIZE: u32 = 20;

/// Errors that cross the ripper boundary. Content anomalies never show up here.
#[derive(Debug, Error)]
pub enum RipError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// 一次抓取会话的目标，分类后不再改变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumScope {
    Subdomain { blog: String },
    Tag { blog: String, tag: String },
    Post { blog: String, post_id: String },
}

impl AlbumScope {
    pub fn blog(&self) -> &str {
        match self {
            AlbumScope::Subdomain { blog }
            | AlbumScope::Tag { blog, .. }
            | AlbumScope::Post { blog, .. } => blog,
        }
    }

    pub fn is_post(&self) -> bool {
        matches!(self, AlbumScope::Post { .. })
    }

    /// 分页所用的媒体类型序列，按顺序逐个处理。
    pub fn media_types(&self) -> &'static [MediaType] {
        match self {
            AlbumScope::Post { .. } => &[MediaType::Post],
            AlbumScope::Subdomain { .. } | AlbumScope::Tag { .. } => {
                &[MediaType::Photo, MediaType::Video]
            }
        }
    }

    /// Stable name used to namespace one session's downloads.
    pub fn grouping_id(&self) -> String {
        match self {
            AlbumScope::Subdomain { blog } => blog.clone(),
            AlbumScope::Tag { blog, tag } => format!("{}_tag_{}", blog, tag),
            AlbumScope::Post { blog, post_id } => format!("{}_post_{}", blog, post_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Photo,
    Video,
    Post,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Photo => "photo",
            MediaType::Video => "video",
            MediaType::Post => "post",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个媒体类型的分页位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    pub media_type: MediaType,
    pub offset: u32,
}

impl PaginationCursor {
    pub fn start(media_type: MediaType) -> Self {
        Self {
            media_type,
            offset: 0,
        }
    }

    pub fn advance(&mut self) {
        self.offset = self.offset.saturating_add(PAGE_SIZE);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSignal {
    Continue,
    Stop,
}

/// 单页解析结果：本页找到的媒体地址 + 是否继续翻页。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub urls: Vec<Url>,
    pub signal: PageSignal,
}

impl ExtractionOutcome {
    pub fn stop() -> Self {
        Self {
            urls: Vec::new(),
            signal: PageSignal::Stop,
        }
    }

    pub fn keep_paging(&self) -> bool {
        self.signal == PageSignal::Continue
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadReport {
    pub queued: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RipSummary {
    pub pages_fetched: usize,
    pub urls_found: usize,
    pub cancelled: bool,
    pub downloads: DownloadReport,
}
