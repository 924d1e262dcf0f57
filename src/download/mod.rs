//! 抓取流程模块入口。
//!
//! 子模块：
//! - `models`      — 数据模型（AlbumScope / PaginationCursor / ExtractionOutcome 等）
//! - `ripper`      — 翻页抓取主流程
//! - `media_pool`  — 媒体并发下载工作池
//! - `paths`       — 下载目录与文件名
//! - `progress`    — 进度上报与 CLI 进度条

pub mod media_pool;
pub mod models;
pub mod paths;
pub mod progress;
pub mod ripper;
