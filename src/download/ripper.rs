//! 翻页抓取主流程。
//!
//! 对每个媒体类型依次执行：拼接请求 → 拉取页面 → 解析 → 投递媒体地址 → 间隔等待 → offset += 20，
//! 直到解析结果要求停止。传输错误直接终止整个抓取，但返回前仍会等待已投递的下载完成。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::media_pool::MediaSink;
use super::models::{AlbumScope, MediaType, PaginationCursor, RipError, RipSummary};
use super::progress::ProgressReporter;
use crate::base_system::context::Config;
use crate::network_parser::api_url::{ApiKey, api_request_url};
use crate::network_parser::network::PageFetcher;
use crate::post_parser::parser::PostParser;

/// Inter-page wait. Returns `false` when the wait was interrupted.
pub trait Sleeper {
    fn sleep(&self, duration: Duration, cancel: &AtomicBool) -> bool;
}

/// Sleeps in short slices so Ctrl-C is noticed quickly.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration, cancel: &AtomicBool) -> bool {
        const SLICE: Duration = Duration::from_millis(50);
        let deadline = Instant::now() + duration;
        loop {
            if cancel.load(Ordering::Relaxed) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(SLICE.min(deadline - now));
        }
    }
}

#[derive(Debug, Clone)]
pub struct RipperOptions {
    pub api_root: String,
    pub page_delay: Duration,
}

impl From<&Config> for RipperOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            api_root: cfg.api_root.clone(),
            page_delay: Duration::from_millis(cfg.page_delay_ms),
        }
    }
}

pub struct TumblrRipper<F, S> {
    fetcher: F,
    sleeper: S,
    api_key: ApiKey,
    options: RipperOptions,
    cancel: Arc<AtomicBool>,
}

impl<F: PageFetcher, S: Sleeper> TumblrRipper<F, S> {
    /// Fails with a configuration error when no API key is available.
    pub fn from_config(
        cfg: &Config,
        fetcher: F,
        sleeper: S,
        cancel: Arc<AtomicBool>,
    ) -> Result<Self, RipError> {
        let api_key = ApiKey::from_config(cfg)?;
        Ok(Self::new(
            api_key,
            RipperOptions::from(cfg),
            fetcher,
            sleeper,
            cancel,
        ))
    }

    pub fn new(
        api_key: ApiKey,
        options: RipperOptions,
        fetcher: F,
        sleeper: S,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            fetcher,
            sleeper,
            api_key,
            options,
            cancel,
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Run the whole scrape. Downloads are joined before returning, on success and on error.
    pub fn rip(
        &self,
        scope: &AlbumScope,
        sink: &mut dyn MediaSink,
        progress: &mut ProgressReporter,
    ) -> Result<RipSummary, RipError> {
        info!("开始抓取 {} ({})", scope.blog(), scope.grouping_id());

        let mut outcome = Ok(());
        for &media_type in scope.media_types() {
            if self.cancelled() {
                info!("已取消，跳过媒体类型 {}", media_type);
                break;
            }
            progress.start_media_type(media_type);
            if let Err(e) = self.rip_media_type(scope, media_type, sink, progress) {
                outcome = Err(e);
                break;
            }
        }

        info!("等待下载线程结束...");
        let downloads = sink.wait_for_completion();
        progress.finish();
        outcome?;

        let snapshot = progress.snapshot();
        Ok(RipSummary {
            pages_fetched: snapshot.pages_fetched,
            urls_found: snapshot.urls_found,
            cancelled: self.cancelled(),
            downloads,
        })
    }

    fn rip_media_type(
        &self,
        scope: &AlbumScope,
        media_type: MediaType,
        sink: &mut dyn MediaSink,
        progress: &mut ProgressReporter,
    ) -> Result<(), RipError> {
        let mut cursor = PaginationCursor::start(media_type);
        loop {
            let target = api_request_url(&self.options.api_root, scope, cursor, &self.api_key);
            info!("   Retrieving {}", self.api_key.mask(&target));

            let body = self.fetcher.fetch_page(&target)?;
            progress.inc_page();

            let page = PostParser::extract(&body, scope.is_post());
            let keep_paging = page.keep_paging();
            for url in page.urls {
                progress.inc_url();
                sink.add_url(url);
            }

            if !keep_paging {
                return Ok(());
            }

            if !self.sleeper.sleep(self.options.page_delay, &self.cancel) {
                warn!("等待下一页时被中断，停止翻页");
                return Ok(());
            }
            cursor.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_system::album_url::classify;
    use crate::download::models::DownloadReport;
    use reqwest::Url;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};

    const ROOT: &str = "http://api.test/v2";
    const EMPTY: &str = r#"{"response":{"posts":[]}}"#;

    /// Serves scripted bodies; unknown targets get an empty page.
    #[derive(Default)]
    struct ScriptedFetcher {
        pages: HashMap<String, VecDeque<Result<String, String>>>,
        requests: RefCell<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn page(mut self, target: &str, body: &str) -> Self {
            self.pages
                .entry(target.to_string())
                .or_default()
                .push_back(Ok(body.to_string()));
            self
        }

        fn fail(mut self, target: &str) -> Self {
            self.pages
                .entry(target.to_string())
                .or_default()
                .push_back(Err("connection reset".to_string()));
            self
        }
    }

    impl PageFetcher for &ScriptedFetcher {
        fn fetch_page(&self, target: &str) -> Result<String, RipError> {
            self.requests.borrow_mut().push(target.to_string());
            let next = self
                .pages
                .get(target)
                .and_then(|q| q.front().cloned())
                .unwrap_or_else(|| Ok(EMPTY.to_string()));
            next.map_err(RipError::Transport)
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        calls: RefCell<Vec<Duration>>,
        cancel_after: Option<usize>,
    }

    impl Sleeper for &RecordingSleeper {
        fn sleep(&self, duration: Duration, cancel: &AtomicBool) -> bool {
            let mut calls = self.calls.borrow_mut();
            calls.push(duration);
            if self.cancel_after == Some(calls.len()) {
                cancel.store(true, Ordering::SeqCst);
                return false;
            }
            true
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        urls: Vec<String>,
        waits: usize,
    }

    impl MediaSink for RecordingSink {
        fn add_url(&mut self, url: Url) {
            self.urls.push(url.to_string());
        }

        fn wait_for_completion(&mut self) -> DownloadReport {
            self.waits += 1;
            DownloadReport {
                queued: self.urls.len(),
                completed: self.urls.len(),
                ..DownloadReport::default()
            }
        }
    }

    fn ripper<'a>(
        fetcher: &'a ScriptedFetcher,
        sleeper: &'a RecordingSleeper,
    ) -> TumblrRipper<&'a ScriptedFetcher, &'a RecordingSleeper> {
        TumblrRipper::new(
            ApiKey::new("KEY").unwrap(),
            RipperOptions {
                api_root: ROOT.to_string(),
                page_delay: Duration::from_millis(1000),
            },
            fetcher,
            sleeper,
            Arc::new(AtomicBool::new(false)),
        )
    }

    fn photo_page(names: &[&str]) -> String {
        let photos: Vec<String> = names
            .iter()
            .map(|n| format!(r#"{{"original_size":{{"url":"http://m.tumblr.com/{n}"}}}}"#))
            .collect();
        format!(
            r#"{{"response":{{"posts":[{{"photos":[{}]}}]}}}}"#,
            photos.join(",")
        )
    }

    fn blog_target(media: &str, offset: u32, tag: Option<&str>) -> String {
        let mut t = format!(
            "{ROOT}/blog/example.tumblr.com/posts/{media}?api_key=KEY&offset={offset}"
        );
        if let Some(tag) = tag {
            t.push_str("&tag=");
            t.push_str(tag);
        }
        t
    }

    #[test]
    fn tag_scope_empty_photo_page_moves_to_video() {
        let scope = classify("http://example.tumblr.com/tagged/art-cats").unwrap();
        assert_eq!(scope.grouping_id(), "example_tag_art+cats");

        let fetcher = ScriptedFetcher::default();
        let sleeper = RecordingSleeper::default();
        let mut sink = RecordingSink::default();
        let summary = ripper(&fetcher, &sleeper)
            .rip(&scope, &mut sink, &mut ProgressReporter::new(false))
            .unwrap();

        assert_eq!(
            *fetcher.requests.borrow(),
            vec![
                blog_target("photo", 0, Some("art+cats")),
                blog_target("video", 0, Some("art+cats")),
            ]
        );
        assert!(sleeper.calls.borrow().is_empty());
        assert_eq!(summary.pages_fetched, 2);
        assert_eq!(summary.urls_found, 0);
        assert_eq!(sink.waits, 1);
    }

    #[test]
    fn offsets_advance_by_twenty_until_stop() {
        let scope = classify("http://example.tumblr.com/").unwrap();
        let fetcher = ScriptedFetcher::default()
            .page(&blog_target("photo", 0, None), &photo_page(&["1.jpg", "2.jpg"]))
            .page(&blog_target("photo", 20, None), &photo_page(&["3.jpg"]))
            .page(&blog_target("video", 0, None), r#"{"response":{"posts":[{"video_url":"http://vt.tumblr.com/v.mp4"}]}}"#);
        let sleeper = RecordingSleeper::default();
        let mut sink = RecordingSink::default();

        let summary = ripper(&fetcher, &sleeper)
            .rip(&scope, &mut sink, &mut ProgressReporter::new(false))
            .unwrap();

        assert_eq!(
            *fetcher.requests.borrow(),
            vec![
                blog_target("photo", 0, None),
                blog_target("photo", 20, None),
                blog_target("photo", 40, None),
                blog_target("video", 0, None),
                blog_target("video", 20, None),
            ]
        );
        assert_eq!(
            sink.urls,
            vec![
                "http://m.tumblr.com/1.jpg",
                "http://m.tumblr.com/2.jpg",
                "http://m.tumblr.com/3.jpg",
                "http://vt.tumblr.com/v.mp4",
            ]
        );
        // one delay per continue signal
        assert_eq!(sleeper.calls.borrow().len(), 3);
        assert!(
            sleeper
                .calls
                .borrow()
                .iter()
                .all(|d| *d == Duration::from_millis(1000))
        );
        assert_eq!(summary.pages_fetched, 5);
        assert_eq!(summary.urls_found, 4);
        assert_eq!(summary.downloads.completed, 4);
        assert!(!summary.cancelled);
    }

    #[test]
    fn post_scope_issues_exactly_one_request() {
        let scope = classify("http://example.tumblr.com/post/987654321").unwrap();
        assert_eq!(
            scope,
            AlbumScope::Post {
                blog: "example".into(),
                post_id: "987654321".into(),
            }
        );
        let target = format!("{ROOT}/blog/example.tumblr.com/posts?id=987654321&api_key=KEY");
        let fetcher = ScriptedFetcher::default().page(
            &target,
            r#"{"response":{"posts":[{"video_url":"http://vt.tumblr.com/clip.mp4"}]}}"#,
        );
        let sleeper = RecordingSleeper::default();
        let mut sink = RecordingSink::default();

        ripper(&fetcher, &sleeper)
            .rip(&scope, &mut sink, &mut ProgressReporter::new(false))
            .unwrap();

        assert_eq!(*fetcher.requests.borrow(), vec![target]);
        assert_eq!(sink.urls, vec!["http://vt.tumblr.com/clip.mp4"]);
        assert!(sleeper.calls.borrow().is_empty());
    }

    #[test]
    fn invalid_response_stops_media_type_without_error() {
        let scope = classify("http://example.tumblr.com").unwrap();
        let fetcher = ScriptedFetcher::default()
            .page(&blog_target("photo", 0, None), "<html>rate limited</html>")
            .page(&blog_target("video", 0, None), r#"{"meta":{}}"#);
        let sleeper = RecordingSleeper::default();
        let mut sink = RecordingSink::default();

        let summary = ripper(&fetcher, &sleeper)
            .rip(&scope, &mut sink, &mut ProgressReporter::new(false))
            .unwrap();
        assert_eq!(fetcher.requests.borrow().len(), 2);
        assert_eq!(summary.urls_found, 0);
    }

    #[test]
    fn transport_error_is_fatal_but_downloads_are_joined() {
        let scope = classify("http://example.tumblr.com").unwrap();
        let fetcher = ScriptedFetcher::default()
            .page(&blog_target("photo", 0, None), &photo_page(&["1.jpg"]))
            .fail(&blog_target("photo", 20, None));
        let sleeper = RecordingSleeper::default();
        let mut sink = RecordingSink::default();

        let err = ripper(&fetcher, &sleeper)
            .rip(&scope, &mut sink, &mut ProgressReporter::new(false))
            .unwrap_err();

        assert!(matches!(err, RipError::Transport(_)));
        // no retry, video never requested
        assert_eq!(fetcher.requests.borrow().len(), 2);
        assert_eq!(sink.urls, vec!["http://m.tumblr.com/1.jpg"]);
        assert_eq!(sink.waits, 1);
    }

    #[test]
    fn interrupted_delay_stops_pagination_gracefully() {
        let scope = classify("http://example.tumblr.com").unwrap();
        let fetcher = ScriptedFetcher::default()
            .page(&blog_target("photo", 0, None), &photo_page(&["1.jpg"]));
        let sleeper = RecordingSleeper {
            cancel_after: Some(1),
            ..RecordingSleeper::default()
        };
        let mut sink = RecordingSink::default();

        let summary = ripper(&fetcher, &sleeper)
            .rip(&scope, &mut sink, &mut ProgressReporter::new(false))
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(*fetcher.requests.borrow(), vec![blog_target("photo", 0, None)]);
        assert_eq!(sink.urls, vec!["http://m.tumblr.com/1.jpg"]);
        assert_eq!(sink.waits, 1);
    }

    #[test]
    fn missing_api_key_fails_before_any_request() {
        let fetcher = ScriptedFetcher::default();
        let sleeper = RecordingSleeper::default();
        let result = TumblrRipper::from_config(
            &Config::default(),
            &fetcher,
            &sleeper,
            Arc::new(AtomicBool::new(false)),
        );
        // an exported TUMBLR_AUTH would legitimately satisfy the lookup
        if std::env::var(crate::network_parser::api_url::API_KEY_ENV).is_err() {
            assert!(matches!(result, Err(RipError::Configuration(_))));
        }
        assert!(fetcher.requests.borrow().is_empty());
    }

    #[test]
    fn thread_sleeper_returns_early_when_cancelled() {
        let cancel = AtomicBool::new(true);
        let start = Instant::now();
        assert!(!ThreadSleeper.sleep(Duration::from_secs(5), &cancel));
        assert!(start.elapsed() < Duration::from_secs(1));

        let cancel = AtomicBool::new(false);
        assert!(ThreadSleeper.sleep(Duration::from_millis(10), &cancel));
    }
}
