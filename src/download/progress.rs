//! 进度上报与 CLI 进度条管理。

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::models::MediaType;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub pages_fetched: usize,
    pub urls_found: usize,
}

pub struct ProgressReporter {
    snapshot: ProgressSnapshot,
    current: Option<MediaType>,
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Spinner goes to stderr, hidden when stderr is not a terminal.
    pub fn new(show_bar: bool) -> Self {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
            let style = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            bar.set_style(style);
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });
        Self {
            snapshot: ProgressSnapshot::default(),
            current: None,
            bar,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot
    }

    pub fn start_media_type(&mut self, media_type: MediaType) {
        self.current = Some(media_type);
        self.refresh();
    }

    pub fn inc_page(&mut self) {
        self.snapshot.pages_fetched += 1;
        self.refresh();
    }

    pub fn inc_url(&mut self) {
        self.snapshot.urls_found += 1;
        self.refresh();
    }

    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn refresh(&self) {
        let Some(bar) = self.bar.as_ref() else {
            return;
        };
        let kind = self.current.map(MediaType::as_str).unwrap_or("-");
        bar.set_message(format!(
            "{}: 已抓取 {} 页, 发现 {} 个媒体",
            kind, self.snapshot.pages_fetched, self.snapshot.urls_found
        ));
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.finish();
    }
}
