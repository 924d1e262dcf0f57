//! 媒体并发下载工作池。
//!
//! 翻页线程发现一个地址就立即投递，工作线程负责下载落盘；`wait_for_completion` 关闭队列并 join 全部线程。

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel as channel;
use reqwest::Url;
use tracing::{debug, warn};

use super::models::DownloadReport;
use super::paths::media_file_name;
use crate::third_party::media_fetch::MediaSource;

/// Receiver of discovered media URLs.
pub trait MediaSink {
    fn add_url(&mut self, url: Url);
    /// Blocks until every accepted URL has been handled.
    fn wait_for_completion(&mut self) -> DownloadReport;
}

#[derive(Debug, Clone, Copy)]
enum MediaEvent {
    Completed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone)]
pub struct MediaPoolOptions {
    pub folder: PathBuf,
    pub workers: usize,
    pub allow_overwrite: bool,
}

pub struct MediaPool {
    tx: Option<channel::Sender<Url>>,
    rx_evt: channel::Receiver<MediaEvent>,
    handles: Vec<JoinHandle<()>>,
    seen: HashSet<String>,
    report: DownloadReport,
}

impl MediaPool {
    pub fn new(options: MediaPoolOptions, source: Arc<dyn MediaSource>) -> io::Result<Self> {
        fs::create_dir_all(&options.folder)?;

        let workers = options.workers.clamp(1, 16);
        let (tx, rx) = channel::unbounded::<Url>();
        let (tx_evt, rx_evt) = channel::unbounded::<MediaEvent>();
        let folder = Arc::new(options.folder);

        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let rx = rx.clone();
            let tx_evt = tx_evt.clone();
            let source = Arc::clone(&source);
            let folder = Arc::clone(&folder);
            let allow_overwrite = options.allow_overwrite;

            let handle = std::thread::Builder::new()
                .name(format!("media-{i}"))
                .spawn(move || {
                    for url in rx.iter() {
                        let evt = download_one(source.as_ref(), &folder, allow_overwrite, &url);
                        let _ = tx_evt.send(evt);
                    }
                })?;
            handles.push(handle);
        }

        Ok(Self {
            tx: Some(tx),
            rx_evt,
            handles,
            seen: HashSet::new(),
            report: DownloadReport::default(),
        })
    }

    fn drain_events(&mut self) {
        for evt in self.rx_evt.try_iter() {
            match evt {
                MediaEvent::Completed => self.report.completed += 1,
                MediaEvent::Skipped => self.report.skipped += 1,
                MediaEvent::Failed => self.report.failed += 1,
            }
        }
    }
}

impl MediaSink for MediaPool {
    fn add_url(&mut self, url: Url) {
        let Some(tx) = &self.tx else {
            warn!("下载队列已关闭，忽略: {}", url);
            return;
        };
        if !self.seen.insert(url.as_str().to_string()) {
            debug!("重复地址，跳过: {}", url);
            return;
        }
        if tx.send(url).is_ok() {
            self.report.queued += 1;
        }
    }

    fn wait_for_completion(&mut self) -> DownloadReport {
        self.tx.take();
        for h in self.handles.drain(..) {
            let _ = h.join();
        }
        self.drain_events();
        self.report
    }
}

impl Drop for MediaPool {
    fn drop(&mut self) {
        self.tx.take();
        for h in self.handles.drain(..) {
            let _ = h.join();
        }
    }
}

fn download_one(
    source: &dyn MediaSource,
    folder: &Path,
    allow_overwrite: bool,
    url: &Url,
) -> MediaEvent {
    let dest = folder.join(media_file_name(url));
    if dest.exists() && !allow_overwrite {
        debug!("文件已存在，跳过: {}", dest.display());
        return MediaEvent::Skipped;
    }

    let bytes = match source.fetch(url.as_str()) {
        Ok(b) => b,
        Err(e) => {
            warn!("下载失败 {}: {}", url, e);
            return MediaEvent::Failed;
        }
    };

    match write_atomic(&dest, &bytes) {
        Ok(()) => {
            debug!("已保存 {}", dest.display());
            MediaEvent::Completed
        }
        Err(e) => {
            warn!("写入文件失败 {}: {}", dest.display(), e);
            MediaEvent::Failed
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension(format!(
        "{}part",
        path.extension()
            .and_then(|s| s.to_str())
            .map(|s| format!("{s}."))
            .unwrap_or_default()
    ));
    fs::write(&tmp, bytes)?;
    let _ = fs::remove_file(path);
    fs::rename(tmp, path)
}

/// Dry-run sink: prints each unique URL instead of downloading it.
#[derive(Debug, Default)]
pub struct PrintSink {
    seen: HashSet<String>,
    report: DownloadReport,
}

impl MediaSink for PrintSink {
    fn add_url(&mut self, url: Url) {
        if self.seen.insert(url.as_str().to_string()) {
            println!("{}", url);
            self.report.queued += 1;
        }
    }

    fn wait_for_completion(&mut self) -> DownloadReport {
        self.report
    }
}
