//! tumblr 媒体抓取器。
//!
//! 给定一个博客链接（整站 / 标签页 / 单篇文章），翻页调用 tumblr content API，
//! 把发现的图片与视频交给下载线程池保存到本地。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置/日志/中断处理/链接解析等基础设施
//! - `network_parser`：API 请求地址拼接与页面拉取
//! - `post_parser`：单页 JSON 解析
//! - `download`：翻页主流程、下载池、进度与路径
//! - `third_party`：媒体文件下载客户端

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info};

mod base_system;
mod download;
mod network_parser;
mod post_parser;
mod third_party;

use base_system::album_url::{can_rip, classify};
use base_system::config::load_or_create;
use base_system::context::Config;
use base_system::interrupt::install_cancel_handler;
use base_system::logging::{LogOptions, LogSystem};
use download::media_pool::{MediaPool, MediaPoolOptions, PrintSink};
use download::models::{RipError, RipSummary};
use download::paths::album_folder_path;
use download::progress::ProgressReporter;
use download::ripper::{ThreadSleeper, TumblrRipper};
use network_parser::network::{TumblrWebConfig, TumblrWebNetwork};
use third_party::media_fetch::MediaFetcher;

#[derive(Debug, Parser)]
#[command(name = "tumblr-media-ripper", version)]
#[command(about = "Download photos and videos from a tumblr blog, tag or post")]
struct Cli {
    /// 博客链接，例如 http://user.tumblr.com[/tagged/tag|/post/postno]
    url: String,

    /// 启用调试日志输出
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// 数据目录路径（用于存放 config.yml 和 logs）
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 指定配置文件路径（优先于 --data-dir）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 退出时不打包日志
    #[arg(long, default_value_t = false)]
    no_archive: bool,

    /// 只列出媒体地址，不下载
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.as_deref();
    let _log = init_logging(cli.debug, !cli.no_archive, data_dir)?;

    let config = load_or_create::<Config>(cli.config.as_deref(), data_dir)
        .context("加载配置失败")?;

    let cancel = install_cancel_handler();

    match run(&cli, &config, cancel) {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            error!("抓取失败: {e:#}");
            Err(e)
        }
    }
}

fn run(cli: &Cli, config: &Config, cancel: Arc<AtomicBool>) -> Result<RipSummary> {
    if !can_rip(&cli.url) {
        bail!(RipError::MalformedInput(format!(
            "not a tumblr.com url: {}",
            cli.url
        )));
    }
    let scope = classify(&cli.url)?;
    info!("抓取范围: {:?}（分组 {}）", scope, scope.grouping_id());

    let web_config = TumblrWebConfig::from(config);
    let user_agent = web_config.user_agent.clone();
    let network = TumblrWebNetwork::new(web_config)?;
    let ripper = TumblrRipper::from_config(config, network, ThreadSleeper, cancel)?;
    let mut progress = ProgressReporter::new(true);

    if cli.dry_run {
        let mut sink = PrintSink::default();
        return Ok(ripper.rip(&scope, &mut sink, &mut progress)?);
    }

    let folder = album_folder_path(config, &scope);
    info!("保存目录: {}", folder.display());
    let source = MediaFetcher::new(
        Duration::from_secs(config.download_timeout.max(1)),
        &user_agent,
    )?;
    let mut pool = MediaPool::new(
        MediaPoolOptions {
            folder: folder.clone(),
            workers: config.download_workers,
            allow_overwrite: config.allow_overwrite_files,
        },
        Arc::new(source),
    )
    .with_context(|| format!("无法创建下载目录 {}", folder.display()))?;

    Ok(ripper.rip(&scope, &mut pool, &mut progress)?)
}

fn print_summary(summary: &RipSummary) {
    if summary.cancelled {
        println!("已中断。");
    }
    println!(
        "共抓取 {} 页，发现 {} 个媒体（去重后 {} 个）；下载 {} 个，跳过 {} 个，失败 {} 个",
        summary.pages_fetched,
        summary.urls_found,
        summary.downloads.queued,
        summary.downloads.completed,
        summary.downloads.skipped,
        summary.downloads.failed
    );
}

fn init_logging(debug: bool, archive_on_exit: bool, base_dir: Option<&Path>) -> Result<LogSystem> {
    let opts = LogOptions {
        debug,
        use_color: true,
        archive_on_exit,
        console: true,
    };
    LogSystem::init(opts, base_dir).context("初始化日志失败")
}
