//! Ctrl-C 处理：第一次请求停止翻页，第二次直接退出。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

pub fn install_cancel_handler() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let result = ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            eprintln!("再次收到中断信号，立即退出");
            std::process::exit(130);
        }
        eprintln!("收到中断信号，等待当前页面与下载完成后停止（再按一次 Ctrl-C 强制退出）");
    });
    if let Err(e) = result {
        warn!("无法注册 Ctrl-C 处理器: {}", e);
    }
    cancel
}
