use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 所有取消信號的根，執行中的 ffmpeg 會被終止，中間檔仍會清理
#[must_use]
pub fn setup_shutdown_signal() -> Arc<AtomicBool> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\n收到中斷信號，正在終止轉檔並清理中間檔...");
    })
    .expect("無法設定 Ctrl-C 處理器");

    shutdown_signal
}
