use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 可串接的取消旗標
///
/// 子 token 會觀察所有上層旗標，但取消子 token 不會影響上層。
#[derive(Debug, Clone)]
pub struct CancelToken {
    flags: Vec<Arc<AtomicBool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self {
            flags: vec![Arc::new(AtomicBool::new(false))],
        }
    }

    /// 以 Ctrl-C 旗標作為根
    #[must_use]
    pub fn from_signal(signal: Arc<AtomicBool>) -> Self {
        Self {
            flags: vec![signal],
        }
    }

    #[must_use]
    pub fn child(&self) -> Self {
        let mut flags = self.flags.clone();
        flags.push(Arc::new(AtomicBool::new(false)));
        Self { flags }
    }

    pub fn cancel(&self) {
        if let Some(own) = self.flags.last() {
            own.store(true, Ordering::SeqCst);
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flags.iter().any(|flag| flag.load(Ordering::SeqCst))
    }
}
