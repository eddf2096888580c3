use super::cancellation::CancelToken;
use crate::error::TranscodeError;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// 固定大小的工作執行緒池
///
/// 每次 [`WorkerPool::run_all`] 都是一個階段：所有工作完成後才返回，
/// 任一工作失敗即取消同階段尚未開始的工作。
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|index| format!("synthesis-worker-{index}"))
            .build()?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// 結果順序與輸入相同
    pub fn run_all<T, R, F>(
        &self,
        items: &[T],
        cancel: &CancelToken,
        task: F,
    ) -> Vec<Result<R, TranscodeError>>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T, &CancelToken) -> Result<R, TranscodeError> + Sync,
    {
        let phase = cancel.child();

        self.pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(index, item)| {
                    if phase.is_cancelled() {
                        return Err(TranscodeError::Cancelled);
                    }
                    let result = task(index, item, &phase);
                    if result.is_err() {
                        phase.cancel();
                    }
                    result
                })
                .collect()
        })
    }
}

/// 取出成功的結果與其索引，以及最先發生的實際錯誤
///
/// 由取消造成的錯誤只有在沒有其他錯誤時才會回報。
pub fn partition_results<R>(
    results: Vec<Result<R, TranscodeError>>,
) -> (Vec<(usize, R)>, Option<(usize, TranscodeError)>) {
    let mut succeeded = Vec::new();
    let mut cancelled: Option<(usize, TranscodeError)> = None;
    let mut failure: Option<(usize, TranscodeError)> = None;

    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(value) => succeeded.push((index, value)),
            Err(e) if e.is_cancelled() => {
                cancelled.get_or_insert((index, e));
            }
            Err(e) => {
                failure.get_or_insert((index, e));
            }
        }
    }

    (succeeded, failure.or(cancelled))
}

pub fn first_failure<R>(
    results: Vec<Result<R, TranscodeError>>,
) -> Result<Vec<R>, (usize, TranscodeError)> {
    match partition_results(results) {
        (_, Some(failure)) => Err(failure),
        (succeeded, None) => Ok(succeeded.into_iter().map(|(_, value)| value).collect()),
    }
}
