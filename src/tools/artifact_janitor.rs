use log::{debug, info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 清理結果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    /// 無法刪除、需要手動處理的路徑
    pub not_deleted: Vec<PathBuf>,
}

impl CleanupReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.not_deleted.is_empty()
    }

    fn merge(&mut self, other: Self) {
        self.removed.extend(other.removed);
        self.not_deleted.extend(other.not_deleted);
    }
}

/// 盡力刪除所有檔案，失敗只記錄不中斷
///
/// 已不存在的檔案視為已清理。
pub fn cleanup(paths: &[PathBuf]) -> CleanupReport {
    let mut report = CleanupReport::default();

    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("已刪除中間檔: {}", path.display());
                report.removed.push(path.clone());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("中間檔不存在，略過: {}", path.display());
            }
            Err(e) => {
                warn!("刪除檔案失敗 {}: {e}", path.display());
                report.not_deleted.push(path.clone());
            }
        }
    }

    report
}

/// 刪除空的工作資料夾；仍有其他檔案時保留並回報
pub fn cleanup_directory(directory: &Path) -> CleanupReport {
    let mut report = CleanupReport::default();

    match fs::remove_dir(directory) {
        Ok(()) => {
            debug!("已刪除工作資料夾: {}", directory.display());
            report.removed.push(directory.to_path_buf());
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            warn!("刪除資料夾失敗 {}: {e}", directory.display());
            report.not_deleted.push(directory.to_path_buf());
        }
    }

    report
}

/// 記錄一次執行中產生（或即將產生）的所有中間檔
///
/// 路徑在呼叫轉檔前就登記，失敗時殘留的部分輸出也能被清除。
#[derive(Debug, Default)]
pub struct ArtifactLedger {
    files: Vec<PathBuf>,
    directories: Vec<PathBuf>,
}

impl ArtifactLedger {
    pub fn track_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.files.contains(&path) {
            self.files.push(path);
        }
    }

    pub fn track_files<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.track_file(path);
        }
    }

    pub fn track_directory(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.directories.contains(&path) {
            self.directories.push(path);
        }
    }

    fn len(&self) -> usize {
        self.files.len() + self.directories.len()
    }

    /// 先刪檔案，再由內而外刪資料夾
    pub fn cleanup(self) -> CleanupReport {
        debug!("開始清理 {} 個已登記的路徑", self.len());
        let mut report = cleanup(&self.files);
        for directory in self.directories.iter().rev() {
            report.merge(cleanup_directory(directory));
        }

        info!(
            "清理完成: 刪除 {} 項，無法刪除 {} 項",
            report.removed.len(),
            report.not_deleted.len()
        );
        report
    }
}
