use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size: u64,
}

/// 遞迴掃描目錄下所有檔案，依路徑排序
///
/// 傳入單一檔案時只回傳該檔案。
#[must_use]
pub fn scan_all_files(path: &Path) -> Vec<FileInfo> {
    WalkDir::new(path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            Some(FileInfo {
                path: entry.into_path(),
                size: metadata.len(),
            })
        })
        .collect()
}
