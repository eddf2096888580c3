use super::path_validator::validate_directory_exists;
use crate::error::SynthesisError;
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
const GIF_EXTENSION: &str = "gif";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Gif,
    Other,
}

impl MediaKind {
    /// 依副檔名分類（不分大小寫）
    #[must_use]
    pub fn classify(path: &Path) -> Self {
        let Some(ext) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
        else {
            return Self::Other;
        };

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if ext == GIF_EXTENSION {
            Self::Gif
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub kind: MediaKind,
}

/// 來源資料夾的媒體清單，各類別皆依檔名排序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaInventory {
    pub images: Vec<PathBuf>,
    pub gifs: Vec<PathBuf>,
    pub others: Vec<PathBuf>,
}

impl MediaInventory {
    #[must_use]
    pub fn assets(&self) -> Vec<MediaAsset> {
        let tag = |paths: &[PathBuf], kind: MediaKind| {
            paths
                .iter()
                .map(move |path| MediaAsset {
                    path: path.clone(),
                    kind,
                })
                .collect::<Vec<_>>()
        };

        let mut assets = tag(&self.images, MediaKind::Image);
        assets.extend(tag(&self.gifs, MediaKind::Gif));
        assets.extend(tag(&self.others, MediaKind::Other));
        assets
    }
}

/// 掃描資料夾第一層的檔案（不遞迴）
///
/// 找不到符合的檔案時回傳空清單，由呼叫端決定是否視為錯誤。
pub fn scan_media(directory: &Path) -> Result<MediaInventory, SynthesisError> {
    validate_directory_exists(directory)?;

    let mut inventory = MediaInventory::default();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(directory).to_path_buf();
            SynthesisError::file_system(path, e.into())
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        match MediaKind::classify(&path) {
            MediaKind::Image => inventory.images.push(path),
            MediaKind::Gif => inventory.gifs.push(path),
            MediaKind::Other => inventory.others.push(path),
        }
    }

    debug!(
        "掃描 {}: 圖片 {} 張, GIF {} 個, 其他 {} 個",
        directory.display(),
        inventory.images.len(),
        inventory.gifs.len(),
        inventory.others.len()
    );

    Ok(inventory)
}
