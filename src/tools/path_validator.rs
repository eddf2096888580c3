use crate::error::{SynthesisError, ValidationError};
use std::path::{Path, PathBuf};

pub fn validate_directory_exists(path: &Path) -> Result<(), ValidationError> {
    if !path.exists() {
        return Err(ValidationError::DirectoryNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(ValidationError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

/// 建立資料夾與所有缺少的上層，回傳實際新建的路徑（由外而內）
pub fn create_missing_directories(path: &Path) -> Result<Vec<PathBuf>, SynthesisError> {
    let mut missing: Vec<PathBuf> = path
        .ancestors()
        .take_while(|ancestor| !ancestor.as_os_str().is_empty() && !ancestor.exists())
        .map(Path::to_path_buf)
        .collect();
    missing.reverse();

    if !missing.is_empty() {
        std::fs::create_dir_all(path).map_err(|e| SynthesisError::file_system(path, e))?;
    }
    Ok(missing)
}
