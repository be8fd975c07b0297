use anyhow::{Result, bail};
use std::io;
use std::path::Path;

pub fn validate_path_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    Ok(())
}

/// 建立資料夾（已存在則略過）；保留原始 `io::Error` 供呼叫端分類
pub fn ensure_directory_exists(path: &Path) -> io::Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
