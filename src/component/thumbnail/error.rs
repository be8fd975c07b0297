use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 縮圖產生失敗的原因；皆為可恢復錯誤，由呼叫端自行決定是否顯示圖示替代
#[derive(Debug, Error)]
pub enum ThumbError {
    #[error("無法讀取來源檔案 {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("無法建立快取資料夾 {path}: {source}")]
    CacheDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("沒有可用的縮圖工具 {path}（請安裝 ffmpeg、vipsthumbnail 或 magick）")]
    AllToolsExhausted { path: PathBuf },
}

impl ThumbError {
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::AllToolsExhausted { .. })
    }
}
