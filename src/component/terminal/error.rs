use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerminalError {
    /// 明確要求的後端在目前終端機不可用
    #[error("終端機不支援 {0} 圖像協定")]
    Unavailable(String),

    #[error("未知的圖像後端: {0}（可用值: auto、kitty、none）")]
    UnknownBackend(String),

    #[error("終端機 I/O 錯誤: {0}")]
    Io(#[from] io::Error),
}
