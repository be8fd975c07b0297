//! 縮圖快取與產生
//!
//! 快取以 `sha1(絕對路徑|尺寸|mtime|大小|版本)` 命名，內容不變就不會重新產生。
//! 背景工作池負責去重與重繪通知，呼叫端永遠不會被外部工具阻塞。

mod error;
mod fingerprint;
mod service;
mod tool_chain;
mod worker_pool;

pub use error::ThumbError;
pub use fingerprint::{
    CACHE_VERSION, DEFAULT_BOX_SIZE, SourceStamp, TargetBox, cache_entry_path, fingerprint,
};
pub use service::{ThumbnailService, generate, generate_rect};
pub use tool_chain::{DEFAULT_SEEK_SECONDS, Strategy, ToolChain, seek_offset};
pub use worker_pool::{Generator, PoolConfig, ThumbKey, ThumbnailPool};
