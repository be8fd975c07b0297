use crate::config::types::{
    DEFAULT_DRAW_QUEUE_CAPACITY, DEFAULT_PROBE_TIMEOUT, DEFAULT_REPAINT_INTERVAL,
    DEFAULT_REQUEST_QUEUE_CAPACITY, DEFAULT_WORKER_COUNT, ENV_CACHE_DIR, ENV_DEBUG,
    ENV_IMAGE_TOOL, ENV_VIDEO_TOOL, MediaKind, MediaTypeTable, Settings, ToolOverrides,
};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// 編譯時嵌入的媒體類型設定（不需要外部檔案）
const MEDIA_TYPE_TABLE_JSON: &str = include_str!("../data/media_types.json");

static MEDIA_TYPES: LazyLock<MediaTypeTable> = LazyLock::new(|| {
    load_embedded_media_types().expect("Invalid embedded media type table")
});

/// 從編譯時嵌入的 JSON 載入媒體類型表
fn load_embedded_media_types() -> Result<MediaTypeTable> {
    serde_json::from_str(MEDIA_TYPE_TABLE_JSON).context("無法解析嵌入的媒體類型設定")
}

#[must_use]
pub fn media_types() -> &'static MediaTypeTable {
    &MEDIA_TYPES
}

#[must_use]
pub fn classify(path: &Path) -> MediaKind {
    media_types().classify(path)
}

impl ToolOverrides {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            video_tool: lookup(ENV_VIDEO_TOOL).filter(|v| !v.trim().is_empty()),
            image_tool: lookup(ENV_IMAGE_TOOL).filter(|v| !v.trim().is_empty()),
        }
    }
}

impl Settings {
    #[must_use]
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 以任意查詢函式組出設定，測試時不需改動行程環境變數
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let cache_dir = lookup(ENV_CACHE_DIR)
            .filter(|v| !v.is_empty())
            .map_or_else(fallback_cache_dir, PathBuf::from);

        Self {
            cache_dir,
            tools: ToolOverrides::from_lookup(&lookup),
            worker_count: DEFAULT_WORKER_COUNT,
            request_queue_capacity: DEFAULT_REQUEST_QUEUE_CAPACITY,
            draw_queue_capacity: DEFAULT_DRAW_QUEUE_CAPACITY,
            repaint_interval: DEFAULT_REPAINT_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            debug: lookup(ENV_DEBUG).is_some_and(|v| !v.is_empty()),
        }
    }

    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = cache_dir {
            self.cache_dir = dir;
        }
        self
    }
}

/// 使用者快取目錄 → $HOME/.cache → 目前資料夾
fn fallback_cache_dir() -> PathBuf {
    if let Some(dir) = dirs::cache_dir() {
        return dir.join("thumbgrid");
    }
    match dirs::home_dir() {
        Some(home) => home.join(".cache").join("thumbgrid"),
        None => PathBuf::from(".thumbgrid-cache"),
    }
}
