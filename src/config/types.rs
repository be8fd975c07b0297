use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 快取資料夾覆寫
pub const ENV_CACHE_DIR: &str = "THUMBGRID_CACHE_DIR";
/// 影片縮圖工具覆寫（非 ffmpeg 的值會略過 ffmpeg）
pub const ENV_VIDEO_TOOL: &str = "THUMBGRID_VIDEO_TOOL";
/// 圖片縮圖工具覆寫（非 vipsthumbnail 的值會略過 vipsthumbnail）
pub const ENV_IMAGE_TOOL: &str = "THUMBGRID_IMAGE_TOOL";
/// 除錯日誌開關
pub const ENV_DEBUG: &str = "THUMBGRID_DEBUG";

pub const DEFAULT_WORKER_COUNT: usize = 4;
pub const DEFAULT_REQUEST_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_DRAW_QUEUE_CAPACITY: usize = 128;
pub const DEFAULT_REPAINT_INTERVAL: Duration = Duration::from_millis(16);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(75);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub const fn is_media(self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaTypeTable {
    #[serde(rename = "IMAGE_FILE")]
    pub image_file: Vec<String>,
    #[serde(rename = "VIDEO_FILE")]
    pub video_file: Vec<String>,
}

impl MediaTypeTable {
    fn extension_set(extensions: &[String]) -> HashSet<String> {
        extensions.iter().map(|ext| ext.to_lowercase()).collect()
    }

    /// 依副檔名（不分大小寫）判斷媒體類型
    #[must_use]
    pub fn classify(&self, path: &Path) -> MediaKind {
        let Some(ext) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
        else {
            return MediaKind::Other;
        };

        if Self::extension_set(&self.video_file).contains(&ext) {
            MediaKind::Video
        } else if Self::extension_set(&self.image_file).contains(&ext) {
            MediaKind::Image
        } else {
            MediaKind::Other
        }
    }
}

/// 外部工具偏好（來自環境變數）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOverrides {
    pub video_tool: Option<String>,
    pub image_tool: Option<String>,
}

impl ToolOverrides {
    /// 影片是否仍優先使用 ffmpeg
    #[must_use]
    pub fn prefers_ffmpeg(&self) -> bool {
        Self::keeps_preferred(self.video_tool.as_deref(), &["ffmpeg"])
    }

    /// 圖片是否仍優先使用 vipsthumbnail
    #[must_use]
    pub fn prefers_vips(&self) -> bool {
        Self::keeps_preferred(self.image_tool.as_deref(), &["vips", "vipsthumbnail"])
    }

    fn keeps_preferred(value: Option<&str>, preferred: &[&str]) -> bool {
        match value.map(|v| v.trim().to_lowercase()) {
            None => true,
            Some(v) if v.is_empty() => true,
            Some(v) => preferred.contains(&v.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub tools: ToolOverrides,
    pub worker_count: usize,
    pub request_queue_capacity: usize,
    pub draw_queue_capacity: usize,
    pub repaint_interval: Duration,
    pub probe_timeout: Duration,
    pub debug: bool,
}
