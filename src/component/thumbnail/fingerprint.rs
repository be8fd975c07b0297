use sha1::{Digest, Sha1};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// 快取格式版本，變更後所有舊快取自動失效
pub const CACHE_VERSION: &str = "ffmpeg-v1";

/// 尺寸為 0 時使用的預設縮圖邊長
pub const DEFAULT_BOX_SIZE: u32 = 256;

/// 縮圖目標尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetBox {
    Square(u32),
    Rect { width: u32, height: u32 },
}

impl TargetBox {
    /// 寫入 fingerprint 的尺寸標記：正方形為 `256`，矩形為 `320x180`
    #[must_use]
    pub fn dims_label(self) -> String {
        match self {
            Self::Square(size) => size.to_string(),
            Self::Rect { width, height } => format!("{width}x{height}"),
        }
    }

    /// 實際交給外部工具的像素尺寸
    #[must_use]
    pub fn pixel_box(self) -> (u32, u32) {
        match self {
            Self::Square(size) => {
                let size = if size == 0 { DEFAULT_BOX_SIZE } else { size };
                (size, size)
            }
            Self::Rect { width, height } if width == 0 || height == 0 => {
                let size = match width.max(height) {
                    0 => DEFAULT_BOX_SIZE,
                    size => size,
                };
                (size, size)
            }
            Self::Rect { width, height } => (width, height),
        }
    }

    #[must_use]
    pub const fn is_square(self) -> bool {
        matches!(self, Self::Square(_))
    }
}

/// 來源檔案的修改時間與大小
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStamp {
    pub modified_unix: i64,
    pub size: u64,
}

impl SourceStamp {
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let modified_unix = metadata.modified().map_or(0, unix_seconds);
        Self {
            modified_unix,
            size: metadata.len(),
        }
    }
}

fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
        Err(before) => {
            let secs = before.duration().as_secs_f64().ceil();
            -(secs as i64)
        }
    }
}

/// sha1(absPath|dims|mtime|size|version) 的十六進位字串
#[must_use]
pub fn fingerprint(abs_path: &Path, target: TargetBox, stamp: SourceStamp) -> String {
    let mut hasher = Sha1::new();
    hasher.update(abs_path.as_os_str().as_encoded_bytes());
    hasher.update(b"|");
    hasher.update(target.dims_label().as_bytes());
    hasher.update(b"|");
    hasher.update(stamp.modified_unix.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(stamp.size.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(CACHE_VERSION.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[must_use]
pub fn cache_entry_path(cache_dir: &Path, fingerprint: &str) -> PathBuf {
    cache_dir.join(format!("{fingerprint}.png"))
}
