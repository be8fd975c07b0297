use super::error::ThumbError;
use super::fingerprint::{SourceStamp, TargetBox, cache_entry_path, fingerprint};
use super::tool_chain::{Strategy, ToolChain, ToolOutcome};
use crate::config::{MediaKind, classify};
use crate::tools::{absolute, ensure_directory_exists};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 以環境變數設定的工具鏈產生正方形縮圖
pub fn generate(path: &Path, size: u32, cache_dir: &Path) -> Result<PathBuf, ThumbError> {
    ThumbnailService::new(ToolChain::from_env(), cache_dir).generate(path, size)
}

/// 以環境變數設定的工具鏈產生矩形縮圖
pub fn generate_rect(
    path: &Path,
    width: u32,
    height: u32,
    cache_dir: &Path,
) -> Result<PathBuf, ThumbError> {
    ThumbnailService::new(ToolChain::from_env(), cache_dir).generate_rect(path, width, height)
}

/// 縮圖產生服務：快取查詢 + 外部工具鏈
///
/// 每次嘗試先寫入快取資料夾內的私有暫存檔，成功後以 rename 原子地發布到
/// `<fingerprint>.png`，因此快取路徑上永遠不會出現寫到一半的檔案。
#[derive(Debug, Clone)]
pub struct ThumbnailService {
    tools: ToolChain,
    cache_dir: PathBuf,
}

impl ThumbnailService {
    #[must_use]
    pub fn new(tools: ToolChain, cache_dir: &Path) -> Self {
        Self {
            tools,
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn generate(&self, path: &Path, size: u32) -> Result<PathBuf, ThumbError> {
        self.generate_target(path, TargetBox::Square(size))
    }

    /// 寬或高為 0 時改用較大邊的正方形；矩形工具全部失敗時也退回正方形
    pub fn generate_rect(&self, path: &Path, width: u32, height: u32) -> Result<PathBuf, ThumbError> {
        let square = width.max(height);
        if width == 0 || height == 0 {
            return self.generate(path, square);
        }

        match self.generate_target(path, TargetBox::Rect { width, height }) {
            Err(ThumbError::AllToolsExhausted { .. }) => {
                debug!("矩形縮圖失敗，改用正方形 {square}: {}", path.display());
                self.generate(path, square)
            }
            other => other,
        }
    }

    fn generate_target(&self, path: &Path, target: TargetBox) -> Result<PathBuf, ThumbError> {
        let abs = absolute(path);
        let metadata = fs::metadata(&abs).map_err(|source| ThumbError::Source {
            path: abs.clone(),
            source,
        })?;
        let key = fingerprint(&abs, target, SourceStamp::from_metadata(&metadata));

        ensure_directory_exists(&self.cache_dir).map_err(|source| ThumbError::CacheDirectory {
            path: self.cache_dir.clone(),
            source,
        })?;

        let out = cache_entry_path(&self.cache_dir, &key);
        if fs::metadata(&out).is_ok() {
            debug!("快取命中 ({}): {}", target.dims_label(), out.display());
            return Ok(out);
        }

        let kind = classify(&abs);
        for strategy in self.tools.strategies(kind, target) {
            if self.attempt(strategy, &abs, kind, target, &out) {
                debug!(
                    "{} 產生縮圖 {}: {}",
                    strategy.executable(),
                    target.dims_label(),
                    abs.display()
                );
                return Ok(out);
            }
        }

        Err(ThumbError::AllToolsExhausted { path: abs })
    }

    /// 執行單一策略；成功時暫存檔已 rename 到 `out`
    fn attempt(
        &self,
        strategy: Strategy,
        source: &Path,
        kind: MediaKind,
        target: TargetBox,
        out: &Path,
    ) -> bool {
        let temp = self
            .cache_dir
            .join(format!("thumbgrid.{}.png", Uuid::new_v4().simple()));

        match self.tools.run(strategy, source, kind, target, &temp) {
            ToolOutcome::Produced => match fs::rename(&temp, out) {
                Ok(()) => true,
                Err(e) => {
                    debug!("無法發布縮圖 {} -> {}: {e}", temp.display(), out.display());
                    remove_temp(&temp);
                    false
                }
            },
            ToolOutcome::Unavailable => false,
            ToolOutcome::Failed(reason) => {
                debug!("{reason}");
                remove_temp(&temp);
                false
            }
        }
    }
}

fn remove_temp(temp: &Path) {
    if temp.exists()
        && let Err(e) = fs::remove_file(temp)
    {
        debug!("無法刪除暫存檔 {}: {e}", temp.display());
    }
}
