use super::fingerprint::TargetBox;
use crate::config::{MediaKind, ToolOverrides};
use crate::tools::probe_duration;
use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// 無法探測影片長度時的預設擷取時間點（秒）
pub const DEFAULT_SEEK_SECONDS: f64 = 2.0;

/// 外部轉檔策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// ffmpeg 擷取單一影格
    FrameExtract,
    /// vipsthumbnail 輕量縮放
    Resize,
    /// magick 萬用轉檔，所有類型的最後手段
    Convert,
}

impl Strategy {
    #[must_use]
    pub const fn executable(self) -> &'static str {
        match self {
            Self::FrameExtract => "ffmpeg",
            Self::Resize => "vipsthumbnail",
            Self::Convert => "magick",
        }
    }
}

/// 單次策略嘗試的結果
#[derive(Debug)]
pub(crate) enum ToolOutcome {
    Produced,
    /// 執行檔不在搜尋路徑中，直接略過
    Unavailable,
    Failed(String),
}

/// 依來源類型排序的外部工具鏈
#[derive(Debug, Clone, Default)]
pub struct ToolChain {
    overrides: ToolOverrides,
    search_path: Option<OsString>,
}

impl ToolChain {
    #[must_use]
    pub const fn new(overrides: ToolOverrides) -> Self {
        Self {
            overrides,
            search_path: None,
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ToolOverrides::from_env())
    }

    /// 以指定的搜尋路徑取代 `PATH` 尋找執行檔
    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    #[must_use]
    pub fn resolve(&self, executable: &str) -> Option<PathBuf> {
        let found = match &self.search_path {
            Some(paths) => which::which_in(executable, Some(paths), Path::new(".")),
            None => which::which(executable),
        };
        found.ok()
    }

    /// 依來源類型與目標尺寸決定嘗試順序
    ///
    /// - 影片：ffmpeg（除非被環境變數停用）→ magick
    /// - 圖片（僅正方形）：vipsthumbnail（除非被停用）→ magick
    #[must_use]
    pub fn strategies(&self, kind: MediaKind, target: TargetBox) -> Vec<Strategy> {
        let mut order = Vec::with_capacity(3);
        if kind == MediaKind::Video {
            if self.overrides.prefers_ffmpeg() {
                order.push(Strategy::FrameExtract);
            }
        } else if target.is_square() && self.overrides.prefers_vips() {
            order.push(Strategy::Resize);
        }
        order.push(Strategy::Convert);
        order
    }

    /// 執行單一策略，輸出寫到 `output`
    pub(crate) fn run(
        &self,
        strategy: Strategy,
        source: &Path,
        kind: MediaKind,
        target: TargetBox,
        output: &Path,
    ) -> ToolOutcome {
        let Some(executable) = self.resolve(strategy.executable()) else {
            return ToolOutcome::Unavailable;
        };

        let seek = match strategy {
            Strategy::FrameExtract => self.seek_for(source),
            Strategy::Resize | Strategy::Convert => DEFAULT_SEEK_SECONDS,
        };
        let args = build_args(strategy, source, kind, target, output, seek);
        debug!("執行 {} {}", executable.display(), display_args(&args));

        let result = Command::new(&executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        match result {
            Ok(out) if !out.status.success() => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                ToolOutcome::Failed(format!(
                    "{} 執行失敗 ({}): {}",
                    strategy.executable(),
                    out.status,
                    stderr.trim()
                ))
            }
            Ok(_) if !output.exists() => {
                ToolOutcome::Failed(format!("{} 未產生輸出檔案", strategy.executable()))
            }
            Ok(_) => ToolOutcome::Produced,
            Err(e) => ToolOutcome::Failed(format!("無法執行 {}: {e}", executable.display())),
        }
    }

    /// 探測影片長度並計算擷取時間點；ffprobe 不存在或失敗時回到預設值
    fn seek_for(&self, source: &Path) -> f64 {
        let Some(ffprobe) = self.resolve("ffprobe") else {
            return seek_offset(None);
        };
        match probe_duration(&ffprobe, source) {
            Ok(duration) => seek_offset(Some(duration)),
            Err(e) => {
                debug!("ffprobe 失敗，使用預設時間點: {e}");
                seek_offset(None)
            }
        }
    }
}

/// 影片擷取時間點：影片長度的 10%，至少 0.5 秒，至多結尾前 0.1 秒
#[must_use]
pub fn seek_offset(duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d > 0.0 => (d * 0.10).max(0.5).min(d - 0.1),
        _ => DEFAULT_SEEK_SECONDS,
    }
}

/// 影片交給 magick 時只取第一個影格
fn convert_input(source: &Path, kind: MediaKind) -> OsString {
    let mut input = source.as_os_str().to_os_string();
    if kind == MediaKind::Video {
        input.push("[0]");
    }
    input
}

fn build_args(
    strategy: Strategy,
    source: &Path,
    kind: MediaKind,
    target: TargetBox,
    output: &Path,
    seek: f64,
) -> Vec<OsString> {
    let (width, height) = target.pixel_box();
    let os = |s: &str| OsString::from(s);

    match strategy {
        Strategy::FrameExtract => {
            let filter = format!(
                "scale={width}:{height}:force_original_aspect_ratio=decrease,\
                 pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color=black@0,format=rgba"
            );
            vec![
                os("-v"),
                os("error"),
                os("-ss"),
                OsString::from(format!("{seek:.3}")),
                os("-i"),
                source.as_os_str().to_os_string(),
                os("-frames:v"),
                os("1"),
                os("-vf"),
                OsString::from(filter),
                os("-y"),
                output.as_os_str().to_os_string(),
            ]
        }
        Strategy::Resize => {
            let size = match target {
                TargetBox::Square(_) => width.to_string(),
                TargetBox::Rect { .. } => format!("{width}x{height}"),
            };
            vec![
                source.as_os_str().to_os_string(),
                os("-s"),
                OsString::from(size),
                os("-o"),
                output.as_os_str().to_os_string(),
            ]
        }
        Strategy::Convert => {
            let geometry = format!("{width}x{height}");
            vec![
                convert_input(source, kind),
                os("-thumbnail"),
                OsString::from(&geometry),
                os("-background"),
                os("none"),
                os("-gravity"),
                os("center"),
                os("-extent"),
                OsString::from(&geometry),
                output.as_os_str().to_os_string(),
            ]
        }
    }
}

fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
