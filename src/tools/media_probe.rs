use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Stdio};

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

/// 使用 ffprobe 取得影片長度（秒）
///
/// `ffprobe` 為已解析的執行檔路徑，由呼叫端決定搜尋路徑。
pub fn probe_duration(ffprobe: &Path, source: &Path) -> Result<f64> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "format=duration",
            "-print_format",
            "json",
        ])
        .arg(source)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("無法執行 ffprobe: {}", source.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffprobe 執行失敗: {}", stderr.trim());
    }

    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

/// 解析 ffprobe JSON 輸出中的 `format.duration`
fn parse_duration(stdout: &str) -> Result<f64> {
    let probe: FfprobeOutput =
        serde_json::from_str(stdout).with_context(|| "無法解析 ffprobe 輸出")?;

    let raw = probe
        .format
        .and_then(|f| f.duration)
        .map(|d| d.trim().to_string())
        .unwrap_or_default();

    if raw.is_empty() || raw == "N/A" {
        bail!("無影片長度");
    }

    match raw.parse::<f64>() {
        Ok(duration) if duration > 0.0 => Ok(duration),
        _ => bail!("影片長度無效: {raw:?}"),
    }
}
