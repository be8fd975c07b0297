//! 測試用假工具：寫入暫存資料夾的 shell script，透過工具鏈的搜尋路徑注入

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thumbgrid::component::thumbnail::ToolChain;
use thumbgrid::config::ToolOverrides;

pub struct FakeTools {
    bin: TempDir,
    log: PathBuf,
}

impl FakeTools {
    pub fn new() -> Self {
        let bin = TempDir::new().unwrap();
        let log = bin.path().join("calls.log");
        fs::write(&log, "").unwrap();
        Self { bin, log }
    }

    pub fn path(&self) -> &Path {
        self.bin.path()
    }

    /// 成功的工具：把內容寫到最後一個參數（輸出檔）
    pub fn install_producer(&self, name: &str) {
        self.install(
            name,
            &format!(
                "echo \"{name} $*\" >> \"{}\"\nfor last; do :; done\nprintf 'PNG' > \"$last\"\n",
                self.log.display()
            ),
        );
    }

    /// 失敗的工具：留下半成品後以非零狀態結束
    pub fn install_failing(&self, name: &str) {
        self.install(
            name,
            &format!(
                "echo \"{name} $*\" >> \"{}\"\nfor last; do :; done\nprintf 'partial' > \"$last\"\necho boom >&2\nexit 1\n",
                self.log.display()
            ),
        );
    }

    /// 回傳固定影片長度的 ffprobe
    pub fn install_ffprobe(&self, duration: &str) {
        self.install(
            "ffprobe",
            &format!(
                "echo \"ffprobe $*\" >> \"{}\"\nprintf '{{\"format\":{{\"duration\":\"{duration}\"}}}}'\n",
                self.log.display()
            ),
        );
    }

    fn install(&self, name: &str, body: &str) {
        let script = self.bin.path().join(name);
        fs::write(&script, format!("#!/bin/sh\n{body}")).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// 指定工具的每一次呼叫（含參數）
    pub fn calls(&self, name: &str) -> Vec<String> {
        let prefix = format!("{name} ");
        fs::read_to_string(&self.log)
            .unwrap()
            .lines()
            .filter(|line| line.starts_with(&prefix))
            .map(str::to_string)
            .collect()
    }

    pub fn chain(&self) -> ToolChain {
        ToolChain::default().with_search_path(self.path())
    }

    pub fn chain_with(&self, overrides: ToolOverrides) -> ToolChain {
        ToolChain::new(overrides).with_search_path(self.path())
    }
}

/// 在資料夾內建立來源檔
pub fn write_source(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// 快取資料夾中的所有檔名
pub fn cache_entries(cache: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(cache) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
