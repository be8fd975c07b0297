use super::sink::OutputSink;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use log::debug;
use std::io;

/// 終端機 raw 模式與滑鼠回報；離開作用域時依相反順序還原
pub struct RawModeGuard {
    mouse: Option<OutputSink>,
}

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self { mouse: None })
    }

    /// 開啟滑鼠點擊與滾輪回報（SGR 編碼）
    pub fn capture_mouse(&mut self, sink: &OutputSink) -> io::Result<()> {
        let mut out = sink.lock();
        execute!(out, EnableMouseCapture)?;
        self.mouse = Some(sink.clone());
        Ok(())
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Some(sink) = self.mouse.take() {
            let mut out = sink.lock();
            if let Err(e) = execute!(out, DisableMouseCapture) {
                debug!("無法關閉滑鼠回報: {e}");
            }
        }
        if let Err(e) = disable_raw_mode() {
            debug!("無法還原終端機模式: {e}");
        }
    }
}
