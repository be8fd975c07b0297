use super::renderer::{CellRect, Renderer};
use super::sink::OutputSink;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::io;
use std::path::Path;

/// 圖像協定支援查詢
pub const QUERY_SEQUENCE: &str = "\x1b_Gi=31,s=1,v=1,a=q,t=d,f=24;AAAA\x1b\\";
/// 支援的終端機回覆中一定含有的標記
pub const RESPONSE_MARKER: &[u8] = b"\x1b_G";
/// 刪除所有已放置的圖像
pub const CLEAR_ALL_SEQUENCE: &str = "\x1b_Ga=d,q=2;\x1b\\";

/// 移動游標到 (x, y) 後以檔案路徑傳送 PNG，寬度以儲存格計
#[must_use]
pub fn draw_sequence(path: &Path, cell: CellRect) -> String {
    let encoded = BASE64.encode(path.as_os_str().as_encoded_bytes());
    format!(
        "\x1b[{};{}H\x1b_Ga=T,t=f,f=100,c={},C=1,q=2;{encoded}\x1b\\",
        cell.y, cell.x, cell.width
    )
}

#[derive(Debug, Clone)]
pub struct KittyRenderer {
    sink: OutputSink,
}

impl KittyRenderer {
    #[must_use]
    pub const fn new(sink: OutputSink) -> Self {
        Self { sink }
    }
}

impl Renderer for KittyRenderer {
    fn name(&self) -> &'static str {
        "kitty"
    }

    fn clear_all(&self) -> io::Result<()> {
        self.sink.write_flush(CLEAR_ALL_SEQUENCE.as_bytes())
    }

    fn draw(&self, path: &Path, cell: CellRect) -> io::Result<()> {
        if cell.is_empty() || path.as_os_str().is_empty() {
            return Ok(());
        }
        self.sink.write_flush(draw_sequence(path, cell).as_bytes())
    }

    fn close(&self) -> io::Result<()> {
        Ok(())
    }
}
