use super::detector::Capability;
use super::kitty::KittyRenderer;
use super::sink::OutputSink;
use std::io;
use std::path::Path;

/// 以 1 為起點的終端機儲存格區域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl CellRect {
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// 圖像後端
///
/// 所有操作都是盡力而為：傳輸失敗回傳錯誤，但不會 panic。
pub trait Renderer: Send + Sync {
    fn name(&self) -> &'static str;

    /// 清除所有已放置的圖像，可重複呼叫
    fn clear_all(&self) -> io::Result<()>;

    fn draw(&self, path: &Path, cell: CellRect) -> io::Result<()>;

    fn close(&self) -> io::Result<()>;
}

/// 依偵測結果決定一次的後端
#[derive(Debug, Clone)]
pub enum Backend {
    Kitty(KittyRenderer),
    None,
}

impl Backend {
    #[must_use]
    pub fn new(capability: Capability, sink: OutputSink) -> Self {
        match capability {
            Capability::Kitty => Self::Kitty(KittyRenderer::new(sink)),
            Capability::None => Self::None,
        }
    }

    #[must_use]
    pub const fn has_graphics(&self) -> bool {
        matches!(self, Self::Kitty(_))
    }
}

impl Renderer for Backend {
    fn name(&self) -> &'static str {
        match self {
            Self::Kitty(kitty) => kitty.name(),
            Self::None => "none",
        }
    }

    fn clear_all(&self) -> io::Result<()> {
        match self {
            Self::Kitty(kitty) => kitty.clear_all(),
            Self::None => Ok(()),
        }
    }

    fn draw(&self, path: &Path, cell: CellRect) -> io::Result<()> {
        match self {
            Self::Kitty(kitty) => kitty.draw(path, cell),
            Self::None => Ok(()),
        }
    }

    fn close(&self) -> io::Result<()> {
        match self {
            Self::Kitty(kitty) => kitty.close(),
            Self::None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::terminal::sink::SharedBuffer;

    #[test]
    fn test_none_backend_is_silent() {
        let buffer = SharedBuffer::default();
        let backend = Backend::new(Capability::None, buffer.sink());
        let cell = CellRect {
            x: 1,
            y: 1,
            width: 10,
            height: 4,
        };

        assert_eq!(backend.name(), "none");
        assert!(!backend.has_graphics());
        backend.draw(Path::new("/tmp/a.png"), cell).unwrap();
        backend.clear_all().unwrap();
        backend.close().unwrap();
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn test_kitty_backend_dispatches() {
        let buffer = SharedBuffer::default();
        let backend = Backend::new(Capability::Kitty, buffer.sink());

        assert_eq!(backend.name(), "kitty");
        assert!(backend.has_graphics());
        backend.clear_all().unwrap();
        assert_eq!(buffer.contents(), "\x1b_Ga=d,q=2;\x1b\\");
    }
}
