//! 終端機圖像輸出
//!
//! 偵測 Kitty 圖像協定、以共用輸出端繪製縮圖，並透過排程器丟棄過期畫格。

mod detector;
mod error;
mod kitty;
mod raw_mode;
mod renderer;
mod scheduler;
mod sink;

pub use detector::{Capability, FALLBACK_PROBE_TIMEOUT, detect, probe_kitty};
pub use error::TerminalError;
pub use kitty::{CLEAR_ALL_SEQUENCE, KittyRenderer, QUERY_SEQUENCE, RESPONSE_MARKER, draw_sequence};
pub use raw_mode::RawModeGuard;
pub use renderer::{Backend, CellRect, Renderer};
pub use scheduler::{EnqueueOutcome, FALLBACK_QUEUE_CAPACITY, Scheduler};
pub use sink::OutputSink;
