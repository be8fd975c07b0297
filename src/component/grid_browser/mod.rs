//! 互動式縮圖網格瀏覽
//!
//! 輸入執行緒只修改狀態並發出重繪訊號，實際繪製由重繪執行緒在下一個 tick 完成。

mod frame;
mod layout;
mod main;
mod state;
mod text;

pub use frame::{FramePainter, Previews, clear_screen};
pub use layout::Layout;
pub use main::{BrowseOutcome, GridBrowser};
pub use state::{Action, GridState, Outcome};
pub use text::{fit_width, human_size, other_icon, sanitize_printable, truncate_middle};
