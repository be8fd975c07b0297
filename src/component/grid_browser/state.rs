use super::layout::Layout;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

/// 使用者操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
    LineUp,
    LineDown,
    /// `g`，連按兩次回到第一項
    PressG,
    Bottom,
    ZoomIn,
    ZoomOut,
    TogglePreviews,
    Redraw,
    Accept,
    Cancel,
    /// 滑鼠點擊，座標以 1 為起點
    Click { x: u16, y: u16 },
    ScrollUp,
    ScrollDown,
    Resize { width: u16, height: u16 },
    Ignore,
}

impl Action {
    #[must_use]
    pub fn from_key(key: &KeyEvent) -> Self {
        if key.kind == KeyEventKind::Release {
            return Self::Ignore;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => Self::Cancel,
            KeyCode::Char('b') if ctrl => Self::PageUp,
            KeyCode::Char('f') if ctrl => Self::PageDown,
            KeyCode::Char('u') if ctrl => Self::HalfPageUp,
            KeyCode::Char('d') if ctrl => Self::HalfPageDown,
            KeyCode::Char('y') if ctrl => Self::LineUp,
            KeyCode::Char('e') if ctrl => Self::LineDown,
            KeyCode::Char('l') if ctrl => Self::Redraw,
            KeyCode::Up | KeyCode::Char('k') => Self::Up,
            KeyCode::Down | KeyCode::Char('j') => Self::Down,
            KeyCode::Left | KeyCode::Char('h') => Self::Left,
            KeyCode::Right | KeyCode::Char('l') => Self::Right,
            KeyCode::PageUp => Self::PageUp,
            KeyCode::PageDown => Self::PageDown,
            KeyCode::Char('g') => Self::PressG,
            KeyCode::Char('G') => Self::Bottom,
            KeyCode::Char('+' | '=') => Self::ZoomIn,
            KeyCode::Char('-' | '_') => Self::ZoomOut,
            KeyCode::Char('p') => Self::TogglePreviews,
            KeyCode::Enter => Self::Accept,
            KeyCode::Esc | KeyCode::Char('q') => Self::Cancel,
            _ => Self::Ignore,
        }
    }

    /// 任一按鍵按下或拖曳視為點擊，滾輪捲動一列
    #[must_use]
    pub fn from_mouse(event: &MouseEvent) -> Self {
        match event.kind {
            MouseEventKind::Down(_) | MouseEventKind::Drag(_) => Self::Click {
                x: event.column.saturating_add(1),
                y: event.row.saturating_add(1),
            },
            MouseEventKind::ScrollUp => Self::ScrollUp,
            MouseEventKind::ScrollDown => Self::ScrollDown,
            _ => Self::Ignore,
        }
    }
}

/// 套用操作後的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Redraw,
    Unchanged,
    Accept(usize),
    Cancel,
}

/// 網格瀏覽狀態；所有轉換都是純函式，游標永遠保持在可見範圍內
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridState {
    pub cursor: usize,
    pub top_row: usize,
    pub zoom: u16,
    pub show_previews: bool,
    pub term_width: u16,
    pub term_height: u16,
    count: usize,
    awaiting_g: bool,
}

impl GridState {
    #[must_use]
    pub const fn new(count: usize, term_width: u16, term_height: u16, show_previews: bool) -> Self {
        Self {
            cursor: 0,
            top_row: 0,
            zoom: 0,
            show_previews,
            term_width,
            term_height,
            count,
            awaiting_g: false,
        }
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        Layout::compute(self.term_width, self.term_height, self.zoom)
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    pub fn apply(&mut self, action: Action) -> Outcome {
        let chord = std::mem::replace(&mut self.awaiting_g, false);
        let layout = self.layout();
        let columns = layout.columns.max(1);
        let visible_rows = layout.rows.max(1);

        match action {
            Action::Up => {
                if self.cursor >= columns {
                    self.move_to(self.cursor - columns);
                }
            }
            Action::Down => {
                if self.cursor + columns < self.count {
                    self.move_to(self.cursor + columns);
                }
            }
            Action::Left => {
                if self.cursor % columns > 0 {
                    self.move_to(self.cursor - 1);
                }
            }
            Action::Right => {
                if self.cursor % columns < columns - 1 && self.cursor + 1 < self.count {
                    self.move_to(self.cursor + 1);
                }
            }
            Action::PageUp => {
                let row = (self.cursor / columns).saturating_sub(visible_rows);
                self.move_to(row * columns + self.cursor % columns);
            }
            Action::PageDown => {
                let last_row = layout.data_rows(self.count).saturating_sub(1);
                let row = (self.cursor / columns + visible_rows).min(last_row);
                self.move_to(row * columns + self.cursor % columns);
            }
            Action::HalfPageUp => {
                self.top_row = self.top_row.saturating_sub((layout.rows / 2).max(1));
                self.keep_cursor_visible();
            }
            Action::HalfPageDown => {
                let delta = (layout.rows / 2).max(1);
                self.top_row = (self.top_row + delta).min(layout.max_top_row(self.count));
                self.keep_cursor_visible();
            }
            Action::LineUp | Action::ScrollUp => {
                self.top_row = self.top_row.saturating_sub(1);
                self.keep_cursor_visible();
            }
            Action::LineDown | Action::ScrollDown => {
                if self.top_row < layout.max_top_row(self.count) {
                    self.top_row += 1;
                }
                self.keep_cursor_visible();
            }
            Action::PressG => {
                if !chord {
                    self.awaiting_g = true;
                    return Outcome::Unchanged;
                }
                self.move_to(0);
                self.top_row = 0;
            }
            Action::Bottom => self.move_to(self.count.saturating_sub(1)),
            Action::ZoomIn => {
                self.zoom = self.zoom.saturating_add(1);
                self.move_to(self.cursor);
            }
            Action::ZoomOut => {
                self.zoom = self.zoom.saturating_sub(1);
                self.move_to(self.cursor);
            }
            Action::Click { x, y } => {
                let Some((row, column)) = layout.tile_at(x, y) else {
                    return Outcome::Unchanged;
                };
                let index = (self.top_row + row) * columns + column;
                if index >= self.count {
                    return Outcome::Unchanged;
                }
                self.move_to(index);
            }
            Action::TogglePreviews => self.show_previews = !self.show_previews,
            Action::Redraw => {}
            Action::Resize { width, height } => {
                self.term_width = width;
                self.term_height = height;
                self.move_to(self.cursor);
            }
            Action::Accept => {
                return if self.count == 0 {
                    Outcome::Unchanged
                } else {
                    Outcome::Accept(self.cursor)
                };
            }
            Action::Cancel => return Outcome::Cancel,
            Action::Ignore => return Outcome::Unchanged,
        }

        Outcome::Redraw
    }

    /// 移動游標並捲動到可見位置
    fn move_to(&mut self, index: usize) {
        let layout = self.layout();
        let columns = layout.columns.max(1);
        let visible_rows = layout.rows.max(1);

        self.cursor = index.min(self.count.saturating_sub(1));
        let row = self.cursor / columns;
        if row < self.top_row {
            self.top_row = row;
        }
        if row >= self.top_row + visible_rows {
            self.top_row = row + 1 - visible_rows;
        }
        self.top_row = self.top_row.min(layout.max_top_row(self.count));
    }

    /// 捲動後把游標拉回視窗內，保持同一欄
    fn keep_cursor_visible(&mut self) {
        let layout = self.layout();
        let columns = layout.columns.max(1);
        let visible_rows = layout.rows.max(1);

        let row = self.cursor / columns;
        let column = self.cursor % columns;
        let target = if row < self.top_row {
            self.top_row
        } else if row >= self.top_row + visible_rows {
            self.top_row + visible_rows - 1
        } else {
            return;
        };
        self.cursor = (target * columns + column).min(self.count.saturating_sub(1));
    }
}
