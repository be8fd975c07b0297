use super::layout::Layout;
use super::state::GridState;
use super::text::{fit_width, human_size, other_icon, sanitize_printable, truncate_middle};
use crate::component::terminal::{Backend, CellRect, Scheduler};
use crate::component::thumbnail::ThumbnailPool;
use crate::tools::Candidate;
use console::{measure_text_width, truncate_str};
use std::io::{self, Write};

/// 視窗上下各多預先產生一列縮圖
const PREFETCH_ROWS: usize = 1;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// 縮圖來源與繪圖排程；無圖像後端時不存在
pub struct Previews<'a> {
    pub pool: &'a ThumbnailPool,
    pub scheduler: &'a Scheduler<Backend>,
}

/// 繪製一整個畫格：標題列、方塊網格、狀態列
pub struct FramePainter<'a> {
    pub candidates: &'a [Candidate],
    pub backend_name: &'static str,
    pub previews: Option<Previews<'a>>,
}

impl FramePainter<'_> {
    pub fn paint(&self, out: &mut dyn Write, state: &GridState) -> io::Result<()> {
        let layout = state.layout();
        let width = usize::from(layout.term_width);
        let render_images = state.show_previews && self.previews.is_some();

        write!(out, "{CLEAR_SCREEN}")?;
        let header = format!(
            "[{}] Arrows/hjkl move • Enter accept • q/Esc cancel",
            self.backend_name
        );
        write!(out, "\x1b[1;1H{}\x1b[K", truncate_str(&header, width, ""))?;

        if render_images {
            self.prefetch(state, &layout);
        }

        for row in 0..layout.rows {
            for column in 0..layout.columns {
                let index = (state.top_row + row) * layout.columns + column;
                let (x, y) = layout.tile_origin(row, column);
                self.paint_tile(out, state, &layout, index, (x, y), render_images)?;
            }
        }

        if layout.term_height >= 2 {
            let status = sanitize_printable(&self.status_line(state, &layout));
            write!(
                out,
                "\x1b[{};1H{}\x1b[K",
                layout.term_height,
                truncate_str(&status, width, "")
            )?;
        }

        out.flush()
    }

    /// 提前要求視窗附近的縮圖，捲動時可以直接命中
    fn prefetch(&self, state: &GridState, layout: &Layout) {
        let Some(previews) = &self.previews else {
            return;
        };
        let (width_px, height_px) = layout.thumb_pixels();
        let first_row = state.top_row.saturating_sub(PREFETCH_ROWS);
        let last_row = state.top_row + layout.rows + PREFETCH_ROWS;

        let start = first_row * layout.columns;
        let end = (last_row * layout.columns).min(self.candidates.len());
        for candidate in self.candidates.get(start..end).unwrap_or_default() {
            if candidate.kind.is_media() {
                let _ = previews.pool.ensure(&candidate.path, width_px, height_px);
            }
        }
    }

    fn paint_tile(
        &self,
        out: &mut dyn Write,
        state: &GridState,
        layout: &Layout,
        index: usize,
        (x, y): (u16, u16),
        render_images: bool,
    ) -> io::Result<()> {
        let tile_width = usize::from(layout.tile_width);
        let tile_height = layout.tile_height;
        let inner_width = usize::from(layout.inner_width());
        let image_height = layout.image_height();
        let selected = index == state.cursor && index < self.candidates.len();

        let (corner, edge) = if selected { ('*', "=") } else { ('+', "-") };
        let border = format!("{corner}{}{corner}", edge.repeat(tile_width.saturating_sub(2)));
        write!(out, "\x1b[{y};{x}H{border}")?;
        write!(out, "\x1b[{};{x}H{border}", y + tile_height - 1)?;

        let blank = " ".repeat(inner_width);
        for offset in 1..tile_height - 1 {
            write!(out, "\x1b[{};{x}H|{blank}|", y + offset)?;
        }
        let Some(candidate) = self.candidates.get(index) else {
            return Ok(());
        };

        if render_images && candidate.kind.is_media() {
            self.request_thumbnail(candidate, layout, x + 1, y + 1);
        } else {
            let icon = truncate_str(&other_icon(&candidate.path), inner_width, "").into_owned();
            let icon_x = x + 1 + to_cell(inner_width.saturating_sub(measure_text_width(&icon)) / 2);
            let icon_y = y + 1 + image_height.saturating_sub(1) / 2;
            write!(out, "\x1b[{icon_y};{icon_x}H{icon}")?;
        }

        let marker = if selected { '>' } else { ' ' };
        let name = truncate_middle(&candidate.name, inner_width.saturating_sub(3));
        let line = fit_width(&format!("{marker} {name}"), inner_width);
        write!(out, "\x1b[{};{x}H|{line}|", y + tile_height - 2)
    }

    /// 縮圖已就緒才排入繪圖，否則等工作池完成後的重繪
    fn request_thumbnail(&self, candidate: &Candidate, layout: &Layout, x: u16, y: u16) {
        let Some(previews) = &self.previews else {
            return;
        };
        let (width_px, height_px) = layout.thumb_pixels();
        if let Some(thumb) = previews.pool.ensure(&candidate.path, width_px, height_px) {
            let cell = CellRect {
                x,
                y,
                width: layout.inner_width(),
                height: layout.image_height(),
            };
            let _ = previews.scheduler.enqueue(&thumb, cell);
        }
    }

    fn status_line(&self, state: &GridState, layout: &Layout) -> String {
        let Some(candidate) = self.candidates.get(state.cursor) else {
            return "(no items)".to_string();
        };
        let name_width = (usize::from(layout.term_width) / 3).max(10);
        format!(
            "{}/{} • Name: {} • Type: {} • Size: {} • Grid: {}x{} • Tile: {}x{}",
            state.cursor + 1,
            self.candidates.len(),
            truncate_middle(&candidate.name, name_width),
            candidate.kind.label(),
            human_size(candidate.size),
            layout.columns,
            layout.rows,
            layout.tile_width,
            layout.tile_height,
        )
    }
}

fn to_cell(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// 清除整個畫面並把游標移到左上角
pub fn clear_screen(out: &mut dyn Write) -> io::Result<()> {
    write!(out, "{CLEAR_SCREEN}")?;
    out.flush()
}
