/// 無法取得終端機大小時的預設值
pub const DEFAULT_TERM_SIZE: (u16, u16) = (80, 24);

pub const BASE_TILE_WIDTH: u16 = 18;
pub const BASE_TILE_HEIGHT: u16 = 6;
/// 每一級縮放增加的儲存格數
pub const ZOOM_STEP_WIDTH: u16 = 4;
pub const ZOOM_STEP_HEIGHT: u16 = 2;
pub const MIN_TILE_WIDTH: u16 = 8;
pub const MIN_TILE_HEIGHT: u16 = 3;
pub const GUTTER: u16 = 2;
pub const HEADER_ROWS: u16 = 1;
pub const FOOTER_ROWS: u16 = 1;

/// 估算的每個儲存格像素大小
pub const PIXELS_PER_CELL_X: u32 = 10;
pub const PIXELS_PER_CELL_Y: u32 = 20;
pub const MIN_THUMB_PIXELS: u32 = 8;

/// 網格排版（座標以 1 為起點）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub term_width: u16,
    pub term_height: u16,
    pub grid_x: u16,
    pub grid_y: u16,
    pub grid_width: u16,
    pub grid_height: u16,
    pub tile_width: u16,
    pub tile_height: u16,
    pub columns: usize,
    pub rows: usize,
}

impl Layout {
    #[must_use]
    pub fn compute(term_width: u16, term_height: u16, zoom: u16) -> Self {
        let term_width = if term_width == 0 {
            DEFAULT_TERM_SIZE.0
        } else {
            term_width
        };
        let term_height = if term_height == 0 {
            DEFAULT_TERM_SIZE.1
        } else {
            term_height
        };

        let grid_width = term_width;
        let grid_height = term_height.saturating_sub(HEADER_ROWS + FOOTER_ROWS);

        let tile_width = BASE_TILE_WIDTH
            .saturating_add(zoom.saturating_mul(ZOOM_STEP_WIDTH))
            .max(MIN_TILE_WIDTH);
        let tile_height = BASE_TILE_HEIGHT
            .saturating_add(zoom.saturating_mul(ZOOM_STEP_HEIGHT))
            .max(MIN_TILE_HEIGHT);

        let step_width = usize::from(tile_width) + usize::from(GUTTER);
        let step_height = usize::from(tile_height) + usize::from(GUTTER);

        let columns = if grid_width < tile_width {
            1
        } else {
            ((usize::from(grid_width) + usize::from(GUTTER)) / step_width).max(1)
        };
        let rows = if grid_height < tile_height {
            0
        } else {
            1 + usize::from(grid_height - tile_height) / step_height
        };

        Self {
            term_width,
            term_height,
            grid_x: 1,
            grid_y: HEADER_ROWS + 1,
            grid_width,
            grid_height,
            tile_width,
            tile_height,
            columns,
            rows,
        }
    }

    /// 第 `row` 列、第 `column` 欄方塊的左上角
    #[must_use]
    pub fn tile_origin(&self, row: usize, column: usize) -> (u16, u16) {
        let x = usize::from(self.grid_x) + column * (usize::from(self.tile_width) + usize::from(GUTTER));
        let y = usize::from(self.grid_y) + row * (usize::from(self.tile_height) + usize::from(GUTTER));
        (to_cell(x), to_cell(y))
    }

    /// 方塊邊框內的寬度
    #[must_use]
    pub fn inner_width(&self) -> u16 {
        self.tile_width.saturating_sub(2).max(2)
    }

    /// 預留給縮圖的高度（扣除上下框與檔名列）
    #[must_use]
    pub fn image_height(&self) -> u16 {
        self.tile_height.saturating_sub(3).max(1)
    }

    /// 向縮圖池要求的像素尺寸
    #[must_use]
    pub fn thumb_pixels(&self) -> (u32, u32) {
        (
            (u32::from(self.inner_width()) * PIXELS_PER_CELL_X).max(MIN_THUMB_PIXELS),
            (u32::from(self.image_height()) * PIXELS_PER_CELL_Y).max(MIN_THUMB_PIXELS),
        )
    }

    /// 容納 `count` 個項目所需的列數
    #[must_use]
    pub fn data_rows(&self, count: usize) -> usize {
        count.div_ceil(self.columns.max(1))
    }

    /// 最後一列對齊視窗底部時的捲動位置
    #[must_use]
    pub fn max_top_row(&self, count: usize) -> usize {
        self.data_rows(count).saturating_sub(self.rows)
    }

    /// 儲存格座標所在的方塊（可見列、欄）；落在間隔或網格外時回傳 `None`
    #[must_use]
    pub fn tile_at(&self, x: u16, y: u16) -> Option<(usize, usize)> {
        let offset_x = usize::from(x.checked_sub(self.grid_x)?);
        let offset_y = usize::from(y.checked_sub(self.grid_y)?);
        let step_width = usize::from(self.tile_width) + usize::from(GUTTER);
        let step_height = usize::from(self.tile_height) + usize::from(GUTTER);

        let (row, column) = (offset_y / step_height, offset_x / step_width);
        if row >= self.rows || column >= self.columns {
            return None;
        }
        if offset_x % step_width >= usize::from(self.tile_width)
            || offset_y % step_height >= usize::from(self.tile_height)
        {
            return None;
        }
        Some((row, column))
    }
}

fn to_cell(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
