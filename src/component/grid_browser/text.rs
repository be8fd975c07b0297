use console::{Alignment, measure_text_width, pad_str, truncate_str};
use std::path::Path;

const ELLIPSIS: &str = "...";

/// 控制字元一律換成空白，避免檔名裡的跳脫序列破壞畫面
#[must_use]
pub fn sanitize_printable(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn char_width(c: char) -> usize {
    let mut buf = [0u8; 4];
    measure_text_width(c.encode_utf8(&mut buf))
}

/// 依顯示寬度截斷中間，保留頭尾
#[must_use]
pub fn truncate_middle(text: &str, width: usize) -> String {
    let text = sanitize_printable(text);
    if width == 0 {
        return String::new();
    }
    if measure_text_width(&text) <= width {
        return text;
    }
    if width <= ELLIPSIS.len() {
        return truncate_str(&text, width, "").into_owned();
    }

    let available = width - ELLIPSIS.len();
    let left_budget = available / 2;
    let right_budget = available - left_budget;

    let mut used = 0;
    let left: String = text
        .chars()
        .take_while(|&c| {
            used += char_width(c);
            used <= left_budget
        })
        .collect();

    used = 0;
    let mut right: Vec<char> = text
        .chars()
        .rev()
        .take_while(|&c| {
            used += char_width(c);
            used <= right_budget
        })
        .collect();
    right.reverse();

    let mut out = left;
    out.push_str(ELLIPSIS);
    out.extend(right);
    out
}

/// 截斷或補空白到剛好 `width` 寬
#[must_use]
pub fn fit_width(text: &str, width: usize) -> String {
    let truncated = truncate_str(text, width, "");
    pad_str(&truncated, width, Alignment::Left, None).into_owned()
}

#[must_use]
pub fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    match bytes {
        b if b >= GB => format!("{:.1}G", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1}M", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1}K", b as f64 / KB as f64),
        b => format!("{b}B"),
    }
}

/// 無縮圖時顯示的副檔名標籤
#[must_use]
pub fn other_icon(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_uppercase())
        .unwrap_or_default();
    if ext.is_empty() {
        return "FILE".to_string();
    }
    let short: String = ext.chars().take(4).collect();
    format!("[{short}]")
}
