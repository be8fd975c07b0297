use crate::tools::{MediaFilter, SortKey, SortOrder};
use clap::Parser;
use std::path::PathBuf;

/// 使用錯誤
pub const EXIT_USAGE: i32 = 64;
/// 掃描、排序或終端機錯誤
pub const EXIT_DATA_ERROR: i32 = 65;
/// 沒有符合條件的檔案
pub const EXIT_NO_INPUT: i32 = 66;
/// 使用者取消
pub const EXIT_CANCELLED: i32 = 130;

/// Command-line arguments accepted by the `thumbgrid` binary.
#[derive(Parser, Debug)]
#[command(
    name = "thumbgrid",
    version,
    about = "Browse images and videos as a thumbnail grid in the terminal"
)]
pub struct Cli {
    #[arg(
        value_name = "PATH",
        default_value = ".",
        help = "Directory to scan (default: current directory)"
    )]
    pub path: PathBuf,

    #[arg(
        long,
        value_enum,
        default_value_t = MediaFilter::Both,
        help = "Which media kinds to list"
    )]
    pub filter: MediaFilter,

    #[arg(long, value_enum, default_value_t = SortKey::Mtime, help = "Sort key")]
    pub sort: SortKey,

    #[arg(long, value_enum, default_value_t = SortOrder::Desc, help = "Sort order")]
    pub order: SortOrder,

    #[arg(
        long,
        value_name = "DIR",
        env = "THUMBGRID_CACHE_DIR",
        help = "Thumbnail cache directory (default: user cache dir)"
    )]
    pub cache_dir: Option<PathBuf>,

    #[arg(
        long,
        value_name = "BACKEND",
        default_value = "auto",
        value_parser = ["auto", "kitty", "none"],
        help = "Image backend"
    )]
    pub backend: String,
}
