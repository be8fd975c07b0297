pub mod load;
pub mod types;

pub use load::{classify, media_types};
pub use types::{
    DEFAULT_DRAW_QUEUE_CAPACITY, DEFAULT_PROBE_TIMEOUT, DEFAULT_REPAINT_INTERVAL,
    DEFAULT_REQUEST_QUEUE_CAPACITY, DEFAULT_WORKER_COUNT, ENV_CACHE_DIR, ENV_DEBUG,
    ENV_IMAGE_TOOL, ENV_VIDEO_TOOL, MediaKind, MediaTypeTable, Settings, ToolOverrides,
};
