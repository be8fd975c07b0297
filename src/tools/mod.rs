mod media_probe;
mod media_scanner;
mod path_validator;
mod repaint_signal;

pub use media_probe::probe_duration;
pub use media_scanner::{
    Candidate, MediaFilter, SortKey, SortOrder, absolute, scan_media, sort_candidates,
};
pub use path_validator::{ensure_directory_exists, validate_path_exists};
pub use repaint_signal::RepaintSignal;
