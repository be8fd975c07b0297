use crate::config::{ENV_DEBUG, Settings};
use env_logger::{Builder, Env, Target};

/// 初始化日誌
///
/// 畫面由 TUI 佔用，預設關閉所有輸出；設定 `THUMBGRID_DEBUG` 時改為 debug 等級，
/// `RUST_LOG` 仍可覆寫。
pub fn init(settings: &Settings) {
    let _ = Builder::from_env(Env::default().default_filter_or(default_filter(settings)))
        .target(Target::Stderr)
        .format_timestamp_millis()
        .try_init();
}

fn default_filter(settings: &Settings) -> &'static str {
    if settings.debug { "debug" } else { "off" }
}
