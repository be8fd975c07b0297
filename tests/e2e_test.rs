//! E2E Integration Tests
//!
//! 掃描 → 工作池產生縮圖 → 排程器繪製的完整流程

mod common;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use common::{FakeTools, write_source};
use tempfile::TempDir;
use thumbgrid::component::terminal::{
    Backend, Capability, CellRect, OutputSink, Renderer, Scheduler, draw_sequence,
};
use thumbgrid::component::thumbnail::{PoolConfig, ThumbnailPool, ThumbnailService};
use thumbgrid::config::MediaKind;
use thumbgrid::tools::{MediaFilter, RepaintSignal, SortKey, SortOrder, scan_media, sort_candidates};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn wait_for<T>(mut probe: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if let Some(value) = probe() {
            return Some(value);
        }
        thread::sleep(Duration::from_millis(10));
    }
    None
}

/// 測試 Scanner：略過快取資料夾並依條件過濾
#[test]
fn test_scan_filters_and_skips_cache() {
    let root = TempDir::new().unwrap();
    let cache = root.path().join(".thumbs");
    fs::create_dir_all(cache.join("nested")).unwrap();
    fs::create_dir_all(root.path().join("album")).unwrap();

    write_source(root.path(), "b.jpg", b"12345");
    write_source(root.path(), "a.MP4", b"1");
    write_source(&root.path().join("album"), "c.png", b"123");
    write_source(root.path(), "notes.txt", b"text");
    write_source(&cache, "cached.png", b"png");
    write_source(&cache.join("nested"), "deep.png", b"png");

    let mut both = scan_media(root.path(), &cache, MediaFilter::Both).unwrap();
    sort_candidates(&mut both, SortKey::Name, SortOrder::Asc);
    let names: Vec<&str> = both.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a.MP4", "b.jpg", "c.png"]);

    sort_candidates(&mut both, SortKey::Size, SortOrder::Desc);
    assert_eq!(both[0].name, "b.jpg");

    let videos = scan_media(root.path(), &cache, MediaFilter::Videos).unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].kind, MediaKind::Video);
}

/// 測試 Worker Pool：同時兩次請求只產生一次
#[test]
fn test_pool_generates_once_and_signals_repaint() {
    let tools = FakeTools::new();
    tools.install_producer("magick");
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "photo.jpg", b"jpeg");

    let service = Arc::new(ThumbnailService::new(tools.chain(), &dir.path().join("cache")));
    let repaint = RepaintSignal::new();
    let pool = ThumbnailPool::new(
        service,
        PoolConfig {
            workers: 4,
            queue_capacity: 16,
        },
        repaint.clone(),
    );

    assert!(pool.ensure(&source, 160, 60).is_none());
    assert!(pool.ensure(&source, 160, 60).is_none());

    let thumb = wait_for(|| pool.ensure(&source, 160, 60)).expect("縮圖未完成");
    assert!(thumb.exists());
    assert!(repaint.take());
    assert_eq!(tools.calls("magick").len(), 1);

    pool.stop();
}

/// 測試 Scheduler + Kitty：繪製序列寫入共用輸出端
#[test]
fn test_scheduler_draws_through_kitty_sink() {
    let capture = Capture::default();
    let sink = OutputSink::new(capture.clone());
    let backend = Arc::new(Backend::new(Capability::Kitty, sink));
    let scheduler = Scheduler::new(Arc::clone(&backend), 8).unwrap();

    let cell = CellRect {
        x: 2,
        y: 3,
        width: 16,
        height: 3,
    };
    scheduler.enqueue(Path::new("/cache/a.png"), cell);
    scheduler.drain();
    assert_eq!(capture.text(), draw_sequence(Path::new("/cache/a.png"), cell));

    backend.clear_all().unwrap();
    assert!(capture.text().ends_with("\x1b_Ga=d,q=2;\x1b\\"));
    scheduler.close();
}

/// 測試翻頁後的過期請求不會畫出
#[test]
fn test_stale_frames_never_reach_renderer() {
    struct SlowRenderer {
        drawn: Mutex<Vec<PathBuf>>,
    }

    impl Renderer for SlowRenderer {
        fn name(&self) -> &'static str {
            "slow"
        }
        fn clear_all(&self) -> io::Result<()> {
            Ok(())
        }
        fn draw(&self, path: &Path, _cell: CellRect) -> io::Result<()> {
            thread::sleep(Duration::from_millis(5));
            self.drawn.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
        fn close(&self) -> io::Result<()> {
            Ok(())
        }
    }

    let renderer = Arc::new(SlowRenderer {
        drawn: Mutex::new(Vec::new()),
    });
    let scheduler = Scheduler::new(Arc::clone(&renderer), 64).unwrap();
    let cell = CellRect {
        x: 1,
        y: 1,
        width: 4,
        height: 2,
    };

    for i in 0..20 {
        scheduler.enqueue(Path::new(&format!("old-{i}")), cell);
    }
    scheduler.next_frame();
    scheduler.enqueue(Path::new("new"), cell);
    scheduler.drain();

    let drawn = renderer.drawn.lock().unwrap().clone();
    assert_eq!(drawn.last(), Some(&PathBuf::from("new")));
    // 舊畫格的請求不會全部畫出
    assert!(drawn.len() < 21, "{drawn:?}");
}

/// 測試 Scanner 讀到的修改時間可用於排序
#[test]
fn test_mtime_sort_orders_newest_first() {
    let root = TempDir::new().unwrap();
    let old = write_source(root.path(), "old.jpg", b"1");
    write_source(root.path(), "new.jpg", b"1");
    fs::File::options()
        .write(true)
        .open(&old)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(86_400))
        .unwrap();

    let mut candidates = scan_media(root.path(), &root.path().join("cache"), MediaFilter::Images).unwrap();
    sort_candidates(&mut candidates, SortKey::Mtime, SortOrder::Desc);
    assert_eq!(candidates[0].name, "new.jpg");
    assert_eq!(candidates[1].name, "old.jpg");
}
