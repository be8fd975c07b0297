use super::error::ThumbError;
use super::service::ThumbnailService;
use crate::config::Settings;
use crate::tools::RepaintSignal;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// 工作執行緒檢查停止訊號的間隔
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 縮圖池與縮圖服務之間的接縫
pub trait Generator: Send + Sync + 'static {
    fn generate_rect(&self, path: &Path, width: u32, height: u32) -> Result<PathBuf, ThumbError>;
}

impl Generator for ThumbnailService {
    fn generate_rect(&self, path: &Path, width: u32, height: u32) -> Result<PathBuf, ThumbError> {
        Self::generate_rect(self, path, width, height)
    }
}

/// 記憶體內的去重鍵：來源路徑 + 目標像素尺寸
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThumbKey {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Default)]
struct PoolState {
    ready: HashMap<ThumbKey, PathBuf>,
    in_flight: HashSet<ThumbKey>,
}

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl PoolConfig {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            workers: settings.worker_count,
            queue_capacity: settings.request_queue_capacity,
        }
    }
}

/// 固定數量的縮圖工作執行緒
///
/// `ensure` 永不阻塞：已完成則回傳快取路徑，否則最多排入一次工作並回傳 `None`，
/// 由呼叫端在下一次重繪時再詢問。
pub struct ThumbnailPool {
    state: Arc<Mutex<PoolState>>,
    queue: Sender<ThumbKey>,
    stop_signal: Arc<AtomicBool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ThumbnailPool {
    pub fn new<G: Generator>(generator: Arc<G>, config: PoolConfig, repaint: RepaintSignal) -> Self {
        let (queue, requests) = bounded::<ThumbKey>(config.queue_capacity.max(1));
        let state = Arc::new(Mutex::new(PoolState::default()));
        let stop_signal = Arc::new(AtomicBool::new(false));

        let handles = (0..config.workers.max(1))
            .map(|index| {
                let worker = Worker {
                    generator: Arc::clone(&generator),
                    requests: requests.clone(),
                    state: Arc::clone(&state),
                    stop_signal: Arc::clone(&stop_signal),
                    repaint: repaint.clone(),
                };
                thread::Builder::new()
                    .name(format!("thumb-worker-{index}"))
                    .spawn(move || worker.run())
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("無法建立縮圖工作執行緒: {e}");
                    None
                }
            })
            .collect();

        Self {
            state,
            queue,
            stop_signal,
            handles: Mutex::new(handles),
        }
    }

    /// 取得縮圖；尚未完成時回傳 `None`
    pub fn ensure(&self, path: &Path, width: u32, height: u32) -> Option<PathBuf> {
        let key = ThumbKey {
            path: path.to_path_buf(),
            width,
            height,
        };

        let mut state = lock(&self.state);
        if let Some(ready) = state.ready.get(&key) {
            return Some(ready.clone());
        }
        if state.in_flight.contains(&key) {
            return None;
        }

        state.in_flight.insert(key.clone());
        match self.queue.try_send(key) {
            Ok(()) => {}
            Err(TrySendError::Full(key) | TrySendError::Disconnected(key)) => {
                // 佇列已滿時放棄本次請求，下一次重繪會再排入
                debug!("縮圖佇列已滿，略過: {}", key.path.display());
                state.in_flight.remove(&key);
            }
        }
        None
    }

    #[must_use]
    pub fn ready_count(&self) -> usize {
        lock(&self.state).ready.len()
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        lock(&self.state).in_flight.len()
    }

    /// 發出停止訊號並等待工作執行緒結束；執行中的外部工具不會被中斷
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        let handles = std::mem::take(&mut *lock_handles(&self.handles));
        for handle in handles {
            if handle.join().is_err() {
                warn!("縮圖工作執行緒異常結束");
            }
        }
    }

    /// 發出停止訊號後立即返回，不等待執行中的外部工具
    ///
    /// 工作執行緒完成手上的項目後自行結束，之後的 `stop` 與 `Drop` 不再等待。
    pub fn detach(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        let detached = std::mem::take(&mut *lock_handles(&self.handles));
        debug!("縮圖池停止，不等待 {} 個工作執行緒", detached.len());
    }
}

impl Drop for ThumbnailPool {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker<G: Generator> {
    generator: Arc<G>,
    requests: Receiver<ThumbKey>,
    state: Arc<Mutex<PoolState>>,
    stop_signal: Arc<AtomicBool>,
    repaint: RepaintSignal,
}

impl<G: Generator> Worker<G> {
    fn run(self) {
        while !self.stop_signal.load(Ordering::SeqCst) {
            match self.requests.recv_timeout(STOP_POLL_INTERVAL) {
                Ok(key) => self.process(key),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn process(&self, key: ThumbKey) {
        let result = self
            .generator
            .generate_rect(&key.path, key.width, key.height);

        {
            let mut state = lock(&self.state);
            match result {
                Ok(path) => {
                    state.ready.insert(key.clone(), path);
                }
                Err(e) => debug!("縮圖產生失敗 {}: {e}", key.path.display()),
            }
            state.in_flight.remove(&key);
        }

        self.repaint.notify();
    }
}

fn lock(state: &Mutex<PoolState>) -> MutexGuard<'_, PoolState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lock_handles(handles: &Mutex<Vec<JoinHandle<()>>>) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
    handles.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    /// 受閘門控制的假產生器：記錄呼叫次數，收到放行訊號才完成
    struct GatedGenerator {
        calls: AtomicUsize,
        gate: Receiver<()>,
        fail: bool,
    }

    impl Generator for GatedGenerator {
        fn generate_rect(&self, path: &Path, width: u32, height: u32) -> Result<PathBuf, ThumbError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.gate.recv_timeout(Duration::from_secs(5));
            if self.fail {
                return Err(ThumbError::AllToolsExhausted {
                    path: path.to_path_buf(),
                });
            }
            Ok(PathBuf::from(format!("/cache/{width}x{height}.png")))
        }
    }

    fn gated(fail: bool) -> (Arc<GatedGenerator>, Sender<()>) {
        let (open, gate) = bounded(16);
        let generator = Arc::new(GatedGenerator {
            calls: AtomicUsize::new(0),
            gate,
            fail,
        });
        (generator, open)
    }

    fn config(workers: usize, queue_capacity: usize) -> PoolConfig {
        PoolConfig {
            workers,
            queue_capacity,
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_duplicate_requests_run_once() {
        let (generator, open) = gated(false);
        let repaint = RepaintSignal::new();
        let pool = ThumbnailPool::new(Arc::clone(&generator), config(4, 8), repaint.clone());

        let path = Path::new("/media/a.jpg");
        assert!(pool.ensure(path, 100, 60).is_none());
        assert!(pool.ensure(path, 100, 60).is_none());
        assert_eq!(pool.in_flight_count(), 1);

        open.send(()).unwrap();
        assert!(wait_until(|| pool.ready_count() == 1));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert!(repaint.take());

        assert_eq!(
            pool.ensure(path, 100, 60),
            Some(PathBuf::from("/cache/100x60.png"))
        );
        assert_eq!(pool.in_flight_count(), 0);
    }

    #[test]
    fn test_failure_clears_in_flight_for_retry() {
        let (generator, open) = gated(true);
        let repaint = RepaintSignal::new();
        let pool = ThumbnailPool::new(Arc::clone(&generator), config(1, 8), repaint.clone());

        let path = Path::new("/media/broken.mp4");
        assert!(pool.ensure(path, 64, 64).is_none());
        open.send(()).unwrap();
        assert!(wait_until(|| pool.in_flight_count() == 0));
        assert!(repaint.take());
        assert_eq!(pool.ready_count(), 0);

        // 下一次詢問會重新排入
        assert!(pool.ensure(path, 64, 64).is_none());
        open.send(()).unwrap();
        assert!(wait_until(|| generator.calls.load(Ordering::SeqCst) == 2));
    }

    #[test]
    fn test_full_queue_drops_request() {
        let (generator, open) = gated(false);
        let pool = ThumbnailPool::new(Arc::clone(&generator), config(1, 1), RepaintSignal::new());

        // 第一個請求佔住唯一的工作執行緒
        assert!(pool.ensure(Path::new("/m/0.jpg"), 8, 8).is_none());
        assert!(wait_until(|| generator.calls.load(Ordering::SeqCst) == 1));

        // 第二個填滿佇列，第三個被丟棄且不留在 in-flight
        assert!(pool.ensure(Path::new("/m/1.jpg"), 8, 8).is_none());
        assert!(pool.ensure(Path::new("/m/2.jpg"), 8, 8).is_none());
        assert_eq!(pool.in_flight_count(), 2);

        open.send(()).unwrap();
        open.send(()).unwrap();
        assert!(wait_until(|| pool.ready_count() == 2));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_duplicate_requests_run_once() {
        let (generator, open) = gated(false);
        let pool = ThumbnailPool::new(Arc::clone(&generator), config(4, 8), RepaintSignal::new());
        let barrier = Barrier::new(2);
        let path = Path::new("/media/same.mp4");

        thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| {
                    barrier.wait();
                    assert!(pool.ensure(path, 120, 80).is_none());
                });
            }
        });
        assert_eq!(pool.in_flight_count(), 1);

        open.send(()).unwrap();
        assert!(wait_until(|| pool.ready_count() == 1));
        // 給其他工作執行緒機會搶到重複的工作
        thread::sleep(Duration::from_millis(100));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_joins_workers() {
        let (generator, _open) = gated(false);
        let pool = ThumbnailPool::new(generator, config(3, 4), RepaintSignal::new());
        pool.stop();
        assert!(lock_handles(&pool.handles).is_empty());
        // 再次停止不應出錯
        pool.stop();
    }

    #[test]
    fn test_detach_does_not_wait_for_running_tool() {
        let (generator, open) = gated(false);
        let pool = ThumbnailPool::new(Arc::clone(&generator), config(1, 4), RepaintSignal::new());

        assert!(pool.ensure(Path::new("/media/slow.mkv"), 64, 64).is_none());
        assert!(wait_until(|| generator.calls.load(Ordering::SeqCst) == 1));

        // 產生器仍卡在閘門上，detach 與 drop 都必須立即返回
        let started = Instant::now();
        pool.detach();
        drop(pool);
        assert!(started.elapsed() < Duration::from_secs(1));

        open.send(()).unwrap();
    }
}
