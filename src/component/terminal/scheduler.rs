use super::renderer::{CellRect, Renderer};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded, select};
use log::debug;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// 容量設為 0 時的佇列大小
pub const FALLBACK_QUEUE_CAPACITY: usize = 64;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

enum DrawRequest {
    Draw {
        path: PathBuf,
        cell: CellRect,
        generation: u64,
    },
    /// 消費端處理到這裡時通知等待中的 `drain`
    Barrier(Sender<()>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Accepted,
    /// 佇列已滿或已關閉，請求被捨棄
    Dropped,
}

/// 單一消費執行緒的繪圖排程器
///
/// 每個請求都帶有送出當下的畫格編號，消費時若編號已過期就直接丟棄，
/// 因此翻頁後不會再把上一頁的縮圖畫到新畫面上。
pub struct Scheduler<R: Renderer + 'static> {
    renderer: Arc<R>,
    queue: Sender<DrawRequest>,
    quit: Mutex<Option<Sender<()>>>,
    consumer: Mutex<Option<JoinHandle<()>>>,
    generation: Arc<AtomicU64>,
    closed: AtomicBool,
}

impl<R: Renderer + 'static> Scheduler<R> {
    pub fn new(renderer: Arc<R>, capacity: usize) -> io::Result<Self> {
        let capacity = if capacity == 0 {
            FALLBACK_QUEUE_CAPACITY
        } else {
            capacity
        };
        let (queue, requests) = bounded(capacity);
        let (quit, quit_rx) = bounded::<()>(1);
        let generation = Arc::new(AtomicU64::new(1));

        let consumer = {
            let renderer = Arc::clone(&renderer);
            let generation = Arc::clone(&generation);
            thread::Builder::new()
                .name("draw-scheduler".to_string())
                .spawn(move || consume(renderer.as_ref(), &requests, &quit_rx, &generation))?
        };

        Ok(Self {
            renderer,
            queue,
            quit: Mutex::new(Some(quit)),
            consumer: Mutex::new(Some(consumer)),
            generation,
            closed: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// 以目前畫格編號排入繪圖請求，永不阻塞
    pub fn enqueue(&self, path: &Path, cell: CellRect) -> EnqueueOutcome {
        let request = DrawRequest::Draw {
            path: path.to_path_buf(),
            cell,
            generation: self.generation(),
        };
        match self.queue.try_send(request) {
            Ok(()) => EnqueueOutcome::Accepted,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => EnqueueOutcome::Dropped,
        }
    }

    /// 等待先前排入的請求全部處理完畢；消費端已結束時立即返回
    pub fn drain(&self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }

        let (done, wait) = bounded(1);
        if self.queue.send(DrawRequest::Barrier(done)).is_err() {
            return;
        }

        loop {
            match wait.recv_timeout(DRAIN_POLL_INTERVAL) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => {
                    if self.closed.load(Ordering::SeqCst) || self.consumer_finished() {
                        return;
                    }
                }
            }
        }
    }

    /// 進入下一個畫格，先前排入的請求全部作廢
    pub fn next_frame(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// 停止消費執行緒並關閉渲染器；可重複呼叫
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        drop(
            self.quit
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let handle = self
            .consumer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            debug!("繪圖排程執行緒異常結束");
        }

        if let Err(e) = self.renderer.close() {
            debug!("關閉 {} 渲染器失敗: {e}", self.renderer.name());
        }
    }

    fn consumer_finished(&self) -> bool {
        self.consumer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
    }
}

impl<R: Renderer + 'static> Drop for Scheduler<R> {
    fn drop(&mut self) {
        self.close();
    }
}

fn consume<R: Renderer>(
    renderer: &R,
    requests: &Receiver<DrawRequest>,
    quit: &Receiver<()>,
    generation: &AtomicU64,
) {
    loop {
        select! {
            recv(requests) -> request => match request {
                Ok(DrawRequest::Barrier(done)) => {
                    let _ = done.send(());
                }
                Ok(DrawRequest::Draw { path, cell, generation: tag }) => {
                    // 過期的畫格直接丟棄
                    if tag == generation.load(Ordering::SeqCst)
                        && let Err(e) = renderer.draw(&path, cell)
                    {
                        debug!("繪製縮圖失敗 {}: {e}", path.display());
                    }
                }
                Err(_) => return,
            },
            recv(quit) -> _ => return,
        }
    }
}
