use super::frame::{FramePainter, Previews, clear_screen};
use super::state::{Action, GridState, Outcome};
use crate::component::terminal::{
    Backend, OutputSink, RawModeGuard, Renderer, Scheduler, detect,
};
use crate::component::thumbnail::{PoolConfig, ThumbnailPool, ThumbnailService, ToolChain};
use crate::config::Settings;
use crate::tools::{Candidate, RepaintSignal, absolute};
use anyhow::{Context, Result};
use console::Term;
use crossbeam_channel::{Receiver, bounded, select, tick};
use crossterm::event::{self, Event};
use log::{debug, error, info};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// 等待輸入事件的最長時間，逾時後檢查關閉訊號
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 瀏覽結束的方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseOutcome {
    Selected(PathBuf),
    Cancelled,
}

/// 互動式縮圖網格
pub struct GridBrowser {
    candidates: Arc<Vec<Candidate>>,
    settings: Settings,
    backend_preference: String,
    shutdown_signal: Arc<AtomicBool>,
}

impl GridBrowser {
    pub fn new(
        candidates: Vec<Candidate>,
        settings: Settings,
        backend_preference: &str,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            candidates: Arc::new(candidates),
            settings,
            backend_preference: backend_preference.to_string(),
            shutdown_signal,
        }
    }

    pub fn run(&self) -> Result<BrowseOutcome> {
        let term = Term::stdout();
        let mut raw_mode = RawModeGuard::enable().context("無法切換終端機 raw 模式")?;

        let sink = OutputSink::stdout();
        let capability = detect(
            &self.backend_preference,
            &sink,
            self.settings.probe_timeout,
        )?;
        raw_mode
            .capture_mouse(&sink)
            .context("無法開啟滑鼠回報")?;
        let backend = Arc::new(Backend::new(capability, sink.clone()));
        let scheduler = Arc::new(
            Scheduler::new(Arc::clone(&backend), self.settings.draw_queue_capacity)
                .context("無法建立繪圖排程執行緒")?,
        );

        let repaint = RepaintSignal::new();
        let pool = backend.has_graphics().then(|| {
            let service = ThumbnailService::new(
                ToolChain::new(self.settings.tools.clone()),
                &self.settings.cache_dir,
            );
            Arc::new(ThumbnailPool::new(
                Arc::new(service),
                PoolConfig::from_settings(&self.settings),
                repaint.clone(),
            ))
        });

        let (rows, columns) = term.size();
        let state = Arc::new(Mutex::new(GridState::new(
            self.candidates.len(),
            columns,
            rows,
            backend.has_graphics(),
        )));
        info!(
            "開始瀏覽 {} 個檔案，圖像後端: {}",
            self.candidates.len(),
            backend.name()
        );

        term.hide_cursor().context("無法隱藏游標")?;
        let (quit, quit_rx) = bounded::<()>(1);
        let coordinator = {
            let coordinator = Coordinator {
                candidates: Arc::clone(&self.candidates),
                state: Arc::clone(&state),
                backend: Arc::clone(&backend),
                scheduler: Arc::clone(&scheduler),
                pool: pool.clone(),
                sink: sink.clone(),
                repaint: repaint.clone(),
                size: (columns, rows),
            };
            let interval = self.settings.repaint_interval;
            thread::Builder::new()
                .name("repaint".to_string())
                .spawn(move || coordinator.run(&quit_rx, interval))
                .context("無法建立重繪執行緒")?
        };

        repaint.notify();
        let outcome = self.read_input(&state, &repaint);

        drop(quit);
        if coordinator.join().is_err() {
            error!("重繪執行緒異常結束");
        }
        // 不等待執行中的外部工具，畫面立即還原
        if let Some(pool) = pool {
            pool.detach();
        }
        scheduler.drain();
        if let Err(e) = backend.clear_all() {
            debug!("清除圖像失敗: {e}");
        }
        clear_screen(&mut *sink.lock()).context("無法清除畫面")?;
        term.show_cursor().context("無法顯示游標")?;
        scheduler.close();

        outcome
    }

    fn read_input(&self, state: &Mutex<GridState>, repaint: &RepaintSignal) -> Result<BrowseOutcome> {
        self.dispatch_events(state, repaint, poll_terminal_event)
    }

    /// 依序處理輸入事件直到選取或取消；每次等待逾時後都會檢查關閉訊號
    fn dispatch_events<F>(
        &self,
        state: &Mutex<GridState>,
        repaint: &RepaintSignal,
        mut next_event: F,
    ) -> Result<BrowseOutcome>
    where
        F: FnMut(Duration) -> io::Result<Option<Event>>,
    {
        loop {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                return Ok(BrowseOutcome::Cancelled);
            }

            let event = match next_event(INPUT_POLL_INTERVAL) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("無法讀取終端機事件"),
            };

            let action = match event {
                Event::Key(key) => Action::from_key(&key),
                Event::Mouse(mouse) => Action::from_mouse(&mouse),
                Event::Resize(..) => {
                    repaint.notify();
                    continue;
                }
                _ => continue,
            };

            let outcome = lock(state).apply(action);
            match outcome {
                Outcome::Redraw => repaint.notify(),
                Outcome::Unchanged => {}
                Outcome::Accept(index) => {
                    let path = self
                        .candidates
                        .get(index)
                        .map(|candidate| absolute(&candidate.path))
                        .context("選取的項目不存在")?;
                    return Ok(BrowseOutcome::Selected(path));
                }
                Outcome::Cancel => return Ok(BrowseOutcome::Cancelled),
            }
        }
    }
}

/// 等待下一個終端機事件；逾時回傳 `None`
fn poll_terminal_event(timeout: Duration) -> io::Result<Option<Event>> {
    if event::poll(timeout)? {
        event::read().map(Some)
    } else {
        Ok(None)
    }
}

/// 重繪執行緒：合併重繪訊號，每個 tick 最多畫一次
struct Coordinator {
    candidates: Arc<Vec<Candidate>>,
    state: Arc<Mutex<GridState>>,
    backend: Arc<Backend>,
    scheduler: Arc<Scheduler<Backend>>,
    pool: Option<Arc<ThumbnailPool>>,
    sink: OutputSink,
    repaint: RepaintSignal,
    size: (u16, u16),
}

impl Coordinator {
    fn run(mut self, quit: &Receiver<()>, interval: Duration) {
        let ticker = tick(interval);
        let repaint = self.repaint.receiver().clone();
        let mut dirty = true;

        loop {
            select! {
                recv(quit) -> _ => return,
                recv(repaint) -> _ => dirty = true,
                recv(ticker) -> _ => {
                    if self.check_resize() {
                        dirty = true;
                    }
                    if dirty {
                        self.scheduler.next_frame();
                        if let Err(e) = self.paint() {
                            error!("繪製畫面失敗: {e}");
                        }
                        dirty = false;
                    }
                }
            }
        }
    }

    /// 終端機大小改變時作廢所有已排入的圖像並清除畫面上的縮圖
    fn check_resize(&mut self) -> bool {
        let Some((rows, columns)) = Term::stdout().size_checked() else {
            return false;
        };
        if (columns, rows) == self.size {
            return false;
        }

        debug!("終端機大小改變: {columns}x{rows}");
        self.size = (columns, rows);
        self.scheduler.drain();
        if let Err(e) = self.backend.clear_all() {
            debug!("清除圖像失敗: {e}");
        }
        self.scheduler.next_frame();
        lock(&self.state).apply(Action::Resize {
            width: columns,
            height: rows,
        });
        true
    }

    fn paint(&self) -> io::Result<()> {
        let state = lock(&self.state);
        let painter = FramePainter {
            candidates: &self.candidates,
            backend_name: self.backend.name(),
            previews: self.pool.as_deref().map(|pool| Previews {
                pool,
                scheduler: &self.scheduler,
            }),
        };
        let mut out = self.sink.lock();
        painter.paint(&mut *out, &state)
    }
}

fn lock(state: &Mutex<GridState>) -> MutexGuard<'_, GridState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaKind;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
    use std::collections::VecDeque;
    use std::time::{Instant, SystemTime};

    fn browser(count: usize, shutdown_signal: Arc<AtomicBool>) -> GridBrowser {
        let candidates = (0..count)
            .map(|i| Candidate {
                path: PathBuf::from(format!("/media/{i}.jpg")),
                name: format!("{i}.jpg"),
                size: 1,
                modified: SystemTime::UNIX_EPOCH,
                kind: MediaKind::Image,
            })
            .collect();
        GridBrowser::new(candidates, Settings::from_lookup(|_| None), "none", shutdown_signal)
    }

    /// 依序回傳事件，用完時回報錯誤避免無限等待
    fn scripted(events: Vec<Event>) -> impl FnMut(Duration) -> io::Result<Option<Event>> {
        let mut events = VecDeque::from(events);
        move |_| {
            events
                .pop_front()
                .map(Some)
                .ok_or_else(|| io::Error::other("事件已用完"))
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_shutdown_noticed_without_input() {
        let flag = Arc::new(AtomicBool::new(false));
        let browser = browser(3, Arc::clone(&flag));
        let state = Mutex::new(GridState::new(3, 80, 24, false));

        let setter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            flag.store(true, Ordering::SeqCst);
        });

        let started = Instant::now();
        let outcome = browser
            .dispatch_events(&state, &RepaintSignal::new(), |timeout| {
                thread::sleep(timeout);
                Ok(None)
            })
            .unwrap();

        assert_eq!(outcome, BrowseOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(2));
        setter.join().unwrap();
    }

    #[test]
    fn test_keys_move_and_accept() {
        let browser = browser(3, Arc::new(AtomicBool::new(false)));
        let state = Mutex::new(GridState::new(3, 80, 24, false));
        let repaint = RepaintSignal::new();

        let outcome = browser
            .dispatch_events(
                &state,
                &repaint,
                scripted(vec![key(KeyCode::Right), key(KeyCode::Right), key(KeyCode::Enter)]),
            )
            .unwrap();

        assert_eq!(outcome, BrowseOutcome::Selected(PathBuf::from("/media/2.jpg")));
        assert!(repaint.take());
    }

    #[test]
    fn test_click_then_accept() {
        let browser = browser(3, Arc::new(AtomicBool::new(false)));
        let state = Mutex::new(GridState::new(3, 80, 24, false));
        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 20,
            row: 1,
            modifiers: KeyModifiers::NONE,
        });

        let outcome = browser
            .dispatch_events(
                &state,
                &RepaintSignal::new(),
                scripted(vec![click, Event::FocusGained, key(KeyCode::Enter)]),
            )
            .unwrap();

        assert_eq!(outcome, BrowseOutcome::Selected(PathBuf::from("/media/1.jpg")));
    }

    #[test]
    fn test_interrupted_wait_is_retried() {
        let browser = browser(2, Arc::new(AtomicBool::new(false)));
        let state = Mutex::new(GridState::new(2, 80, 24, false));
        let mut calls = 0;

        let outcome = browser
            .dispatch_events(&state, &RepaintSignal::new(), |_| {
                calls += 1;
                match calls {
                    1 => Err(io::ErrorKind::Interrupted.into()),
                    _ => Ok(Some(key(KeyCode::Char('q')))),
                }
            })
            .unwrap();

        assert_eq!(outcome, BrowseOutcome::Cancelled);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_read_error_is_reported() {
        let browser = browser(2, Arc::new(AtomicBool::new(false)));
        let state = Mutex::new(GridState::new(2, 80, 24, false));

        let err = browser
            .dispatch_events(&state, &RepaintSignal::new(), scripted(Vec::new()))
            .unwrap_err();
        assert!(err.to_string().contains("無法讀取終端機事件"));
    }
}
