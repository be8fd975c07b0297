use crossbeam_channel::{Receiver, Sender, bounded};

/// 單格、非阻塞的「需要重繪」通知；尚未被消費前的多次通知會合併為一次
#[derive(Debug, Clone)]
pub struct RepaintSignal {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl RepaintSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    /// 發出通知；已有待處理通知時直接合併
    pub fn notify(&self) {
        let _ = self.tx.try_send(());
    }

    /// 取走待處理通知（若有）
    pub fn take(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// 供 `select!` 使用的接收端
    #[must_use]
    pub const fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}

impl Default for RepaintSignal {
    fn default() -> Self {
        Self::new()
    }
}
