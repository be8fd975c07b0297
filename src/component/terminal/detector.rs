use super::error::TerminalError;
use super::kitty::{QUERY_SEQUENCE, RESPONSE_MARKER};
use super::sink::OutputSink;
use log::{debug, info, warn};
use std::io::{self, IsTerminal};
use std::os::fd::{AsFd, AsRawFd, RawFd};
use std::time::{Duration, Instant};

/// 逾時設為 0 時使用的探測時間
pub const FALLBACK_PROBE_TIMEOUT: Duration = Duration::from_millis(50);

const READ_CHUNK: usize = 512;

/// 終端機圖像能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Kitty,
    None,
}

/// 依使用者偏好決定圖像後端
///
/// - `kitty`：必須探測成功，否則回傳 `Unavailable`
/// - `auto` 或空字串：探測成功用 Kitty，否則無圖像
/// - `none`：不探測
pub fn detect(
    preference: &str,
    sink: &OutputSink,
    timeout: Duration,
) -> Result<Capability, TerminalError> {
    let capability = choose(preference, || kitty_available(sink, timeout))?;
    info!("圖像後端: {capability:?}");
    Ok(capability)
}

/// 只有需要時才呼叫 `kitty_available`
fn choose(
    preference: &str,
    kitty_available: impl FnOnce() -> bool,
) -> Result<Capability, TerminalError> {
    let preference = preference.trim().to_lowercase();
    match preference.as_str() {
        "kitty" => {
            if kitty_available() {
                Ok(Capability::Kitty)
            } else {
                Err(TerminalError::Unavailable("kitty".to_string()))
            }
        }
        "auto" | "" => Ok(if kitty_available() {
            Capability::Kitty
        } else {
            Capability::None
        }),
        "none" => Ok(Capability::None),
        _ => Err(TerminalError::UnknownBackend(preference)),
    }
}

/// stdin 與 stdout 都是終端機時才送出查詢；任何 I/O 錯誤視為不支援
fn kitty_available(sink: &OutputSink, timeout: Duration) -> bool {
    let stdin = io::stdin();
    if !stdin.is_terminal() || !io::stdout().is_terminal() {
        debug!("stdin/stdout 不是終端機，略過 Kitty 探測");
        return false;
    }

    match probe_kitty(&stdin, sink, timeout) {
        Ok(supported) => supported,
        Err(e) => {
            warn!("Kitty 探測失敗，改用無圖像模式: {e}");
            false
        }
    }
}

/// 送出圖像協定查詢，在逾時前等待回覆中的 `ESC _G` 標記
///
/// 讀取期間暫時把輸入端設為非阻塞，所有離開路徑都會還原原本的旗標。
pub fn probe_kitty<F: AsFd>(
    input: &F,
    sink: &OutputSink,
    timeout: Duration,
) -> io::Result<bool> {
    let timeout = if timeout.is_zero() {
        FALLBACK_PROBE_TIMEOUT
    } else {
        timeout
    };

    sink.write_flush(QUERY_SEQUENCE.as_bytes())?;

    let fd = input.as_fd().as_raw_fd();
    let _guard = NonBlockingGuard::enable(fd)?;

    let deadline = Instant::now() + timeout;
    let mut received = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        let remaining = i32::try_from((deadline - now).as_millis())
            .unwrap_or(i32::MAX)
            .max(1);

        let mut pollfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&mut pollfd, 1, remaining) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if pollfd.revents & libc::POLLIN == 0 {
            // 對端已關閉且沒有資料可讀
            if pollfd.revents & (libc::POLLHUP | libc::POLLERR | libc::POLLNVAL) != 0 {
                return Ok(false);
            }
            continue;
        }

        let read = unsafe { libc::read(fd, chunk.as_mut_ptr().cast(), chunk.len()) };
        match read {
            0 => return Ok(false),
            n if n > 0 => {
                let n = usize::try_from(n).unwrap_or(0);
                received.extend_from_slice(&chunk[..n]);
                if contains_marker(&received) {
                    return Ok(true);
                }
            }
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => {}
                    _ => return Err(err),
                }
            }
        }
    }
}

fn contains_marker(received: &[u8]) -> bool {
    received
        .windows(RESPONSE_MARKER.len())
        .any(|window| window == RESPONSE_MARKER)
}

/// 暫時開啟 `O_NONBLOCK`，Drop 時還原
struct NonBlockingGuard {
    fd: RawFd,
    original: libc::c_int,
}

impl NonBlockingGuard {
    fn enable(fd: RawFd) -> io::Result<Self> {
        let original = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if original < 0 {
            return Err(io::Error::last_os_error());
        }
        if unsafe { libc::fcntl(fd, libc::F_SETFL, original | libc::O_NONBLOCK) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { fd, original })
    }
}

impl Drop for NonBlockingGuard {
    fn drop(&mut self) {
        unsafe {
            libc::fcntl(self.fd, libc::F_SETFL, self.original);
        }
    }
}
