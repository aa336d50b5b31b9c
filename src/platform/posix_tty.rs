//! `/dev/tty` termios backend.
//!
//! The controlling terminal is opened directly so the selector stays
//! interactive while both stdin (the line source) and stdout (the result
//! sink) are redirected through a pipeline.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{self, Write as _};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};

use libc::c_int;
use signal_hook::iterator::Signals;

use crate::config::EnvConfig;
use crate::core::tty::{Tty, ERASE_BELOW, SHOW_CURSOR};

fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

fn poll_readable(fd: c_int, timeout_ms: i32) -> bool {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    result > 0 && (fds.revents & libc::POLLIN) != 0
}

fn wait_writable(fd: c_int) -> io::Result<()> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, -1) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if result == 0 {
            continue;
        }
        if (fds.revents & libc::POLLOUT) != 0 {
            return Ok(());
        }
        return Err(io::Error::other(format!(
            "poll(POLLOUT) returned revents=0x{:x}",
            fds.revents
        )));
    }
}

fn write_all_fd(fd: c_int, bytes: &[u8]) -> io::Result<()> {
    let mut written = 0;
    while written < bytes.len() {
        let remaining = &bytes[written..];
        let result =
            unsafe { libc::write(fd, remaining.as_ptr() as *const libc::c_void, remaining.len()) };
        if result > 0 {
            written += result as usize;
            continue;
        }
        if result == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
        }

        let err = io::Error::last_os_error();
        match err.kind() {
            io::ErrorKind::Interrupted => continue,
            io::ErrorKind::WouldBlock => wait_writable(fd)?,
            _ => return Err(err),
        }
    }
    Ok(())
}

struct RestoreInner {
    fd: c_int,
    termios: libc::termios,
    ran: AtomicBool,
}

/// Idempotent terminal restoration, shareable with the signal watcher.
///
/// Whichever path runs first (normal teardown, guard drop, or a signal)
/// shows the cursor, erases the frame region, and puts the original mode
/// back; every later call is a no-op.
#[derive(Clone)]
pub struct RestoreHandle {
    inner: Arc<RestoreInner>,
}

impl RestoreHandle {
    pub fn restore_now(&self) -> io::Result<()> {
        if self.inner.ran.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut cleanup = String::with_capacity(SHOW_CURSOR.len() + ERASE_BELOW.len());
        cleanup.push_str(SHOW_CURSOR);
        cleanup.push_str(ERASE_BELOW);
        // Cursor visibility is best-effort; mode restoration is not.
        let _ = write_all_fd(self.inner.fd, cleanup.as_bytes());
        set_termios(self.inner.fd, &self.inner.termios)
    }
}

/// Raw-mode terminal backed by the controlling TTY device.
pub struct DevTty {
    fd: c_int,
    raw_entered: bool,
    restore: RestoreHandle,
    pending: VecDeque<u8>,
    out_buf: String,
    write_log_path: Option<PathBuf>,
    write_log_failed: bool,
}

impl DevTty {
    /// Opens `/dev/tty` and captures the current mode. Fails when the
    /// process has no controlling terminal.
    pub fn open(env: &EnvConfig) -> io::Result<Self> {
        let flags = libc::O_RDWR | libc::O_NOCTTY | libc::O_CLOEXEC;
        let fd = unsafe { libc::open(c"/dev/tty".as_ptr(), flags) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        match Self::from_fd(fd, env.write_log.as_ref().map(PathBuf::from)) {
            Ok(tty) => Ok(tty),
            Err(err) => {
                unsafe {
                    libc::close(fd);
                }
                Err(err)
            }
        }
    }

    fn from_fd(fd: c_int, write_log_path: Option<PathBuf>) -> io::Result<Self> {
        let termios = get_termios(fd)?;
        Ok(Self {
            fd,
            raw_entered: false,
            restore: RestoreHandle {
                inner: Arc::new(RestoreInner {
                    fd,
                    termios,
                    ran: AtomicBool::new(false),
                }),
            },
            pending: VecDeque::new(),
            out_buf: String::new(),
            write_log_path,
            write_log_failed: false,
        })
    }

    /// Handle for restoring the terminal from the signal watcher.
    pub fn restore_handle(&self) -> RestoreHandle {
        self.restore.clone()
    }

    fn next_byte(&mut self) -> io::Result<u8> {
        loop {
            if let Some(byte) = self.pending.pop_front() {
                return Ok(byte);
            }

            let mut buf = [0u8; 64];
            let result = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut _, buf.len()) };
            if result > 0 {
                self.pending.extend(&buf[..result as usize]);
                continue;
            }
            if result == 0 {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
            }
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
    }

    fn append_write_log(&mut self, data: &str) {
        if self.write_log_failed {
            return;
        }
        if let Some(path) = self.write_log_path.as_ref() {
            let result = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(data.as_bytes()));
            if result.is_err() {
                self.write_log_failed = true;
            }
        }
    }
}

impl Drop for DevTty {
    fn drop(&mut self) {
        if self.raw_entered {
            let _ = self.restore.restore_now();
        }
        unsafe {
            libc::close(self.fd);
        }
    }
}

fn utf8_sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 0,
    }
}

impl Tty for DevTty {
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        if self.raw_entered {
            return Ok(());
        }
        // Not full cfmakeraw: output post-processing stays on so `\n`
        // still advances to column zero, while echo, canonical buffering,
        // signal keys, and flow control are all off.
        let mut raw = self.restore.inner.termios;
        raw.c_iflag &=
            !(libc::ISTRIP | libc::INLCR | libc::ICRNL | libc::IGNCR | libc::IXON | libc::IXOFF);
        raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::ISIG);
        set_termios(self.fd, &raw)?;
        self.raw_entered = true;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        self.restore.restore_now()
    }

    fn size(&self) -> (u16, u16) {
        read_winsize(self.fd).unwrap_or((80, 25))
    }

    fn read_key(&mut self) -> io::Result<Option<char>> {
        let lead = self.next_byte()?;
        let len = utf8_sequence_len(lead);
        if len == 0 {
            return Ok(Some(char::REPLACEMENT_CHARACTER));
        }

        let mut buf = [0u8; 4];
        buf[0] = lead;
        for slot in buf.iter_mut().take(len).skip(1) {
            *slot = self.next_byte()?;
        }

        match std::str::from_utf8(&buf[..len]) {
            Ok(s) => Ok(s.chars().next()),
            Err(_) => Ok(Some(char::REPLACEMENT_CHARACTER)),
        }
    }

    fn has_pending_input(&mut self) -> bool {
        !self.pending.is_empty() || poll_readable(self.fd, 0)
    }

    fn write(&mut self, data: &str) {
        self.out_buf.push_str(data);
        self.append_write_log(data);
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.out_buf.is_empty() {
            return Ok(());
        }
        let buf = std::mem::take(&mut self.out_buf);
        write_all_fd(self.fd, buf.as_bytes())
    }
}

/// Guard for the signal watcher thread.
pub struct SignalHookGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

impl Drop for SignalHookGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Installs a SIGINT/SIGTERM watcher that runs `cleanup` at most once.
///
/// This is the only concurrency in the program; the watcher shares nothing
/// with the session loop beyond the idempotent restore handle captured in
/// the cleanup closure.
pub fn install_signal_handlers<F>(cleanup: F) -> SignalHookGuard
where
    F: Fn() + Send + Sync + 'static,
{
    let ran = AtomicBool::new(false);
    let mut signals =
        Signals::new([libc::SIGINT, libc::SIGTERM]).expect("failed to register signal handlers");
    let handle = signals.handle();

    let thread = thread::spawn(move || {
        for _ in signals.forever() {
            if !ran.swap(true, Ordering::SeqCst) {
                cleanup();
            }
        }
    });

    SignalHookGuard {
        handle,
        thread: Some(thread),
    }
}
