//! Windows console backend.
//!
//! Input arrives as console event records rather than a byte stream;
//! everything that is not a key-down is discarded by yielding a retry
//! signal. Arrow keys carry no character unit, so they are re-expressed
//! as the POSIX escape sequences the decoder already understands. Output
//! goes through the console with virtual-terminal processing enabled, so
//! the one escape vocabulary serves both backends.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use windows_sys::Win32::Foundation::{GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};
use windows_sys::Win32::System::Console::{
    GetConsoleMode, GetConsoleScreenBufferInfo, GetStdHandle, ReadConsoleInputW, SetConsoleMode,
    WriteConsoleW, CONSOLE_SCREEN_BUFFER_INFO, ENABLE_ECHO_INPUT, ENABLE_INSERT_MODE,
    ENABLE_LINE_INPUT, ENABLE_MOUSE_INPUT, ENABLE_PROCESSED_INPUT, ENABLE_PROCESSED_OUTPUT,
    ENABLE_VIRTUAL_TERMINAL_PROCESSING, ENABLE_WINDOW_INPUT, INPUT_RECORD, KEY_EVENT,
    STD_INPUT_HANDLE, STD_OUTPUT_HANDLE,
};
use windows_sys::Win32::UI::Input::KeyboardAndMouse::{VK_DOWN, VK_UP};

use crate::config::EnvConfig;
use crate::core::tty::{Tty, ERASE_BELOW, SHOW_CURSOR};

/// Raw-mode terminal backed by the Windows console.
pub struct ConsoleTty {
    input: HANDLE,
    output: HANDLE,
    original_input_mode: u32,
    original_output_mode: u32,
    raw_entered: bool,
    restored: AtomicBool,
    queued: VecDeque<char>,
    pending_surrogate: Option<u16>,
    out_buf: String,
}

fn wide(name: &str) -> Vec<u16> {
    name.encode_utf16().chain(std::iter::once(0)).collect()
}

fn console_mode(handle: HANDLE) -> io::Result<u32> {
    let mut mode = 0u32;
    let ok = unsafe { GetConsoleMode(handle, &mut mode) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(mode)
}

/// Standard handle when it is a real console, otherwise the named console
/// device (`CONIN$`/`CONOUT$`) so redirected streams still work.
fn console_handle(std_handle: u32, device: &str, access: u32) -> io::Result<HANDLE> {
    let handle = unsafe { GetStdHandle(std_handle) };
    if handle != INVALID_HANDLE_VALUE && !handle.is_null() && console_mode(handle).is_ok() {
        return Ok(handle);
    }

    let name = wide(device);
    let handle = unsafe {
        CreateFileW(
            name.as_ptr(),
            access,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            std::ptr::null(),
            OPEN_EXISTING,
            0,
            std::ptr::null_mut(),
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        return Err(io::Error::last_os_error());
    }
    Ok(handle)
}

impl ConsoleTty {
    pub fn open(_env: &EnvConfig) -> io::Result<Self> {
        let input = console_handle(STD_INPUT_HANDLE, "CONIN$", GENERIC_READ | GENERIC_WRITE)?;
        let output = console_handle(STD_OUTPUT_HANDLE, "CONOUT$", GENERIC_READ | GENERIC_WRITE)?;

        let original_input_mode = console_mode(input)?;
        let original_output_mode = console_mode(output)?;

        Ok(Self {
            input,
            output,
            original_input_mode,
            original_output_mode,
            raw_entered: false,
            restored: AtomicBool::new(false),
            queued: VecDeque::new(),
            pending_surrogate: None,
            out_buf: String::new(),
        })
    }

    fn set_mode(handle: HANDLE, mode: u32) -> io::Result<()> {
        let ok = unsafe { SetConsoleMode(handle, mode) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn write_console(&self, data: &str) -> io::Result<()> {
        let units: Vec<u16> = data.encode_utf16().collect();
        let mut offset = 0usize;
        while offset < units.len() {
            let mut written = 0u32;
            let ok = unsafe {
                WriteConsoleW(
                    self.output,
                    units[offset..].as_ptr() as *const _,
                    (units.len() - offset) as u32,
                    &mut written,
                    std::ptr::null(),
                )
            };
            if ok == 0 {
                return Err(io::Error::last_os_error());
            }
            if written == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "console write returned 0"));
            }
            offset += written as usize;
        }
        Ok(())
    }

    fn decode_unit(&mut self, unit: u16) -> Option<char> {
        if let Some(high) = self.pending_surrogate.take() {
            if (0xdc00..=0xdfff).contains(&unit) {
                let combined =
                    0x10000 + (((high as u32 - 0xd800) << 10) | (unit as u32 - 0xdc00));
                return char::from_u32(combined);
            }
            // Unpaired high surrogate; drop it and decode the new unit.
        }
        if (0xd800..=0xdbff).contains(&unit) {
            self.pending_surrogate = Some(unit);
            return None;
        }
        char::from_u32(unit as u32)
    }
}

impl Tty for ConsoleTty {
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        if self.raw_entered {
            return Ok(());
        }

        let mut input_mode = self.original_input_mode;
        input_mode &= !(ENABLE_ECHO_INPUT
            | ENABLE_INSERT_MODE
            | ENABLE_LINE_INPUT
            | ENABLE_MOUSE_INPUT
            | ENABLE_PROCESSED_INPUT);
        input_mode |= ENABLE_WINDOW_INPUT;
        Self::set_mode(self.input, input_mode)?;

        let output_mode = self.original_output_mode
            | ENABLE_PROCESSED_OUTPUT
            | ENABLE_VIRTUAL_TERMINAL_PROCESSING;
        Self::set_mode(self.output, output_mode)?;

        self.raw_entered = true;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.restored.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut cleanup = String::with_capacity(SHOW_CURSOR.len() + ERASE_BELOW.len());
        cleanup.push_str(SHOW_CURSOR);
        cleanup.push_str(ERASE_BELOW);
        let _ = self.write_console(&cleanup);
        Self::set_mode(self.input, self.original_input_mode)?;
        Self::set_mode(self.output, self.original_output_mode)
    }

    fn size(&self) -> (u16, u16) {
        let mut info: CONSOLE_SCREEN_BUFFER_INFO = unsafe { std::mem::zeroed() };
        let ok = unsafe { GetConsoleScreenBufferInfo(self.output, &mut info) };
        if ok == 0 {
            return (80, 25);
        }
        let columns = (info.srWindow.Right - info.srWindow.Left + 1).max(1) as u16;
        let rows = (info.srWindow.Bottom - info.srWindow.Top + 1).max(1) as u16;
        (columns, rows)
    }

    fn read_key(&mut self) -> io::Result<Option<char>> {
        if let Some(cp) = self.queued.pop_front() {
            return Ok(Some(cp));
        }

        let mut record: INPUT_RECORD = unsafe { std::mem::zeroed() };
        let mut read = 0u32;
        let ok = unsafe { ReadConsoleInputW(self.input, &mut record, 1, &mut read) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        if read == 0 || u32::from(record.EventType) != u32::from(KEY_EVENT) {
            // Mouse, resize, focus: discarded, caller retries.
            return Ok(None);
        }

        let key = unsafe { record.Event.KeyEvent };
        if key.bKeyDown == 0 {
            return Ok(None);
        }

        let unit = unsafe { key.uChar.UnicodeChar };
        if unit == 0 {
            // Arrow keys have no character unit; replay them as the escape
            // sequences the shared decoder already recognizes.
            let tail = match key.wVirtualKeyCode {
                code if code == VK_UP => "[A",
                code if code == VK_DOWN => "[B",
                _ => return Ok(None),
            };
            self.queued.extend(tail.chars());
            return Ok(Some('\x1b'));
        }

        Ok(self.decode_unit(unit))
    }

    fn has_pending_input(&mut self) -> bool {
        !self.queued.is_empty()
    }

    fn write(&mut self, data: &str) {
        self.out_buf.push_str(data);
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.out_buf.is_empty() {
            return Ok(());
        }
        let buf = std::mem::take(&mut self.out_buf);
        self.write_console(&buf)
    }

    fn scrolls_on_last_row(&self) -> bool {
        true
    }
}
