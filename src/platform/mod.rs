//! Platform-specific terminal backends.

#[cfg(unix)]
pub mod posix_tty;
#[cfg(unix)]
pub use posix_tty::{install_signal_handlers, DevTty, RestoreHandle, SignalHookGuard};

#[cfg(windows)]
pub mod windows_console;
#[cfg(windows)]
pub use windows_console::ConsoleTty;
